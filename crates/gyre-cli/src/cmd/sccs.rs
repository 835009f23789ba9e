//! `gyre sccs` — decompose a dependency graph into cyclic components.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use gyre_core::pagerank::{PageRankConfig, pagerank};
use gyre_core::report::build_report;
use gyre_core::{DepGraph, GraphRecord, cyclic_components};
use serde::Serialize;

use crate::output::{OutputMode, render, write_json_file};

/// Arguments for `gyre sccs`.
#[derive(Args, Debug)]
pub struct SccsArgs {
    /// Path to the dependency_graph.json record.
    #[arg(long)]
    pub graph: PathBuf,

    /// Output path for scc_report.json.
    #[arg(long)]
    pub out: PathBuf,

    /// PageRank damping factor.
    #[arg(long, default_value_t = 0.85)]
    pub pagerank_alpha: f64,

    /// PageRank iteration cap.
    #[arg(long, default_value_t = 100)]
    pub pagerank_max_iter: usize,

    /// PageRank convergence tolerance.
    #[arg(long, default_value_t = 1e-6)]
    pub pagerank_tol: f64,
}

#[derive(Debug, Serialize)]
struct SccsOutput {
    out: String,
    node_count: usize,
    edge_count: usize,
    scc_count: usize,
    max_scc_size: usize,
}

/// Execute `gyre sccs`.
pub fn run_sccs(args: &SccsArgs, output: OutputMode) -> anyhow::Result<()> {
    let record = GraphRecord::load(&args.graph)
        .with_context(|| format!("loading {}", args.graph.display()))?;
    let dep = DepGraph::from_record(&record);
    let components = cyclic_components(&dep);

    let config = PageRankConfig {
        damping: args.pagerank_alpha,
        tolerance: args.pagerank_tol,
        max_iter: args.pagerank_max_iter,
    };
    let ranks = pagerank(&dep, &config);

    let report = build_report(
        &dep,
        &record,
        &components,
        &ranks,
        &config,
        &args.graph.display().to_string(),
    );
    write_json_file(&args.out, &report)?;

    let payload = SccsOutput {
        out: args.out.display().to_string(),
        node_count: dep.node_count(),
        edge_count: dep.edge_count(),
        scc_count: components.len(),
        max_scc_size: report.global_metrics.max_scc_size,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "Wrote SCC report: {}", p.out)?;
        writeln!(
            w,
            "  sccs={} nodes={} edges={} max_scc_size={}",
            p.scc_count, p.node_count, p.edge_count, p.max_scc_size
        )
    })
}
