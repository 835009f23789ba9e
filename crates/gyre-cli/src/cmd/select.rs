//! `gyre select` — select a fair cross-corpus sample of cycles.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args, ValueEnum};
use gyre_sample::corpus::{collect_candidates, parse_repos_file};
use gyre_sample::select::{SelectionOutcome, SizeOrder, select_fair, select_per_length};
use serde::Serialize;
use tracing::warn;

use crate::output::{OutputMode, render, write_lines_file};

/// Bucket visit order flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Smallest cycle lengths first.
    Asc,
    /// Largest cycle lengths first.
    Desc,
}

impl From<OrderArg> for SizeOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => Self::Ascending,
            OrderArg::Desc => Self::Descending,
        }
    }
}

/// Arguments for `gyre select`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["total", "max_per_length"])))]
pub struct SelectArgs {
    /// Path to the repos file (`<repo> <branch> [entry [language]]`).
    #[arg(long)]
    pub repos: PathBuf,

    /// Root directory holding `<repo>/<branch>/cycle_catalog.json`.
    #[arg(long)]
    pub results_root: PathBuf,

    /// Global number of cycles to select.
    #[arg(long)]
    pub total: Option<usize>,

    /// Alternative mode: select up to N cycles per exact cycle length.
    #[arg(long)]
    pub max_per_length: Option<usize>,

    /// Minimum cycle length to consider.
    #[arg(long)]
    pub min_len: Option<usize>,

    /// Maximum cycle length to consider.
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Length-bucket visit order.
    #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
    pub order: OrderArg,

    /// Output path for the sample manifest.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Serialize)]
struct SelectOutput {
    out: String,
    requested: Option<usize>,
    selected: usize,
    shortfall: usize,
    quota_shortfall: usize,
    distinct_repos: usize,
    quotas: BTreeMap<usize, usize>,
    available: BTreeMap<usize, usize>,
    selected_per_length: BTreeMap<usize, usize>,
    selected_per_repo: BTreeMap<String, usize>,
}

/// Execute `gyre select`.
pub fn run_select(args: &SelectArgs, output: OutputMode) -> anyhow::Result<()> {
    // Configuration errors are fatal before any processing begins.
    anyhow::ensure!(
        args.total != Some(0) && args.max_per_length != Some(0),
        "selection target must be positive"
    );
    if let (Some(min), Some(max)) = (args.min_len, args.max_len) {
        anyhow::ensure!(min <= max, "--min-len {min} exceeds --max-len {max}");
    }

    let repos = parse_repos_file(&args.repos)
        .with_context(|| format!("loading {}", args.repos.display()))?;
    let pool = collect_candidates(&repos, &args.results_root, args.min_len, args.max_len);

    let order: SizeOrder = args.order.into();
    let outcome: SelectionOutcome = match (args.total, args.max_per_length) {
        (Some(total), _) => select_fair(&pool, &repos, total, order)?,
        (None, Some(cap)) => select_per_length(&pool, &repos, cap, order)?,
        (None, None) => unreachable!("clap group requires one target"),
    };

    let lines = outcome.manifest_lines(&repos);
    write_lines_file(&args.out, &lines)?;

    if outcome.shortfall > 0 {
        warn!(
            requested = args.total,
            selected = outcome.picks.len(),
            shortfall = outcome.shortfall,
            "insufficient candidates to meet the selection target"
        );
    }

    let payload = SelectOutput {
        out: args.out.display().to_string(),
        requested: args.total,
        selected: outcome.picks.len(),
        shortfall: outcome.shortfall,
        quota_shortfall: outcome.quota_shortfall,
        distinct_repos: outcome.selected_per_repo.len(),
        quotas: outcome.quotas,
        available: outcome.available,
        selected_per_length: outcome.selected_per_length,
        selected_per_repo: outcome.selected_per_repo,
    };

    render(output, &payload, |p, w| {
        writeln!(w, "Wrote {} lines to {}", p.selected, p.out)?;
        if p.shortfall > 0 {
            if let Some(requested) = p.requested {
                writeln!(
                    w,
                    "[WARN] Requested --total {requested} but only selected {} (insufficient candidates).",
                    p.selected
                )?;
            }
        }
        writeln!(w, "Distinct repos covered: {}", p.distinct_repos)?;
        if !p.quotas.is_empty() {
            writeln!(w, "Target quotas per size:")?;
            for (size, quota) in &p.quotas {
                let available = p.available.get(size).copied().unwrap_or(0);
                writeln!(w, "  size={size}: target={quota} available={available}")?;
            }
        }
        writeln!(w, "Selected per size:")?;
        for (size, count) in &p.selected_per_length {
            writeln!(w, "  size={size}: selected={count}")?;
        }
        if p.quota_shortfall > 0 {
            writeln!(
                w,
                "Shortfall during quota fill (before spillover): {}",
                p.quota_shortfall
            )?;
        }
        writeln!(w, "Selected per repo:")?;
        for (repo, count) in &p.selected_per_repo {
            writeln!(w, "  {repo}: {count}")?;
        }
        Ok(())
    })
}
