#![forbid(unsafe_code)]
//! gyre-core: dependency graph model and SCC decomposition.
//!
//! # Overview
//!
//! This crate holds the per-repository half of the gyre pipeline: it loads a
//! dependency-graph record, builds an in-memory directed graph, partitions it
//! into cyclic strongly connected components, and emits the component report
//! that downstream cycle discovery consumes.
//!
//! ## Pipeline
//!
//! ```text
//! dependency_graph.json
//!        ↓  record::GraphRecord::load()
//! GraphRecord (nodes + edges, one repository snapshot)
//!        ↓  graph::DepGraph::from_record()
//! DepGraph (petgraph DiGraph, self-edges dropped, duplicates collapsed)
//!        ↓  scc::cyclic_components()
//! Vec<CyclicComponent> (size ≥ 2, deterministically ordered and labeled)
//!        ↓  report::build_report()  (+ pagerank::pagerank() node features)
//! SccReport → scc_report.json
//! ```
//!
//! # Conventions
//!
//! - **Errors**: typed [`CoreError`] for anything a caller may want to skip
//!   per-repository (unreadable or structurally invalid records). Commands
//!   wrap these in `anyhow` at the boundary.
//! - **Logging**: `tracing` macros (`debug!`, `warn!`, `#[instrument]`).
//! - **Determinism**: every serialized map is a `BTreeMap` and every list is
//!   sorted before it is emitted, so identical inputs produce byte-identical
//!   reports.

pub mod error;
pub mod graph;
pub mod pagerank;
pub mod record;
pub mod report;
pub mod scc;

pub use error::CoreError;
pub use graph::DepGraph;
pub use record::{EdgeRecord, GraphRecord, NodeRecord};
pub use report::SccReport;
pub use scc::{CyclicComponent, cyclic_components};
