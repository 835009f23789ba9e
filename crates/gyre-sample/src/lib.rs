#![forbid(unsafe_code)]
//! gyre-sample: cycle discovery, packing, and cross-corpus fair sampling.
//!
//! # Overview
//!
//! This crate takes the cyclic components produced by `gyre-core` and turns
//! them into a bounded, reproducible experimental sample:
//!
//! ```text
//! Vec<CyclicComponent>  (+ PageRank node features)
//!        ↓  discover::discover()        exact enumeration or seeded walks
//! candidate cycles      (canonicalized, deduplicated, largest-first)
//!        ↓  pack::pack_edge_disjoint()  two-pass greedy, no shared edges
//! CycleCatalog → cycle_catalog.json     one per repository
//!        ↓  corpus::collect_candidates() across many repositories
//!        ↓  select::select_fair()       quotas + two-regime fairness + spillover
//! SelectionOutcome → manifest (one `<repo> <branch> <cycle-id>` per line)
//! ```
//!
//! # Determinism
//!
//! The only randomness in the whole pipeline lives in the bounded
//! random-walk sampler, which consumes a caller-provided seed in a fixed
//! draw order. Everything else is ordered data structures and explicit
//! tie-breaking, so identical inputs, configuration, and seed produce
//! byte-identical catalogs and manifests.

pub mod canon;
pub mod catalog;
pub mod corpus;
pub mod discover;
pub mod pack;
pub mod select;

pub use canon::CanonMode;
pub use catalog::{CatalogConfig, CycleCatalog, build_catalog};
pub use corpus::RepoSpec;
pub use discover::Strategy;
pub use select::{SelectionOutcome, SizeOrder};
