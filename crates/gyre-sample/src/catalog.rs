//! The per-repository cycle catalog: discovery + packing, serialized.
//!
//! One catalog per repository snapshot. Each cyclic component contributes a
//! bounded, deduplicated, pairwise edge-disjoint set of representative
//! cycles, annotated with the PageRank metrics used for priority
//! tie-breaking. The catalog echoes every parameter that shaped it, so a
//! reader can tell two configurations apart without external context.
//!
//! Catalogs carry no wall-clock field: identical inputs, parameters, and
//! seed serialize to identical bytes.

use std::collections::HashMap;
use std::path::Path;

use gyre_core::{CoreError, CyclicComponent, DepGraph};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::canon::{CanonMode, ring_edges};
use crate::discover::{DiscoveryConfig, Strategy, discover};
use crate::pack::{PackConfig, average_score, pack_edge_disjoint};

/// Provenance of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInput {
    /// Repository name.
    pub repo: String,
    /// Base branch the snapshot was taken from.
    pub base_branch: String,
    /// Path of the dependency-graph record, as given.
    pub dependency_graph: String,
    /// Content hash of the graph's edge set.
    pub graph_hash: String,
}

/// Parameters the catalog was built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogParams {
    /// Discovery strategy label (`"exact"` or `"sample"`).
    pub strategy: String,
    /// Maximum cycle length considered.
    pub max_cycle_len: usize,
    /// Walk attempts per component (sampling only).
    pub attempts_per_scc: usize,
    /// Overall cap per component, if any.
    pub max_cycles_per_scc: Option<usize>,
    /// Per-length cap in the packer's balancing pass, if any.
    pub per_length_cap: Option<usize>,
    /// RNG seed for the sampling strategy.
    pub seed: u64,
    /// Always true: packs are edge-disjoint within each component.
    pub edge_disjoint: bool,
    /// Canonicalization label (`"rotation_only"` or `"rotate_reflect"`).
    pub canonicalization: String,
}

/// PageRank roll-up over one cycle's members.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleMetrics {
    /// Mean member PageRank.
    pub pagerank_avg: f64,
    /// Minimum member PageRank.
    pub pagerank_min: f64,
    /// Maximum member PageRank.
    pub pagerank_max: f64,
}

/// An edge row in a cycle's ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relation label.
    pub relation: String,
}

/// One representative cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleEntry {
    /// Stable id: `<component id>_cycle_<index>`.
    pub id: String,
    /// Number of nodes (= number of edges).
    pub length: usize,
    /// Node sequence in traversal order, canonical rotation.
    pub nodes: Vec<String>,
    /// Ring edges in traversal order.
    pub edges: Vec<CatalogEdge>,
    /// Score annotations used for tie-breaking.
    pub metrics: CycleMetrics,
}

/// One component's packed cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCatalog {
    /// Component id (`scc_<rank>`).
    pub id: String,
    /// Component size.
    pub node_count: usize,
    /// Induced edge count.
    pub edge_count: usize,
    /// Directed density of the induced subgraph.
    pub density: f64,
    /// Packed representative cycles.
    pub cycles: Vec<CycleEntry>,
}

/// Totals over the whole catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CatalogSummary {
    /// Number of cyclic components.
    pub scc_count: usize,
    /// Total packed cycles.
    pub cycle_count: usize,
}

/// The complete per-repository cycle catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleCatalog {
    /// Catalog schema version.
    pub schema_version: u32,
    /// Provenance.
    pub input: CatalogInput,
    /// Build parameters.
    pub params: CatalogParams,
    /// Totals.
    pub summary: CatalogSummary,
    /// Per-component packed cycles.
    pub sccs: Vec<ComponentCatalog>,
}

impl CycleCatalog {
    /// Load and parse a catalog from `path`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Io`] if unreadable, [`CoreError::Parse`] if invalid.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything needed to build one repository's catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Discovery strategy.
    pub strategy: Strategy,
    /// Maximum cycle length.
    pub max_cycle_len: usize,
    /// Walk attempts per component (sampling only).
    pub attempts: usize,
    /// RNG seed (sampling only; recorded either way).
    pub seed: u64,
    /// Canonicalization mode.
    pub mode: CanonMode,
    /// Packer caps.
    pub pack: PackConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Sample,
            max_cycle_len: 8,
            attempts: 5000,
            seed: 12345,
            mode: CanonMode::DirectionPreserving,
            pack: PackConfig {
                per_length_cap: Some(2),
                max_total: Some(200),
            },
        }
    }
}

fn cycle_metrics(cycle: &[String], scores: &HashMap<String, f64>) -> CycleMetrics {
    let member_scores: Vec<f64> = cycle
        .iter()
        .map(|node| scores.get(node).copied().unwrap_or(0.0))
        .collect();
    CycleMetrics {
        pagerank_avg: average_score(cycle, scores),
        pagerank_min: member_scores.iter().copied().fold(f64::INFINITY, f64::min),
        pagerank_max: member_scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max),
    }
}

/// Discover, pack, and assemble the catalog for one repository.
///
/// Components are processed in their deterministic order with one seeded
/// RNG threaded through, so the whole catalog is a pure function of its
/// inputs and configuration.
#[must_use]
#[instrument(skip_all, fields(repo = %input.repo, sccs = components.len()))]
pub fn build_catalog(
    dep: &DepGraph,
    components: &[CyclicComponent],
    scores: &HashMap<String, f64>,
    config: &CatalogConfig,
    mut input: CatalogInput,
) -> CycleCatalog {
    input.graph_hash = dep.content_hash.clone();

    let discovery = DiscoveryConfig {
        max_cycle_len: config.max_cycle_len,
        attempts: config.attempts,
        mode: config.mode,
    };
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut total_cycles = 0_usize;
    let sccs: Vec<ComponentCatalog> = components
        .iter()
        .map(|component| {
            let candidates = discover(component, config.strategy, &discovery, &mut rng);
            let packed = pack_edge_disjoint(&candidates, scores, &config.pack);

            let cycles: Vec<CycleEntry> = packed
                .into_iter()
                .enumerate()
                .map(|(j, nodes)| CycleEntry {
                    id: format!("{}_cycle_{j}", component.id),
                    length: nodes.len(),
                    edges: ring_edges(&nodes)
                        .into_iter()
                        .map(|(source, target)| CatalogEdge {
                            source,
                            target,
                            relation: dep.relation.clone(),
                        })
                        .collect(),
                    metrics: cycle_metrics(&nodes, scores),
                    nodes,
                })
                .collect();

            total_cycles += cycles.len();
            ComponentCatalog {
                id: component.id.clone(),
                node_count: component.size(),
                edge_count: component.edge_count(),
                density: component.density(),
                cycles,
            }
        })
        .collect();

    CycleCatalog {
        schema_version: 1,
        input,
        params: CatalogParams {
            strategy: config.strategy.label().to_string(),
            max_cycle_len: config.max_cycle_len,
            attempts_per_scc: config.attempts,
            max_cycles_per_scc: config.pack.max_total,
            per_length_cap: config.pack.per_length_cap,
            seed: config.seed,
            edge_disjoint: true,
            canonicalization: config.mode.label().to_string(),
        },
        summary: CatalogSummary {
            scc_count: sccs.len(),
            cycle_count: total_cycles,
        },
        sccs,
    }
}
