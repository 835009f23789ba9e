//! The `scc_report.json` output record.
//!
//! One report per repository snapshot: every cyclic component with its
//! structural metrics, global roll-ups, and per-node PageRank features.
//! Reports are read back by the cycle-catalog step, which takes the
//! component list and the PageRank map from here instead of recomputing.
//!
//! Reports carry no wall-clock field: identical inputs must serialize to
//! identical bytes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CoreError;
use crate::graph::DepGraph;
use crate::pagerank::{PageRankConfig, PageRankResult};
use crate::record::{GraphRecord, count_loc};
use crate::scc::CyclicComponent;

/// Echo of the input record the report was derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    /// Schema version of the input record.
    pub schema_version: u32,
    /// Path of the dependency-graph record, as given.
    pub dependency_graph: String,
    /// Source language, if the record carried one.
    pub language: String,
    /// Repository root, if the record carried one.
    pub repo_root: String,
    /// Extractor entry point, if the record carried one.
    pub entry: String,
}

/// Node and edge counts of the full graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GraphCounts {
    /// Total node count.
    pub node_count: usize,
    /// Total edge count after normalization.
    pub edge_count: usize,
}

/// PageRank parameters used for the node features.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRankParams {
    /// Damping factor.
    pub pagerank_alpha: f64,
    /// Iteration cap.
    pub pagerank_max_iter: usize,
    /// Convergence tolerance.
    pub pagerank_tol: f64,
}

impl From<&PageRankConfig> for PageRankParams {
    fn from(config: &PageRankConfig) -> Self {
        Self {
            pagerank_alpha: config.damping,
            pagerank_max_iter: config.max_iter,
            pagerank_tol: config.tolerance,
        }
    }
}

/// Corpus-level roll-ups over all cyclic components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalMetrics {
    /// Number of cyclic components.
    pub scc_count: usize,
    /// Nodes across all cyclic components.
    pub total_nodes_in_cyclic_sccs: usize,
    /// Induced edges across all cyclic components.
    pub total_edges_in_cyclic_sccs: usize,
    /// LOC across all cyclic components.
    pub total_loc_in_cyclic_sccs: u64,
    /// Largest component size.
    pub max_scc_size: usize,
    /// Mean component size, rounded to 3 decimals.
    pub avg_scc_size: f64,
    /// Sum of per-component edge-surplus lower bounds.
    pub cycle_pressure_lb: usize,
}

/// Per-node feature vector. Currently only PageRank, but extensible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeFeatures {
    /// Global PageRank score.
    pub pagerank: f64,
}

/// A node row inside a component entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportNode {
    /// Node id.
    pub id: String,
    /// Node kind; always `"file"` for dependency graphs.
    pub kind: String,
}

/// An edge row inside a component entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Relation label.
    pub relation: String,
}

/// One cyclic component in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SccEntry {
    /// Stable component id (`scc_<rank>`).
    pub id: String,
    /// Member count.
    pub size: usize,
    /// Induced edge count.
    pub edge_count: usize,
    /// Directed density, rounded to 6 decimals.
    pub density_directed: f64,
    /// Undirected edge-surplus lower bound.
    pub edge_surplus_lb: usize,
    /// Total LOC over members.
    pub total_loc: u64,
    /// Mean LOC per member, rounded to 2 decimals.
    pub avg_loc_per_node: f64,
    /// Member nodes, sorted by id.
    pub nodes: Vec<ReportNode>,
    /// Induced edges, sorted.
    pub edges: Vec<ReportEdge>,
}

/// The complete component report for one repository snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SccReport {
    /// Report schema version.
    pub schema_version: u32,
    /// Echo of the input record.
    pub input: ReportInput,
    /// Full-graph counts.
    pub graph: GraphCounts,
    /// PageRank parameters.
    pub params: PageRankParams,
    /// Corpus-level metrics.
    pub global_metrics: GlobalMetrics,
    /// Per-node features, keyed by node id.
    pub node_features: BTreeMap<String, NodeFeatures>,
    /// All cyclic components.
    pub sccs: Vec<SccEntry>,
}

impl SccReport {
    /// Load and parse a report from `path`.
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

    /// PageRank scores keyed by node id, for downstream packing priority.
    #[must_use]
    pub fn pagerank_map(&self) -> HashMap<String, f64> {
        self.node_features
            .iter()
            .map(|(id, features)| (id.clone(), features.pagerank))
            .collect()
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// LOC for one node: the record's `loc` field if present, otherwise a
/// best-effort count of the file at `abs_path`.
fn node_loc(dep: &DepGraph, id: &str, cache: &mut HashMap<String, u64>) -> u64 {
    let Some(meta) = dep.meta.get(id) else {
        return 0;
    };
    if let Some(loc) = meta.loc {
        return loc;
    }
    let Some(abs_path) = meta.abs_path.as_deref() else {
        return 0;
    };
    if let Some(&cached) = cache.get(abs_path) {
        return cached;
    }
    let counted = count_loc(Path::new(abs_path));
    cache.insert(abs_path.to_string(), counted);
    counted
}

/// Assemble the report for one repository.
#[must_use]
#[instrument(skip_all, fields(sccs = components.len()))]
pub fn build_report(
    dep: &DepGraph,
    record: &GraphRecord,
    components: &[CyclicComponent],
    ranks: &PageRankResult,
    config: &PageRankConfig,
    graph_path: &str,
) -> SccReport {
    let mut loc_cache: HashMap<String, u64> = HashMap::new();

    let mut total_nodes = 0_usize;
    let mut total_edges = 0_usize;
    let mut total_loc = 0_u64;
    let mut cycle_pressure = 0_usize;

    let sccs: Vec<SccEntry> = components
        .iter()
        .map(|component| {
            let size = component.size();
            let loc: u64 = component
                .members
                .iter()
                .map(|id| node_loc(dep, id, &mut loc_cache))
                .sum();

            total_nodes += size;
            total_edges += component.edge_count();
            total_loc += loc;
            cycle_pressure += component.edge_surplus_lower_bound();

            SccEntry {
                id: component.id.clone(),
                size,
                edge_count: component.edge_count(),
                density_directed: round_to(component.density(), 6),
                edge_surplus_lb: component.edge_surplus_lower_bound(),
                total_loc: loc,
                avg_loc_per_node: if size == 0 {
                    0.0
                } else {
                    round_to(loc as f64 / size as f64, 2)
                },
                nodes: component
                    .members
                    .iter()
                    .map(|id| ReportNode {
                        id: id.clone(),
                        kind: "file".to_string(),
                    })
                    .collect(),
                edges: component
                    .edges
                    .iter()
                    .map(|(source, target)| ReportEdge {
                        source: source.clone(),
                        target: target.clone(),
                        relation: dep.relation.clone(),
                    })
                    .collect(),
            }
        })
        .collect();

    let sizes: Vec<usize> = sccs.iter().map(|s| s.size).collect();
    let global_metrics = GlobalMetrics {
        scc_count: sccs.len(),
        total_nodes_in_cyclic_sccs: total_nodes,
        total_edges_in_cyclic_sccs: total_edges,
        total_loc_in_cyclic_sccs: total_loc,
        max_scc_size: sizes.iter().copied().max().unwrap_or(0),
        avg_scc_size: if sizes.is_empty() {
            0.0
        } else {
            round_to(sizes.iter().sum::<usize>() as f64 / sizes.len() as f64, 3)
        },
        cycle_pressure_lb: cycle_pressure,
    };

    let node_features: BTreeMap<String, NodeFeatures> = dep
        .node_ids()
        .into_iter()
        .map(|id| {
            (
                id.to_string(),
                NodeFeatures {
                    pagerank: ranks.scores.get(id).copied().unwrap_or(0.0),
                },
            )
        })
        .collect();

    SccReport {
        schema_version: 1,
        input: ReportInput {
            schema_version: record.schema_version,
            dependency_graph: graph_path.to_string(),
            language: record.language.clone(),
            repo_root: record.repo_root.clone(),
            entry: record.entry.clone(),
        },
        graph: GraphCounts {
            node_count: dep.node_count(),
            edge_count: dep.edge_count(),
        },
        params: PageRankParams::from(config),
        global_metrics,
        node_features,
        sccs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagerank::pagerank;
    use crate::record::{EdgeRecord, NodeRecord};
    use crate::scc::cyclic_components;

    fn record(edges: &[(&str, &str)]) -> GraphRecord {
        let nodes: std::collections::BTreeSet<&str> =
            edges.iter().flat_map(|(s, t)| [*s, *t]).collect();
        GraphRecord {
            schema_version: 1,
            language: "python".to_string(),
            repo_root: "/repo".to_string(),
            entry: "main.py".to_string(),
            nodes: nodes
                .into_iter()
                .map(|id| NodeRecord {
                    id: id.to_string(),
                    abs_path: None,
                    loc: Some(10),
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(s, t)| EdgeRecord {
                    source: (*s).to_string(),
                    target: (*t).to_string(),
                    relation: "import".to_string(),
                })
                .collect(),
        }
    }

    fn report_for(edges: &[(&str, &str)]) -> SccReport {
        let record = record(edges);
        let dep = DepGraph::from_record(&record);
        let components = cyclic_components(&dep);
        let config = PageRankConfig::default();
        let ranks = pagerank(&dep, &config);
        build_report(&dep, &record, &components, &ranks, &config, "graph.json")
    }

    #[test]
    fn report_counts_match_components() {
        let report = report_for(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);

        assert_eq!(report.global_metrics.scc_count, 1);
        assert_eq!(report.global_metrics.total_nodes_in_cyclic_sccs, 3);
        assert_eq!(report.global_metrics.total_edges_in_cyclic_sccs, 3);
        assert_eq!(report.global_metrics.max_scc_size, 3);
        assert_eq!(report.global_metrics.total_loc_in_cyclic_sccs, 30);
        assert_eq!(report.sccs[0].id, "scc_0");
        assert_eq!(report.sccs[0].avg_loc_per_node, 10.0);
    }

    #[test]
    fn node_features_cover_all_nodes() {
        let report = report_for(&[("a", "b"), ("b", "a"), ("b", "c")]);
        assert_eq!(report.node_features.len(), 3);
        for features in report.node_features.values() {
            assert!(features.pagerank >= 0.0);
        }
    }

    #[test]
    fn acyclic_graph_gives_empty_component_list() {
        let report = report_for(&[("a", "b")]);
        assert!(report.sccs.is_empty());
        assert_eq!(report.global_metrics.scc_count, 0);
        assert_eq!(report.global_metrics.avg_scc_size, 0.0);
    }

    #[test]
    fn serialization_is_stable() {
        let first = serde_json::to_string_pretty(&report_for(&[("a", "b"), ("b", "a")]))
            .expect("serialize");
        let second = serde_json::to_string_pretty(&report_for(&[("a", "b"), ("b", "a")]))
            .expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn pagerank_map_round_trips() {
        let report = report_for(&[("a", "b"), ("b", "a")]);
        let map = report.pagerank_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("a"));
    }
}
