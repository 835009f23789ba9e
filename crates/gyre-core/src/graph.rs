//! Graph construction from a dependency-graph record.
//!
//! # Edge Direction
//!
//! An edge `A → B` means "A depends on B" — exactly as recorded by the
//! extractor. All cycle analysis downstream operates on this direction.
//!
//! # Normalization
//!
//! Two adjustments are applied at construction time, matching the record
//! contract:
//!
//! - **Self-edges are dropped.** A file importing itself carries no cycle
//!   information.
//! - **Duplicate edges collapse.** Multiple `(source, target)` pairs with
//!   the same endpoints become one edge.
//!
//! # Content Hash
//!
//! The graph carries a BLAKE3 hash of its sorted, deduplicated edge set.
//! Two runs over the same record produce the same hash, so it doubles as a
//! cheap determinism check on catalog outputs.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use crate::record::GraphRecord;

/// Optional per-node metadata carried alongside the graph.
#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    /// Absolute path on disk, when known.
    pub abs_path: Option<String>,
    /// Non-blank line count, when known.
    pub loc: Option<u64>,
}

/// A directed dependency graph for one repository snapshot.
///
/// Nodes are repository-relative id strings. Immutable once built: every
/// downstream artifact (components, catalogs) is derived, never written
/// back.
#[derive(Debug)]
pub struct DepGraph {
    /// Directed graph: nodes = dependency ids, edges = dependencies.
    pub graph: DiGraph<String, ()>,
    /// Mapping from node id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// Per-node metadata keyed by node id.
    pub meta: HashMap<String, NodeMeta>,
    /// Relation label shared by this graph's edges (e.g. `"import"`).
    pub relation: String,
    /// BLAKE3 content hash of the sorted edge set.
    pub content_hash: String,
}

impl DepGraph {
    /// Build a [`DepGraph`] from a parsed record.
    ///
    /// Nodes referenced only by edges (absent from the record's node list)
    /// are added on the fly so the graph is always closed over its edges.
    #[must_use]
    #[instrument(skip(record), fields(nodes = record.nodes.len(), edges = record.edges.len()))]
    pub fn from_record(record: &GraphRecord) -> Self {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<String, NodeIndex> =
            HashMap::with_capacity(record.nodes.len());
        let mut meta: HashMap<String, NodeMeta> = HashMap::with_capacity(record.nodes.len());

        for node in &record.nodes {
            if node_map.contains_key(&node.id) {
                continue;
            }
            let idx = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), idx);
            meta.insert(
                node.id.clone(),
                NodeMeta {
                    abs_path: node.abs_path.clone(),
                    loc: node.loc,
                },
            );
        }

        // Deduplicated, sorted edge set — the hash input and the edge list
        // share one normalization pass.
        let mut edge_set: BTreeSet<(String, String)> = BTreeSet::new();
        let mut dropped_self = 0_usize;
        for edge in &record.edges {
            if edge.source == edge.target {
                dropped_self += 1;
                continue;
            }
            edge_set.insert((edge.source.clone(), edge.target.clone()));
        }
        if dropped_self > 0 {
            debug!(dropped_self, "dropped self-edges at graph build");
        }

        let content_hash = compute_edge_hash(&edge_set);

        for (source, target) in &edge_set {
            let source_idx = *node_map
                .entry(source.clone())
                .or_insert_with(|| graph.add_node(source.clone()));
            let target_idx = *node_map
                .entry(target.clone())
                .or_insert_with(|| graph.add_node(target.clone()));
            graph.add_edge(source_idx, target_idx, ());
        }

        Self {
            graph,
            node_map,
            meta,
            relation: record.relation().to_string(),
            content_hash,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges (after self-edge and duplicate removal).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a node id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// The id label of a node.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Successor ids of `id`, sorted for deterministic iteration.
    #[must_use]
    pub fn successors(&self, id: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|n| self.node_id(n))
            .collect();
        out.sort_unstable();
        out
    }

    /// All node ids, sorted.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Compute a BLAKE3 hash of the sorted edge set.
fn compute_edge_hash(edges: &BTreeSet<(String, String)>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (source, target) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}
