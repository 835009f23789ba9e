//! Full-graph PageRank for node importance features.
//!
//! # Overview
//!
//! PageRank identifies nodes that many dependency paths flow through. The
//! scores are attached to the component report as `node_features` and used
//! downstream as the secondary priority when packing edge-disjoint cycles.
//!
//! # Algorithm
//!
//! Standard iterative power method on the adjacency structure:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//! ```
//!
//! with damping factor `d` (default 0.85). Dangling nodes (no outgoing
//! edges) distribute their rank equally to all nodes.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::visit::{IntoNodeIdentifiers, NodeIndexable};
use tracing::instrument;

use crate::graph::DepGraph;

/// Configuration for PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (probability of following an edge vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Convergence threshold: stop when the L1 norm of the rank delta drops
    /// below this. Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations. Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// Scores keyed by node id. Ordered map so serialized output is stable.
    pub scores: BTreeMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the computation converged within `max_iter`.
    pub converged: bool,
}

/// Compute PageRank over the full dependency graph.
///
/// Graphs with no nodes or no edges yield an empty score map — callers fall
/// back to 0.0 per node, matching the report contract.
#[must_use]
#[instrument(skip(dep, config), fields(nodes = dep.node_count(), edges = dep.edge_count()))]
pub fn pagerank(dep: &DepGraph, config: &PageRankConfig) -> PageRankResult {
    let g = &dep.graph;
    let n = g.node_count();

    if n == 0 || g.edge_count() == 0 {
        return PageRankResult {
            scores: BTreeMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        for rank in &mut new_ranks {
            *rank = base;
        }

        for node in g.node_identifiers() {
            let idx = g.to_index(node);
            let out_degree = g.neighbors_directed(node, Direction::Outgoing).count();

            if out_degree == 0 {
                // Dangling node: its rank teleports everywhere.
                let share = config.damping * ranks[idx] / n_f64;
                for rank in &mut new_ranks {
                    *rank += share;
                }
            } else {
                let share = config.damping * ranks[idx] / out_degree as f64;
                for neighbor in g.neighbors_directed(node, Direction::Outgoing) {
                    new_ranks[g.to_index(neighbor)] += share;
                }
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    let scores = g
        .node_identifiers()
        .filter_map(|node| {
            dep.node_id(node)
                .map(|id| (id.to_string(), ranks[g.to_index(node)]))
        })
        .collect();

    PageRankResult {
        scores,
        iterations,
        converged,
    }
}
