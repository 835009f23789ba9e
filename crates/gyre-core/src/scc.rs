//! SCC decomposition into cyclic components.
//!
//! # Overview
//!
//! A *cyclic component* is a strongly connected component with at least two
//! members. Singleton SCCs cannot contain a cycle (self-edges are removed at
//! graph build) and are discarded here, so everything downstream — cycle
//! discovery, packing, sampling — only ever sees components that are
//! guaranteed to contain at least one cycle.
//!
//! # Determinism
//!
//! Components are sorted by size descending, ties broken by the
//! lexicographic order of their sorted member lists, and then labeled
//! `scc_0`, `scc_1`, …. Repeated runs over the same graph produce
//! identically-labeled components.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::algo::tarjan_scc;
use tracing::instrument;

use crate::graph::DepGraph;

/// A strongly connected component of size ≥ 2, with its induced subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicComponent {
    /// Stable id: `scc_<rank>` by the deterministic component order.
    pub id: String,
    /// Member node ids, sorted.
    pub members: Vec<String>,
    /// Induced edges (both endpoints inside the component), sorted.
    pub edges: Vec<(String, String)>,
}

impl CyclicComponent {
    /// Number of member nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Number of induced edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Directed density `m / (n·(n−1))`.
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.members.len();
        if n <= 1 {
            return 0.0;
        }
        self.edges.len() as f64 / (n * (n - 1)) as f64
    }

    /// Lower bound on the number of edges to remove to break all cycles,
    /// computed on the undirected view: `max(0, m_und − (n − 1))`.
    #[must_use]
    pub fn edge_surplus_lower_bound(&self) -> usize {
        let n = self.members.len();
        if n <= 1 {
            return 0;
        }
        let undirected: BTreeSet<(&str, &str)> = self
            .edges
            .iter()
            .map(|(u, v)| {
                if u <= v {
                    (u.as_str(), v.as_str())
                } else {
                    (v.as_str(), u.as_str())
                }
            })
            .collect();
        undirected.len().saturating_sub(n - 1)
    }

    /// Whether `id` is a member of this component.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.binary_search_by(|m| m.as_str().cmp(id)).is_ok()
    }

    /// Successor adjacency of the induced subgraph.
    ///
    /// Every member appears as a key, and successor lists come out sorted
    /// because the edge list is sorted.
    #[must_use]
    pub fn adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut adj: BTreeMap<&str, Vec<&str>> = self
            .members
            .iter()
            .map(|m| (m.as_str(), Vec::new()))
            .collect();
        for (source, target) in &self.edges {
            if let Some(succ) = adj.get_mut(source.as_str()) {
                succ.push(target.as_str());
            }
        }
        adj
    }
}

/// Partition `dep` into cyclic components (SCCs of size ≥ 2).
///
/// Every member of a returned component has at least one incoming and one
/// outgoing edge confined to the component — that is what strong
/// connectivity at size ≥ 2 means, and the induced edge list preserves it.
#[must_use]
#[instrument(skip(dep), fields(nodes = dep.node_count(), edges = dep.edge_count()))]
pub fn cyclic_components(dep: &DepGraph) -> Vec<CyclicComponent> {
    let mut components: Vec<(Vec<String>, Vec<(String, String)>)> = tarjan_scc(&dep.graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<String> = component
                .iter()
                .filter_map(|&idx| dep.node_id(idx).map(ToString::to_string))
                .collect();
            members.sort_unstable();

            let member_set: HashSet<&str> = members.iter().map(String::as_str).collect();
            let mut edges: Vec<(String, String)> = Vec::new();
            for member in &members {
                for succ in dep.successors(member) {
                    if member_set.contains(succ) {
                        edges.push((member.clone(), succ.to_string()));
                    }
                }
            }
            edges.sort_unstable();

            (members, edges)
        })
        .collect();

    // Size descending, then lexicographic on the sorted member list.
    components.sort_by(|(a_members, _), (b_members, _)| {
        b_members
            .len()
            .cmp(&a_members.len())
            .then_with(|| a_members.cmp(b_members))
    });

    components
        .into_iter()
        .enumerate()
        .map(|(rank, (members, edges))| CyclicComponent {
            id: format!("scc_{rank}"),
            members,
            edges,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EdgeRecord, GraphRecord, NodeRecord};

    fn graph(edges: &[(&str, &str)]) -> DepGraph {
        let nodes: BTreeSet<&str> = edges.iter().flat_map(|(s, t)| [*s, *t]).collect();
        DepGraph::from_record(&GraphRecord {
            schema_version: 1,
            language: String::new(),
            repo_root: String::new(),
            entry: String::new(),
            nodes: nodes
                .into_iter()
                .map(|id| NodeRecord {
                    id: id.to_string(),
                    abs_path: None,
                    loc: None,
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
        })
    }

    #[test]
    fn acyclic_graph_has_no_components() {
        let dep = graph(&[("a", "b"), ("b", "c")]);
        assert!(cyclic_components(&dep).is_empty());
    }

    #[test]
    fn three_cycle_with_pendant_node() {
        // a → b → c → a, c → d: d has no return path and is excluded.
        let dep = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let components = cyclic_components(&dep);

        assert_eq!(components.len(), 1);
        let scc = &components[0];
        assert_eq!(scc.id, "scc_0");
        assert_eq!(scc.members, vec!["a", "b", "c"]);
        assert_eq!(scc.edge_count(), 3);
        assert!(!scc.contains("d"));
    }

    #[test]
    fn every_member_has_in_and_out_edges_in_component() {
        let dep = graph(&[("a", "b"), ("b", "a"), ("c", "d"), ("d", "e"), ("e", "c")]);
        for component in cyclic_components(&dep) {
            for member in &component.members {
                let has_out = component.edges.iter().any(|(s, _)| s == member);
                let has_in = component.edges.iter().any(|(_, t)| t == member);
                assert!(has_out, "{member} must have an outgoing edge");
                assert!(has_in, "{member} must have an incoming edge");
            }
        }
    }

    #[test]
    fn components_ordered_by_size_then_members() {
        // Two components: {x, y} and {a, b, c}. Larger one ranks first.
        let dep = graph(&[("x", "y"), ("y", "x"), ("a", "b"), ("b", "c"), ("c", "a")]);
        let components = cyclic_components(&dep);

        assert_eq!(components.len(), 2);
        assert_eq!(components[0].id, "scc_0");
        assert_eq!(components[0].members, vec!["a", "b", "c"]);
        assert_eq!(components[1].id, "scc_1");
        assert_eq!(components[1].members, vec!["x", "y"]);
    }

    #[test]
    fn equal_size_tie_broken_lexicographically() {
        let dep = graph(&[("m", "n"), ("n", "m"), ("a", "b"), ("b", "a")]);
        let components = cyclic_components(&dep);

        assert_eq!(components[0].members, vec!["a", "b"]);
        assert_eq!(components[1].members, vec!["m", "n"]);
    }

    #[test]
    fn density_and_surplus() {
        // Reciprocal pair: n=2, m=2, density 1.0; undirected edges 1, surplus 0.
        let dep = graph(&[("a", "b"), ("b", "a")]);
        let scc = &cyclic_components(&dep)[0];
        assert!((scc.density() - 1.0).abs() < f64::EPSILON);
        assert_eq!(scc.edge_surplus_lower_bound(), 0);

        // Triangle plus a chord pair: more undirected edges than a tree.
        let dep = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("b", "a")]);
        let scc = &cyclic_components(&dep)[0];
        // Undirected: {a,b}, {b,c}, {a,c} = 3; n−1 = 2 → surplus 1.
        assert_eq!(scc.edge_surplus_lower_bound(), 1);
    }

    #[test]
    fn adjacency_is_sorted_and_confined() {
        let dep = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let scc = &cyclic_components(&dep)[0];
        let adj = scc.adjacency();
        assert_eq!(adj["a"], vec!["b"]);
        assert_eq!(adj["c"], vec!["a"]); // c → d is outside the component
    }
}
