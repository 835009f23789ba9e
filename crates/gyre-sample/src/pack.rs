//! Greedy edge-disjoint packing of candidate cycles.
//!
//! # Selection order
//!
//! Candidates are ranked by length descending, then by average member
//! PageRank descending, then by node sequence — a total order, so the pack
//! is fully determined by its inputs.
//!
//! # Two passes
//!
//! 1. **Per-length balance**: walk length groups longest-first and accept
//!    up to `per_length_cap` edge-disjoint cycles per length, so one length
//!    cannot monopolize the component's representation.
//! 2. **Top-up**: rescan everything in overall priority order, no
//!    per-length cap, until the overall cap or exhaustion.
//!
//! The accepted set is pairwise edge-disjoint and maximal-greedy relative
//! to the candidate list — not a global optimum over every cycle the
//! component could yield.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::canon::ring_edges;

/// Caps for one component's pack. `None` means uncapped; `Some(0)` on the
/// overall cap means an empty pack.
#[derive(Debug, Clone, Copy)]
pub struct PackConfig {
    /// Maximum accepted cycles per exact length in pass 1. `None` disables
    /// the balancing pass entirely (plain greedy).
    pub per_length_cap: Option<usize>,
    /// Overall maximum across both passes.
    pub max_total: Option<usize>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            per_length_cap: Some(2),
            max_total: None,
        }
    }
}

/// Mean PageRank over a cycle's members; missing nodes score 0.
#[must_use]
pub fn average_score(cycle: &[String], scores: &HashMap<String, f64>) -> f64 {
    if cycle.is_empty() {
        return 0.0;
    }
    let total: f64 = cycle
        .iter()
        .map(|node| scores.get(node).copied().unwrap_or(0.0))
        .sum();
    total / cycle.len() as f64
}

fn priority(a: &[String], b: &[String], scores: &HashMap<String, f64>) -> Ordering {
    b.len()
        .cmp(&a.len())
        .then_with(|| {
            average_score(b, scores)
                .total_cmp(&average_score(a, scores))
        })
        .then_with(|| b.cmp(a))
}

/// Select a pairwise edge-disjoint subset of `candidates`.
///
/// An empty candidate list or an overall cap of zero yields an empty pack;
/// neither is an error.
#[must_use]
pub fn pack_edge_disjoint(
    candidates: &[Vec<String>],
    scores: &HashMap<String, f64>,
    config: &PackConfig,
) -> Vec<Vec<String>> {
    if candidates.is_empty() || config.max_total == Some(0) {
        return Vec::new();
    }

    let mut ordered: Vec<&Vec<String>> = candidates.iter().collect();
    ordered.sort_by(|a, b| priority(a, b, scores));

    let mut picked: Vec<Vec<String>> = Vec::new();
    let mut picked_keys: HashSet<&Vec<String>> = HashSet::new();
    let mut used_edges: HashSet<(String, String)> = HashSet::new();

    let at_cap = |picked: &Vec<Vec<String>>| {
        config
            .max_total
            .is_some_and(|cap| picked.len() >= cap)
    };

    let accepts = |cycle: &[String], used: &HashSet<(String, String)>| {
        ring_edges(cycle).iter().all(|edge| !used.contains(edge))
    };

    // Pass 1: per-length balance, longest group first.
    if let Some(cap) = config.per_length_cap {
        let mut by_length: BTreeMap<usize, Vec<&Vec<String>>> = BTreeMap::new();
        for &cycle in &ordered {
            by_length.entry(cycle.len()).or_default().push(cycle);
        }

        'lengths: for group in by_length.into_values().rev() {
            let mut taken = 0_usize;
            for cycle in group {
                if taken >= cap {
                    continue 'lengths;
                }
                if accepts(cycle, &used_edges) {
                    used_edges.extend(ring_edges(cycle));
                    picked.push(cycle.clone());
                    picked_keys.insert(cycle);
                    taken += 1;
                    if at_cap(&picked) {
                        return picked;
                    }
                }
            }
        }
    }

    // Pass 2: top-up in overall priority order.
    for cycle in ordered {
        if picked_keys.contains(cycle) {
            continue;
        }
        if accepts(cycle, &used_edges) {
            used_edges.extend(ring_edges(cycle));
            picked.push(cycle.clone());
            if at_cap(&picked) {
                break;
            }
        }
    }

    picked
}
