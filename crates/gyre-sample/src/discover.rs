//! Bounded cycle discovery inside one cyclic component.
//!
//! # Strategies
//!
//! - [`Strategy::Exact`] enumerates every simple cycle up to the length
//!   bound. Each cycle is found exactly once, rooted at its smallest member:
//!   the DFS only visits nodes ordered at or after the root, so no cycle is
//!   reported from two different starting points. Preferred whenever the
//!   component is small enough to enumerate.
//! - [`Strategy::Sample`] runs bounded random walks: pick a start node, walk
//!   up to the length bound, and record the closing sub-path whenever the
//!   walk revisits a node already on it. A Monte Carlo sampler, not
//!   exhaustive — it trades completeness for bounded runtime on dense
//!   components.
//!
//! # Randomness
//!
//! The sampler draws from a caller-seeded [`StdRng`] in a fixed order: one
//! draw for the start node, then one draw per step. Identical seed and
//! inputs reproduce identical candidates bit-for-bit.
//!
//! # Fallback
//!
//! A component of size ≥ 2 is cyclic by definition. If the chosen strategy
//! comes back empty (e.g. the attempt budget missed everything), reciprocal
//! 2-cycles are enumerated directly as a last resort.

use std::collections::{HashMap, HashSet};

use gyre_core::CyclicComponent;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canon::{CanonMode, canonical_key};

/// Which discovery strategy to run for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Exhaustive enumeration within the length bound.
    Exact,
    /// Bounded random-walk sampling.
    Sample,
}

impl Strategy {
    /// Stable label recorded in catalog params.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Sample => "sample",
        }
    }
}

/// Parameters shared by both strategies.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    /// Maximum cycle length to consider.
    pub max_cycle_len: usize,
    /// Walk attempts per component (sampling strategy only).
    pub attempts: usize,
    /// Canonicalization mode applied to every discovered cycle.
    pub mode: CanonMode,
}

/// Discover candidate cycles for one component.
///
/// Applies the 2-cycle fallback when the strategy finds nothing, then
/// returns candidates sorted largest-first with a deterministic sequence
/// tie-break. An empty result is valid: it means no cycle fits the length
/// bound.
#[must_use]
pub fn discover(
    component: &CyclicComponent,
    strategy: Strategy,
    config: &DiscoveryConfig,
    rng: &mut StdRng,
) -> Vec<Vec<String>> {
    let mut cycles = match strategy {
        Strategy::Exact => enumerate_cycles(component, config.max_cycle_len, config.mode),
        Strategy::Sample => sample_cycles(
            component,
            config.max_cycle_len,
            config.attempts,
            config.mode,
            rng,
        ),
    };

    if cycles.is_empty() {
        debug!(
            component = %component.id,
            strategy = strategy.label(),
            "no cycles discovered, falling back to reciprocal 2-cycles"
        );
        cycles = reciprocal_two_cycles(component, config.max_cycle_len, config.mode);
    }

    sort_largest_first(&mut cycles);
    cycles
}

/// Enumerate all simple cycles of length ≤ `max_len`.
///
/// Iterative DFS rooted at each member in sorted order, restricted to
/// members that sort at or after the root.
#[must_use]
pub fn enumerate_cycles(
    component: &CyclicComponent,
    max_len: usize,
    mode: CanonMode,
) -> Vec<Vec<String>> {
    if max_len < 2 {
        return Vec::new();
    }

    let adjacency = component.adjacency();
    let ordinal: HashMap<&str, usize> = component
        .members
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut found: Vec<Vec<String>> = Vec::new();

    for (root_ord, root) in component.members.iter().enumerate() {
        let root = root.as_str();

        // Frame: (node, index of the next successor to try).
        let mut frames: Vec<(&str, usize)> = vec![(root, 0)];
        let mut path: Vec<&str> = vec![root];
        let mut on_path: HashSet<&str> = HashSet::from([root]);

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            let successors = &adjacency[node];

            if frame.1 < successors.len() {
                let next = successors[frame.1];
                frame.1 += 1;

                if next == root {
                    if path.len() >= 2 {
                        let cycle: Vec<String> =
                            path.iter().map(ToString::to_string).collect();
                        let key = canonical_key(&cycle, mode);
                        if seen.insert(key.clone()) {
                            found.push(key);
                        }
                    }
                } else if ordinal.get(next).is_some_and(|&ord| ord > root_ord)
                    && !on_path.contains(next)
                    && path.len() < max_len
                {
                    frames.push((next, 0));
                    path.push(next);
                    on_path.insert(next);
                }
            } else {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(done);
                }
            }
        }
    }

    found
}

/// Sample cycles by repeated bounded random walks.
#[must_use]
pub fn sample_cycles(
    component: &CyclicComponent,
    max_len: usize,
    attempts: usize,
    mode: CanonMode,
    rng: &mut StdRng,
) -> Vec<Vec<String>> {
    if component.members.is_empty() || max_len < 2 {
        return Vec::new();
    }

    let adjacency = component.adjacency();
    let nodes: Vec<&str> = component.members.iter().map(String::as_str).collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut found: Vec<Vec<String>> = Vec::new();

    for _ in 0..attempts {
        let start = nodes[rng.gen_range(0..nodes.len())];
        let mut path: Vec<&str> = vec![start];
        let mut position: HashMap<&str, usize> = HashMap::from([(start, 0)]);
        let mut current = start;

        for _ in 0..max_len {
            let successors = &adjacency[current];
            if successors.is_empty() {
                break;
            }
            current = successors[rng.gen_range(0..successors.len())];

            if let Some(&first) = position.get(current) {
                // The walk closed on itself: the sub-path from the first
                // occurrence of `current` back to it is a simple cycle.
                let cycle: Vec<String> =
                    path[first..].iter().map(ToString::to_string).collect();
                if (2..=max_len).contains(&cycle.len()) {
                    let key = canonical_key(&cycle, mode);
                    if seen.insert(key.clone()) {
                        found.push(key);
                    }
                }
                break;
            }

            path.push(current);
            position.insert(current, path.len() - 1);
        }
    }

    found
}

/// Enumerate directly reciprocal 2-cycles (`u → v` and `v → u`).
#[must_use]
pub fn reciprocal_two_cycles(
    component: &CyclicComponent,
    max_len: usize,
    mode: CanonMode,
) -> Vec<Vec<String>> {
    if max_len < 2 {
        return Vec::new();
    }

    let edge_set: HashSet<(&str, &str)> = component
        .edges
        .iter()
        .map(|(u, v)| (u.as_str(), v.as_str()))
        .collect();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut found: Vec<Vec<String>> = Vec::new();

    for (u, v) in &component.edges {
        if u < v && edge_set.contains(&(v.as_str(), u.as_str())) {
            let key = canonical_key(&[u.clone(), v.clone()], mode);
            if seen.insert(key.clone()) {
                found.push(key);
            }
        }
    }

    found
}

/// Largest first, ties broken by the node sequence (descending, matching
/// the catalog's packing priority).
pub fn sort_largest_first(cycles: &mut [Vec<String>]) {
    cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
}
