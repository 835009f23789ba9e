//! Cycle canonicalization: rotation-normalized keys for deduplication.
//!
//! # Direction
//!
//! A cycle has no distinguished start node, so rotation is always identity-
//! preserving and every key starts at the lexicographically smallest member.
//! Whether the *reverse* traversal is the same cycle depends on the
//! analysis: reversing a directed cycle's node order names edges that may
//! not exist in the graph. [`CanonMode`] makes that choice explicit per run;
//! the two modes are never mixed.

use serde::{Deserialize, Serialize};

/// How canonicalization treats traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonMode {
    /// Rotation only. A cycle and its reverse are distinct keys. This is
    /// the default: emitted edge lists always exist in the directed graph.
    DirectionPreserving,
    /// Rotation plus reflection: the key is the lexicographically smaller
    /// of the rotated sequence and the rotated reverse. Use only when the
    /// consuming analysis ignores edge direction.
    DirectionAgnostic,
}

impl CanonMode {
    /// Stable label recorded in catalog params.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DirectionPreserving => "rotation_only",
            Self::DirectionAgnostic => "rotate_reflect",
        }
    }
}

/// Rotate `nodes` so the lexicographically smallest element comes first.
fn rotate_to_min(nodes: &[String]) -> Vec<String> {
    let Some(pivot) = (0..nodes.len()).min_by_key(|&i| &nodes[i]) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(nodes.len());
    out.extend_from_slice(&nodes[pivot..]);
    out.extend_from_slice(&nodes[..pivot]);
    out
}

/// Canonical key of a cycle's node sequence under `mode`.
///
/// Two cycles are identical iff their canonical keys are equal.
#[must_use]
pub fn canonical_key(nodes: &[String], mode: CanonMode) -> Vec<String> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let forward = rotate_to_min(nodes);
    match mode {
        CanonMode::DirectionPreserving => forward,
        CanonMode::DirectionAgnostic => {
            let reversed: Vec<String> = nodes.iter().rev().cloned().collect();
            let backward = rotate_to_min(&reversed);
            if forward <= backward { forward } else { backward }
        }
    }
}

/// The directed ring edges `(n[i], n[i+1])`, closing back to `n[0]`.
#[must_use]
pub fn ring_edges(nodes: &[String]) -> Vec<(String, String)> {
    let m = nodes.len();
    (0..m)
        .map(|i| (nodes[i].clone(), nodes[(i + 1) % m].clone()))
        .collect()
}
