//! Input records: the per-repository `dependency_graph.json` document.
//!
//! # Schema
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "language": "python",
//!   "repo_root": "/abs/path/to/checkout",
//!   "entry": "src/main.py",
//!   "nodes": [{"id": "src/a.py", "abs_path": "/abs/.../src/a.py"}],
//!   "edges": [{"source": "src/a.py", "target": "src/b.py", "relation": "import"}]
//! }
//! ```
//!
//! Node ids are stable, repository-relative path-like strings. `source` and
//! `target` are required on every edge; a record missing them fails to parse
//! and the whole repository is skipped by multi-repo callers.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

fn default_relation() -> String {
    "import".to_string()
}

const fn default_schema_version() -> u32 {
    1
}

/// One dependency node: a file or module in the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Stable repository-relative identifier.
    pub id: String,
    /// Absolute path on disk, when the extractor recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    /// Non-blank line count, when the extractor recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<u64>,
}

/// One directed dependency edge `source → target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Id of the depending node.
    pub source: String,
    /// Id of the depended-upon node.
    pub target: String,
    /// Relation label, e.g. `"import"`.
    #[serde(default = "default_relation")]
    pub relation: String,
}

/// A full dependency-graph record for one repository snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Record schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Source language of the analyzed repository, if known.
    #[serde(default)]
    pub language: String,
    /// Absolute path of the analyzed checkout, if known.
    #[serde(default)]
    pub repo_root: String,
    /// Entry point the extractor started from, if any.
    #[serde(default)]
    pub entry: String,
    /// All dependency nodes.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// All dependency edges.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphRecord {
    /// Load and parse a record from `path`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Io`] if the file cannot be read, [`CoreError::Parse`] if
    /// it is not valid JSON or an edge is missing `source`/`target`.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Relation label shared by this record's edges.
    ///
    /// Taken from the first edge; defaults to `"import"` for edgeless
    /// records.
    #[must_use]
    pub fn relation(&self) -> &str {
        self.edges
            .first()
            .map_or("import", |edge| edge.relation.as_str())
    }
}

/// Count non-blank lines of the file at `path`.
///
/// Unreadable files count as 0 — LOC roll-ups are best-effort metadata, not
/// part of the algorithm's contract.
#[must_use]
pub fn count_loc(path: &Path) -> u64 {
    let Ok(file) = fs::File::open(path) else {
        return 0;
    };
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.trim().is_empty())
        .count() as u64
}
