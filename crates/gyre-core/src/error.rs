//! Typed errors for record loading and graph construction.
//!
//! A [`CoreError`] always refers to a single repository's inputs. Callers
//! iterating over many repositories are expected to log the error and move
//! on to the next repository rather than abort the whole run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading or validating per-repository inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The record file could not be read at all.
    #[error("failed to read {path}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The record file is not valid JSON or is missing required fields
    /// (e.g. an edge without `source`/`target`).
    #[error("invalid dependency graph record at {path}")]
    Parse {
        /// Path of the offending record.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A structurally valid file that violates the record contract.
    #[error("invalid record: {reason}")]
    InvalidRecord {
        /// Human-readable description of the violation.
        reason: String,
    },
}
