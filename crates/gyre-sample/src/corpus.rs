//! Corpus plumbing: the repos file and cross-repository candidate pools.
//!
//! # Repos file
//!
//! One repository per line:
//!
//! ```text
//! # repo      branch   [entry      [language]]
//! payments    main     src/app.py  python
//! billing     develop
//! ```
//!
//! Blank lines and `#` comments are ignored. The line order is load-bearing:
//! it defines the deterministic repository rank the fair sampler uses for
//! tie-breaking.
//!
//! # Candidate pools
//!
//! [`collect_candidates`] loads each repository's `cycle_catalog.json` from
//! `<results_root>/<repo>/<branch>/cycle_catalog.json`. A missing or invalid
//! catalog skips that repository with a warning — one broken repository must
//! not sink a corpus-wide run.

use std::collections::BTreeMap;
use std::path::Path;

use gyre_core::CoreError;
use tracing::{debug, warn};

use crate::catalog::CycleCatalog;

/// One corpus repository, as listed in the repos file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Repository name.
    pub name: String,
    /// Base branch of the analyzed snapshot.
    pub branch: String,
    /// Extractor entry point, when listed.
    pub entry: Option<String>,
    /// Source language, when listed.
    pub language: Option<String>,
}

/// Parse the repos file.
///
/// # Errors
///
/// [`CoreError::Io`] if unreadable; [`CoreError::InvalidRecord`] for a line
/// with fewer than two columns or an empty file.
pub fn parse_repos_file(path: &Path) -> Result<Vec<RepoSpec>, CoreError> {
    let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut repos = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        if columns.len() < 2 {
            return Err(CoreError::InvalidRecord {
                reason: format!(
                    "{}:{}: expected at least 2 columns (repo, branch), got {trimmed:?}",
                    path.display(),
                    number + 1
                ),
            });
        }
        repos.push(RepoSpec {
            name: columns[0].to_string(),
            branch: columns[1].to_string(),
            entry: columns.get(2).map(ToString::to_string),
            language: columns.get(3).map(ToString::to_string),
        });
    }

    if repos.is_empty() {
        return Err(CoreError::InvalidRecord {
            reason: format!("{}: no repositories listed", path.display()),
        });
    }
    Ok(repos)
}

/// Candidate cycle ids grouped by exact length, then by repository.
///
/// Within each `(length, repo)` bucket the ids are deduplicated and sorted,
/// so drain order is deterministic.
pub type CandidatePool = BTreeMap<usize, BTreeMap<String, Vec<String>>>;

/// Path of one repository's catalog under the results root.
#[must_use]
pub fn catalog_path(results_root: &Path, repo: &RepoSpec) -> std::path::PathBuf {
    results_root
        .join(&repo.name)
        .join(&repo.branch)
        .join("cycle_catalog.json")
}

/// Load every repository's catalog and pool its cycles by length.
///
/// Repositories whose catalog is missing or unreadable are skipped with a
/// warning. Cycles outside `[min_len, max_len]` are filtered out.
#[must_use]
pub fn collect_candidates(
    repos: &[RepoSpec],
    results_root: &Path,
    min_len: Option<usize>,
    max_len: Option<usize>,
) -> CandidatePool {
    let mut pool: CandidatePool = BTreeMap::new();

    for repo in repos {
        let path = catalog_path(results_root, repo);
        let catalog = match CycleCatalog::load(&path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    repo = %repo.name,
                    branch = %repo.branch,
                    error = %err,
                    "skipping repository: catalog unavailable"
                );
                continue;
            }
        };

        let mut kept = 0_usize;
        for component in &catalog.sccs {
            for cycle in &component.cycles {
                if min_len.is_some_and(|lo| cycle.length < lo) {
                    continue;
                }
                if max_len.is_some_and(|hi| cycle.length > hi) {
                    continue;
                }
                pool.entry(cycle.length)
                    .or_default()
                    .entry(repo.name.clone())
                    .or_default()
                    .push(cycle.id.clone());
                kept += 1;
            }
        }
        debug!(repo = %repo.name, candidates = kept, "collected catalog candidates");
    }

    for by_repo in pool.values_mut() {
        for ids in by_repo.values_mut() {
            ids.sort_unstable();
            ids.dedup();
        }
    }

    pool
}
