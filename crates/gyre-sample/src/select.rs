//! Cross-corpus fair selection of cycles, stratified by exact length.
//!
//! # Overview
//!
//! Given candidate pools from many repositories (see [`crate::corpus`]),
//! select a globally-sized sample that is spread fairly across both cycle
//! lengths and repositories:
//!
//! 1. Quotas: the global target splits evenly across observed lengths,
//!    remainder going to the smallest lengths first.
//! 2. Each length bucket fills under a two-regime rule — one-per-repository
//!    when supply allows, otherwise one-to-every-repository followed by a
//!    fewest-picks-first fill.
//! 3. A spillover pass rotates across buckets to reach the target when
//!    quotas could not be filled exactly.
//!
//! # State
//!
//! All fairness bookkeeping lives in [`SelectionState`], a single-owner
//! value threaded by `&mut` through the selection routines. Nothing here is
//! global, and nothing here is random: identical pools, repository order,
//! and configuration produce identical outcomes.

use std::collections::{BTreeMap, HashMap, VecDeque};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::corpus::{CandidatePool, RepoSpec};

/// Direction in which length buckets are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOrder {
    /// Smallest lengths first.
    Ascending,
    /// Largest lengths first (the usual default: long cycles are scarcer).
    Descending,
}

/// Configuration errors — fatal before any processing begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    /// The global target (or per-length cap) was zero.
    #[error("selection target must be positive")]
    ZeroTarget,
}

/// One selected cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCycle {
    /// Exact cycle length.
    pub length: usize,
    /// Source repository.
    pub repo: String,
    /// Cycle id inside that repository's catalog.
    pub cycle_id: String,
}

/// Fairness counters for one selection run.
///
/// Mutated monotonically while the run proceeds; dropped afterwards.
#[derive(Debug, Default)]
pub struct SelectionState {
    global: BTreeMap<String, usize>,
    per_length: BTreeMap<(usize, String), usize>,
}

impl SelectionState {
    /// Total picks attributed to `repo` so far.
    #[must_use]
    pub fn global_picks(&self, repo: &str) -> usize {
        self.global.get(repo).copied().unwrap_or(0)
    }

    /// Picks attributed to `repo` for cycles of `length`.
    #[must_use]
    pub fn length_picks(&self, length: usize, repo: &str) -> usize {
        self.per_length
            .get(&(length, repo.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn record(&mut self, length: usize, repo: &str) {
        *self.global.entry(repo.to_string()).or_default() += 1;
        *self
            .per_length
            .entry((length, repo.to_string()))
            .or_default() += 1;
    }
}

/// The result of one selection run.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Selected cycles in pick order.
    pub picks: Vec<SelectedCycle>,
    /// Target per length (empty in per-length-cap mode).
    pub quotas: BTreeMap<usize, usize>,
    /// Available candidates per length before selection.
    pub available: BTreeMap<usize, usize>,
    /// Selected count per length.
    pub selected_per_length: BTreeMap<usize, usize>,
    /// Selected count per repository.
    pub selected_per_repo: BTreeMap<String, usize>,
    /// Quota units left unfilled before the spillover pass.
    pub quota_shortfall: usize,
    /// Final shortfall: target minus total selected.
    pub shortfall: usize,
}

impl SelectionOutcome {
    /// Manifest lines, one `<repo> <branch> <cycle-id>` per pick.
    #[must_use]
    pub fn manifest_lines(&self, repos: &[RepoSpec]) -> Vec<String> {
        let branches: HashMap<&str, &str> = repos
            .iter()
            .map(|r| (r.name.as_str(), r.branch.as_str()))
            .collect();
        self.picks
            .iter()
            .map(|pick| {
                let branch = branches.get(pick.repo.as_str()).copied().unwrap_or("main");
                format!("{} {} {}", pick.repo, branch, pick.cycle_id)
            })
            .collect()
    }
}

/// Per-length working queues, drained front-first.
type Queues = BTreeMap<usize, BTreeMap<String, VecDeque<String>>>;

/// Split `total` evenly over `lengths`, remainder to the smallest first.
///
/// The returned quotas always sum to `total` exactly.
#[must_use]
pub fn compute_quotas(total: usize, lengths: &[usize]) -> BTreeMap<usize, usize> {
    if lengths.is_empty() {
        return BTreeMap::new();
    }
    let base = total / lengths.len();
    let remainder = total % lengths.len();

    // `lengths` arrives ascending (pool keys); the first `remainder` get +1.
    lengths
        .iter()
        .enumerate()
        .map(|(i, &len)| (len, base + usize::from(i < remainder)))
        .collect()
}

fn build_queues(pool: &CandidatePool) -> Queues {
    pool.iter()
        .map(|(&length, by_repo)| {
            (
                length,
                by_repo
                    .iter()
                    .map(|(repo, ids)| (repo.clone(), ids.iter().cloned().collect()))
                    .collect(),
            )
        })
        .collect()
}

/// Fill one length bucket under the two-regime rule. Returns `(repo, id)`
/// picks in selection order.
fn fill_bucket(
    queues: &mut BTreeMap<String, VecDeque<String>>,
    take_n: usize,
    length: usize,
    repos_order: &[String],
    rank: &HashMap<String, usize>,
    state: &mut SelectionState,
) -> Vec<(String, String)> {
    let mut chosen: Vec<(String, String)> = Vec::new();
    let supply = queues.values().filter(|q| !q.is_empty()).count();
    if supply == 0 || take_n == 0 {
        return chosen;
    }

    let repo_rank = |repo: &str| rank.get(repo).copied().unwrap_or(usize::MAX);

    // Repositories with candidates, fairest (fewest global picks) first.
    let mut candidates: Vec<String> = repos_order
        .iter()
        .filter(|repo| queues.get(*repo).is_some_and(|q| !q.is_empty()))
        .cloned()
        .collect();
    candidates.sort_by_key(|repo| (state.global_picks(repo), repo_rank(repo), repo.clone()));

    if supply >= take_n {
        // Enough distinct repositories: cap one per repository.
        for repo in candidates.into_iter().take(take_n) {
            if let Some(id) = queues.get_mut(&repo).and_then(VecDeque::pop_front) {
                state.record(length, &repo);
                chosen.push((repo, id));
            }
        }
        return chosen;
    }

    // Scarce supply: one to every available repository first…
    for repo in candidates {
        if chosen.len() >= take_n {
            break;
        }
        if let Some(id) = queues.get_mut(&repo).and_then(VecDeque::pop_front) {
            state.record(length, &repo);
            chosen.push((repo, id));
        }
    }

    // …then fill the remainder from whichever repository is least served.
    while chosen.len() < take_n {
        let Some(repo) = queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(repo, _)| repo.clone())
            .min_by_key(|repo| {
                (
                    state.global_picks(repo),
                    state.length_picks(length, repo),
                    repo_rank(repo),
                    repo.clone(),
                )
            })
        else {
            break;
        };
        let Some(id) = queues.get_mut(&repo).and_then(VecDeque::pop_front) else {
            break;
        };
        state.record(length, &repo);
        chosen.push((repo, id));
    }

    chosen
}

/// Pick one more cycle for the spillover pass, rotating across length
/// buckets starting after the previously served bucket.
fn spill_one(
    queues: &mut Queues,
    size_order: &[usize],
    cursor: &mut usize,
    rank: &HashMap<String, usize>,
    state: &mut SelectionState,
) -> Option<(usize, String, String)> {
    let repo_rank = |repo: &str| rank.get(repo).copied().unwrap_or(usize::MAX);

    for step in 0..size_order.len() {
        let length = size_order[(*cursor + step) % size_order.len()];
        let Some(by_repo) = queues.get(&length) else {
            continue;
        };

        let repo = by_repo
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(repo, _)| repo.clone())
            .min_by_key(|repo| {
                (
                    state.global_picks(repo),
                    state.length_picks(length, repo),
                    repo_rank(repo),
                    repo.clone(),
                )
            });
        let Some(repo) = repo else {
            queues.remove(&length);
            continue;
        };

        let id = queues
            .get_mut(&length)
            .and_then(|by_repo| by_repo.get_mut(&repo))
            .and_then(VecDeque::pop_front)?;
        state.record(length, &repo);
        *cursor = (*cursor + step + 1) % size_order.len();
        return Some((length, repo, id));
    }
    None
}

fn outcome_from(
    picks: Vec<SelectedCycle>,
    quotas: BTreeMap<usize, usize>,
    available: BTreeMap<usize, usize>,
    quota_shortfall: usize,
    target: usize,
) -> SelectionOutcome {
    let mut selected_per_length: BTreeMap<usize, usize> = BTreeMap::new();
    let mut selected_per_repo: BTreeMap<String, usize> = BTreeMap::new();
    for pick in &picks {
        *selected_per_length.entry(pick.length).or_default() += 1;
        *selected_per_repo.entry(pick.repo.clone()).or_default() += 1;
    }
    let shortfall = target.saturating_sub(picks.len());
    SelectionOutcome {
        picks,
        quotas,
        available,
        selected_per_length,
        selected_per_repo,
        quota_shortfall,
        shortfall,
    }
}

fn availability(pool: &CandidatePool) -> BTreeMap<usize, usize> {
    pool.iter()
        .map(|(&length, by_repo)| (length, by_repo.values().map(Vec::len).sum()))
        .collect()
}

fn ordered_lengths(pool: &CandidatePool, order: SizeOrder) -> Vec<usize> {
    let mut lengths: Vec<usize> = pool.keys().copied().collect();
    if order == SizeOrder::Descending {
        lengths.reverse();
    }
    lengths
}

/// Select exactly `total` cycles (or as many as exist) across the corpus.
///
/// # Errors
///
/// [`SelectError::ZeroTarget`] if `total` is zero — a configuration error,
/// rejected before any processing.
#[instrument(skip(pool, repos), fields(lengths = pool.len(), repos = repos.len()))]
pub fn select_fair(
    pool: &CandidatePool,
    repos: &[RepoSpec],
    total: usize,
    order: SizeOrder,
) -> Result<SelectionOutcome, SelectError> {
    if total == 0 {
        return Err(SelectError::ZeroTarget);
    }

    let repos_order: Vec<String> = repos.iter().map(|r| r.name.clone()).collect();
    let rank: HashMap<String, usize> = repos_order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();

    let ascending: Vec<usize> = pool.keys().copied().collect();
    let quotas = compute_quotas(total, &ascending);
    let size_order = ordered_lengths(pool, order);
    let available = availability(pool);

    let mut queues = build_queues(pool);
    let mut state = SelectionState::default();
    let mut picks: Vec<SelectedCycle> = Vec::new();
    let mut quota_shortfall = 0_usize;

    // Pass 1: fill each bucket's quota as far as supply allows.
    for &length in &size_order {
        let want = quotas.get(&length).copied().unwrap_or(0);
        if want == 0 {
            continue;
        }
        let Some(by_repo) = queues.get_mut(&length) else {
            quota_shortfall += want;
            continue;
        };

        let got = fill_bucket(by_repo, want, length, &repos_order, &rank, &mut state);
        quota_shortfall += want - got.len();
        for (repo, cycle_id) in got {
            picks.push(SelectedCycle {
                length,
                repo,
                cycle_id,
            });
        }

        by_repo.retain(|_, q| !q.is_empty());
        if by_repo.is_empty() {
            queues.remove(&length);
        }
    }

    // Pass 2: spillover until the target is met or candidates run out.
    let mut cursor = 0_usize;
    while picks.len() < total && !queues.is_empty() {
        let Some((length, repo, cycle_id)) =
            spill_one(&mut queues, &size_order, &mut cursor, &rank, &mut state)
        else {
            break;
        };
        picks.push(SelectedCycle {
            length,
            repo,
            cycle_id,
        });
        if let Some(by_repo) = queues.get_mut(&length) {
            by_repo.retain(|_, q| !q.is_empty());
            if by_repo.is_empty() {
                queues.remove(&length);
            }
        }
    }

    debug!(
        selected = picks.len(),
        quota_shortfall, "fair selection finished"
    );
    Ok(outcome_from(picks, quotas, available, quota_shortfall, total))
}

/// Per-length-cap mode: select up to `max_per_length` cycles for every
/// observed length, no global target and no spillover.
///
/// # Errors
///
/// [`SelectError::ZeroTarget`] if `max_per_length` is zero.
#[instrument(skip(pool, repos), fields(lengths = pool.len(), repos = repos.len()))]
pub fn select_per_length(
    pool: &CandidatePool,
    repos: &[RepoSpec],
    max_per_length: usize,
    order: SizeOrder,
) -> Result<SelectionOutcome, SelectError> {
    if max_per_length == 0 {
        return Err(SelectError::ZeroTarget);
    }

    let repos_order: Vec<String> = repos.iter().map(|r| r.name.clone()).collect();
    let rank: HashMap<String, usize> = repos_order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();

    let size_order = ordered_lengths(pool, order);
    let available = availability(pool);

    let mut queues = build_queues(pool);
    let mut state = SelectionState::default();
    let mut picks: Vec<SelectedCycle> = Vec::new();

    for &length in &size_order {
        let Some(by_repo) = queues.get_mut(&length) else {
            continue;
        };
        let got = fill_bucket(
            by_repo,
            max_per_length,
            length,
            &repos_order,
            &rank,
            &mut state,
        );
        for (repo, cycle_id) in got {
            picks.push(SelectedCycle {
                length,
                repo,
                cycle_id,
            });
        }
    }

    let target = picks.len();
    Ok(outcome_from(
        picks,
        BTreeMap::new(),
        available,
        0,
        target,
    ))
}
