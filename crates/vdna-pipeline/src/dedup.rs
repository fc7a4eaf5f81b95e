//! URL-level deduplication of the selection pool.

use std::collections::HashSet;

use vdna_core::Candidate;

use crate::types::ScoredCandidate;

/// Drop repeated URLs from the raw candidate batch, keeping the first occurrence.
#[must_use]
pub fn dedupe_by_url(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

/// Pool after removing sources that already produced work.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub fresh: Vec<ScoredCandidate>,
    pub duplicates: Vec<ScoredCandidate>,
}

/// Split `pool` into candidates whose URL is not in `processed` and those that are.
#[must_use]
pub fn partition_processed(
    pool: Vec<ScoredCandidate>,
    processed: &HashSet<String>,
) -> DedupOutcome {
    let (duplicates, fresh) = pool
        .into_iter()
        .partition(|c| processed.contains(&c.candidate.url));
    DedupOutcome { fresh, duplicates }
}

/// URLs of the pool, in order, for the batch lookup.
#[must_use]
pub fn pool_urls(pool: &[ScoredCandidate]) -> Vec<String> {
    pool.iter().map(|c| c.candidate.url.clone()).collect()
}
