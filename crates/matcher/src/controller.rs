use std::collections::BTreeSet;
use std::time::Instant;

use index::{BucketTable, LshParameters};
use signature::{SignatureMap, UserId};
use tracing::{info, span, warn, Level};

use crate::adjust::{DivisorAdjuster, ParameterAdjuster};
use crate::neighbors::{find_candidates, rank_candidates};
use crate::types::{MatchError, RankedNeighbor, SearchConfig};


/// Outcome of an [`AdaptiveSearch`].
#[derive(Debug, Clone)]
pub struct NeighborSearch {
    pub user: UserId,
    /// Ranked neighbors, best first, at most `top_n` long.
    pub neighbors: Vec<RankedNeighbor>,
    /// Parameters of the table the candidates were found in.
    pub params: LshParameters,
    /// Number of parameter adjustments (table rebuilds) performed.
    pub retries: u32,
    /// The last rebuilt table, if any rebuild happened. Callers that want
    /// later searches to start from the adjusted parameters can adopt it.
    pub rebuilt: Option<BucketTable>,
}

enum SearchState {
    Searching {
        params: LshParameters,
        attempt: u32,
    },
    Found {
        params: LshParameters,
        attempt: u32,
        candidates: BTreeSet<UserId>,
    },
}

/// Neighbor search that reconfigures the LSH parameters and rebuilds the
/// bucket table whenever the query user has no candidates.
///
/// The loop is bounded by [`SearchConfig::max_retries`] and, when set,
/// [`SearchConfig::timeout_ms`]. The caller's table is never mutated; rebuilt
/// tables are owned by the search and handed back in [`NeighborSearch`].
pub struct AdaptiveSearch<'a, A = DivisorAdjuster> {
    signatures: &'a SignatureMap,
    config: SearchConfig,
    adjuster: A,
}

impl<'a> AdaptiveSearch<'a> {
    pub fn new(signatures: &'a SignatureMap, config: SearchConfig) -> Self {
        Self {
            signatures,
            config,
            adjuster: DivisorAdjuster,
        }
    }
}

impl<'a, A: ParameterAdjuster> AdaptiveSearch<'a, A> {
    /// Swap the adjustment strategy.
    pub fn with_adjuster<B: ParameterAdjuster>(self, adjuster: B) -> AdaptiveSearch<'a, B> {
        AdaptiveSearch {
            signatures: self.signatures,
            config: self.config,
            adjuster,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find the top neighbors of `user`, starting from `table`.
    pub fn search(&self, user: UserId, table: &BucketTable) -> Result<NeighborSearch, MatchError> {
        self.config.validate()?;
        let signature_len = self
            .signatures
            .get(&user)
            .map(|sig| sig.len())
            .ok_or(MatchError::UnknownUser { user })?;

        let span = span!(Level::INFO, "neighbor.search", user);
        let _guard = span.enter();
        let start = Instant::now();
        let deadline = self.config.timeout();

        let mut rebuilt: Option<BucketTable> = None;
        let mut state = SearchState::Searching {
            params: *table.params(),
            attempt: 0,
        };

        loop {
            state = match state {
                SearchState::Searching { params, attempt } => {
                    let active = rebuilt.as_ref().unwrap_or(table);
                    let candidates = find_candidates(user, active);
                    if !candidates.is_empty() {
                        SearchState::Found {
                            params,
                            attempt,
                            candidates,
                        }
                    } else {
                        // A lone user can never collide with anyone.
                        if self.signatures.len() < 2 || attempt >= self.config.max_retries {
                            warn!(
                                user,
                                attempts = attempt,
                                users = self.signatures.len(),
                                "neighbor_search_exhausted"
                            );
                            return Err(MatchError::NoCandidatesExhausted {
                                user,
                                attempts: attempt,
                            });
                        }
                        if deadline.is_some_and(|limit| start.elapsed() >= limit) {
                            warn!(
                                user,
                                attempts = attempt,
                                elapsed_micros = start.elapsed().as_micros(),
                                "neighbor_search_timed_out"
                            );
                            return Err(MatchError::SearchTimedOut {
                                user,
                                attempts: attempt,
                            });
                        }

                        let next = self.adjuster.adjust(&params, signature_len);
                        warn!(
                            user,
                            attempt = attempt + 1,
                            from_bands = params.bands,
                            from_rows = params.rows_per_band,
                            from_buckets = params.num_buckets,
                            to_bands = next.bands,
                            to_rows = next.rows_per_band,
                            to_buckets = next.num_buckets,
                            "no candidates; adjusting lsh parameters"
                        );
                        rebuilt = Some(active.rebuild(self.signatures, next)?);
                        SearchState::Searching {
                            params: next,
                            attempt: attempt + 1,
                        }
                    }
                }
                SearchState::Found {
                    params,
                    attempt,
                    candidates,
                } => {
                    let neighbors =
                        rank_candidates(user, &candidates, self.signatures, self.config.top_n)?;
                    info!(
                        user,
                        candidates = candidates.len(),
                        neighbors = neighbors.len(),
                        retries = attempt,
                        bands = params.bands,
                        elapsed_micros = start.elapsed().as_micros(),
                        "neighbor_search_success"
                    );
                    return Ok(NeighborSearch {
                        user,
                        neighbors,
                        params,
                        retries: attempt,
                        rebuilt,
                    });
                }
            };
        }
    }
}
