//! Candidate lookup and neighbor ranking.

use std::collections::BTreeSet;

use index::BucketTable;
use signature::{SignatureMap, UserId};
use tracing::warn;

use crate::types::{MatchError, RankedNeighbor};

/// Every user sharing at least one bucket with `user`, excluding `user`.
///
/// Returns an empty set if `user` is not in the table.
pub fn find_candidates(user: UserId, table: &BucketTable) -> BTreeSet<UserId> {
    let mut candidates = BTreeSet::new();
    let Some(buckets) = table.assignments(user) else {
        return candidates;
    };
    for (band, &bucket) in buckets.iter().enumerate() {
        candidates.extend(table.bucket_members(band, bucket).iter().copied());
    }
    candidates.remove(&user);
    candidates
}

/// Score `candidates` against `user` and keep the best `top_n`.
///
/// Ordering is by similarity descending, then by user id ascending, so the
/// result is identical across calls on the same inputs.
pub fn rank_candidates(
    user: UserId,
    candidates: &BTreeSet<UserId>,
    signatures: &SignatureMap,
    top_n: usize,
) -> Result<Vec<RankedNeighbor>, MatchError> {
    let query = signatures
        .get(&user)
        .ok_or(MatchError::UnknownUser { user })?;

    let mut ranked: Vec<RankedNeighbor> = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        if candidate == user {
            continue;
        }
        match signatures.get(&candidate) {
            Some(sig) => ranked.push(RankedNeighbor {
                user: candidate,
                similarity: query.similarity(sig),
            }),
            None => warn!(user, candidate, "candidate_without_signature"),
        }
    }

    ranked.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.user.cmp(&b.user))
    });
    ranked.truncate(top_n);
    Ok(ranked)
}

/// Candidate lookup followed by ranking, without any parameter adjustment.
pub fn find_neighbors(
    user: UserId,
    table: &BucketTable,
    signatures: &SignatureMap,
    top_n: usize,
) -> Result<Vec<RankedNeighbor>, MatchError> {
    let candidates = find_candidates(user, table);
    rank_candidates(user, &candidates, signatures, top_n)
}
