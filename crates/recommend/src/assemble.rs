use std::collections::BTreeMap;
use std::time::Instant;

use matcher::RankedNeighbor;
use signature::{ItemId, UserId};
use tracing::{debug, info, warn};

use crate::ratings::RatingTable;
use crate::types::{RecommendError, RecommendSource, Recommendation};

/// Candidate items split by which of the two nearest neighbors rated them,
/// with everything `user` has already rated removed. Each list is sorted by
/// score descending, then item id ascending.
struct Pools {
    shared: Vec<(ItemId, f32)>,
    primary: Vec<(ItemId, f32)>,
    secondary: Vec<(ItemId, f32)>,
}

impl Pools {
    fn collect(user: UserId, neighbors: &[RankedNeighbor], ratings: &RatingTable) -> Self {
        let empty = BTreeMap::new();
        let lookup = |neighbor: UserId| {
            ratings.ratings_of(neighbor).unwrap_or_else(|| {
                warn!(user, neighbor, "neighbor_without_ratings");
                &empty
            })
        };
        let unseen = |item: ItemId| !ratings.has_rated(user, item);

        let first = lookup(neighbors[0].user);
        let second = neighbors.get(1).map(|n| lookup(n.user));

        let mut shared = Vec::new();
        let mut primary = Vec::new();
        for (item, &rating) in first.iter().filter(|(item, _)| unseen(**item)) {
            match second.and_then(|s| s.get(item)) {
                Some(&other) => shared.push((*item, (rating + other) / 2.0)),
                None => primary.push((*item, rating)),
            }
        }
        let mut secondary: Vec<(ItemId, f32)> = second
            .into_iter()
            .flatten()
            .filter(|(item, _)| unseen(**item) && !first.contains_key(*item))
            .map(|(item, rating)| (*item, *rating))
            .collect();

        for pool in [&mut shared, &mut primary, &mut secondary] {
            pool.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }
        Self {
            shared,
            primary,
            secondary,
        }
    }
}

fn to_recommendation(
    (item, score): (ItemId, f32),
    source: RecommendSource,
    ratings: &RatingTable,
) -> Recommendation {
    Recommendation {
        item,
        title: ratings.title(item).map(str::to_owned),
        score,
        source,
    }
}

fn check_inputs(
    user: UserId,
    neighbors: &[RankedNeighbor],
    top_k: usize,
) -> Result<(), RecommendError> {
    if top_k == 0 {
        return Err(RecommendError::InvalidTopK);
    }
    if neighbors.is_empty() {
        return Err(RecommendError::NoNeighbors { user });
    }
    Ok(())
}

/// Items both nearest neighbors rated and `user` has not, scored by their
/// mean rating. When the neighbors share no such item, the most similar
/// neighbor's own unseen items are suggested instead.
pub fn recommend_items(
    user: UserId,
    neighbors: &[RankedNeighbor],
    ratings: &RatingTable,
    top_k: usize,
) -> Result<Vec<Recommendation>, RecommendError> {
    check_inputs(user, neighbors, top_k)?;
    let pools = Pools::collect(user, neighbors, ratings);

    let picked: Vec<Recommendation> = if pools.shared.is_empty() {
        debug!(user, "no shared items; falling back to primary neighbor");
        pools
            .primary
            .into_iter()
            .take(top_k)
            .map(|entry| to_recommendation(entry, RecommendSource::Primary, ratings))
            .collect()
    } else {
        pools
            .shared
            .into_iter()
            .take(top_k)
            .map(|entry| to_recommendation(entry, RecommendSource::Shared, ratings))
            .collect()
    };
    Ok(picked)
}

/// Build the final suggestion list for `user`.
///
/// Shared items come first, best mean rating first. If they do not fill
/// `top_k`, the list continues with the primary neighbor's best remaining
/// item, then the secondary neighbor's best, then the primary neighbor's
/// next best until `top_k` is reached; once the primary runs out the
/// secondary's remaining items are used. The list is shorter than `top_k`
/// when both neighbors run out of unseen items.
///
/// The result is not re-sorted, so items endorsed by both neighbors stay
/// ahead of single-neighbor picks even with a lower score.
pub fn final_recommendation(
    user: UserId,
    neighbors: &[RankedNeighbor],
    ratings: &RatingTable,
    top_k: usize,
) -> Result<Vec<Recommendation>, RecommendError> {
    check_inputs(user, neighbors, top_k)?;
    let start = Instant::now();
    let pools = Pools::collect(user, neighbors, ratings);

    let mut out: Vec<Recommendation> = pools
        .shared
        .into_iter()
        .take(top_k)
        .map(|entry| to_recommendation(entry, RecommendSource::Shared, ratings))
        .collect();
    let shared = out.len();

    let mut primary = pools.primary.into_iter();
    let mut secondary = pools.secondary.into_iter();
    if out.len() < top_k {
        if let Some(entry) = primary.next() {
            out.push(to_recommendation(entry, RecommendSource::Primary, ratings));
        }
    }
    if out.len() < top_k {
        if let Some(entry) = secondary.next() {
            out.push(to_recommendation(entry, RecommendSource::Secondary, ratings));
        }
    }
    let rest = primary
        .map(|entry| (entry, RecommendSource::Primary))
        .chain(secondary.map(|entry| (entry, RecommendSource::Secondary)));
    for (entry, source) in rest {
        if out.len() >= top_k {
            break;
        }
        out.push(to_recommendation(entry, source, ratings));
    }

    info!(
        user,
        neighbors = neighbors.len(),
        shared,
        recommended = out.len(),
        top_k,
        elapsed_micros = start.elapsed().as_micros(),
        "recommendation_assembled"
    );
    Ok(out)
}
