//! Input and signature types shared by every simrec stage.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier of a user whose item set is being sketched.
pub type UserId = u64;

/// Identifier of an item (e.g. a movie) a user interacted with.
pub type ItemId = u64;

/// Per-user item sets; the immutable input of a run.
pub type ItemSets = BTreeMap<UserId, BTreeSet<ItemId>>;

/// Signatures keyed by user, ordered by user id.
pub type SignatureMap = BTreeMap<UserId, Signature>;

/// Value of a signature slot that never saw an item (+infinity).
pub const EMPTY_SLOT: u64 = u64::MAX;

/// Fixed-length MinHash signature of one user's item set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Signature(Vec<u64>);

impl Signature {
    /// A signature of `len` slots, all at [`EMPTY_SLOT`].
    pub fn empty(len: usize) -> Self {
        Self(vec![EMPTY_SLOT; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }

    /// True when no slot was ever reduced, i.e. the item set was empty.
    pub fn is_sentinel(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|&v| v == EMPTY_SLOT)
    }

    /// Fraction of positions where both signatures hold the same value.
    ///
    /// Returns 0.0 for signatures of different or zero length.
    pub fn similarity(&self, other: &Signature) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let agree = self
            .0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| a == b)
            .count();
        agree as f32 / self.0.len() as f32
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.0
    }
}

impl From<Vec<u64>> for Signature {
    fn from(values: Vec<u64>) -> Self {
        Self(values)
    }
}

impl AsRef<[u64]> for Signature {
    fn as_ref(&self) -> &[u64] {
        &self.0
    }
}

/// Group `(user, item)` interaction pairs into per-user item sets.
///
/// Repeated pairs collapse into one set member.
pub fn collect_item_sets<I>(pairs: I) -> ItemSets
where
    I: IntoIterator<Item = (UserId, ItemId)>,
{
    let mut sets = ItemSets::new();
    for (user, item) in pairs {
        sets.entry(user).or_default().insert(item);
    }
    sets
}

/// Exact Jaccard similarity `|a ∩ b| / |a ∪ b|`; 0.0 when both are empty.
pub fn jaccard(a: &BTreeSet<ItemId>, b: &BTreeSet<ItemId>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}
