//! In-memory rating table: who rated what, how highly, and item titles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use signature::{ItemId, ItemSets, UserId};

use crate::types::RecommendError;

/// Ratings keyed by user then item, plus optional item titles.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingTable {
    ratings: BTreeMap<UserId, BTreeMap<ItemId, f32>>,
    #[serde(default)]
    titles: BTreeMap<ItemId, String>,
}

impl RatingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(user, item, rating)` rows. Later rows for the
    /// same `(user, item)` overwrite earlier ones.
    pub fn from_rows<I>(rows: I) -> Result<Self, RecommendError>
    where
        I: IntoIterator<Item = (UserId, ItemId, f32)>,
    {
        let mut table = Self::new();
        for (user, item, rating) in rows {
            table.insert(user, item, rating)?;
        }
        Ok(table)
    }

    /// Record a rating, returning the previous one if any.
    pub fn insert(
        &mut self,
        user: UserId,
        item: ItemId,
        rating: f32,
    ) -> Result<Option<f32>, RecommendError> {
        if !rating.is_finite() {
            return Err(RecommendError::InvalidRating { user, item, rating });
        }
        Ok(self.ratings.entry(user).or_default().insert(item, rating))
    }

    pub fn set_title(&mut self, item: ItemId, title: impl Into<String>) {
        self.titles.insert(item, title.into());
    }

    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, S)>,
        S: Into<String>,
    {
        for (item, title) in titles {
            self.set_title(item, title);
        }
        self
    }

    pub fn title(&self, item: ItemId) -> Option<&str> {
        self.titles.get(&item).map(String::as_str)
    }

    pub fn rating(&self, user: UserId, item: ItemId) -> Option<f32> {
        self.ratings.get(&user).and_then(|r| r.get(&item).copied())
    }

    /// All ratings of `user`, ordered by item id.
    pub fn ratings_of(&self, user: UserId) -> Option<&BTreeMap<ItemId, f32>> {
        self.ratings.get(&user)
    }

    pub fn has_rated(&self, user: UserId, item: ItemId) -> bool {
        self.rating(user, item).is_some()
    }

    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.ratings.keys().copied()
    }

    pub fn num_users(&self) -> usize {
        self.ratings.len()
    }

    pub fn num_ratings(&self) -> usize {
        self.ratings.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// The set of rated items of every user, ready for signature building.
    pub fn item_sets(&self) -> ItemSets {
        self.ratings
            .iter()
            .map(|(&user, items)| (user, items.keys().copied().collect::<BTreeSet<_>>()))
            .collect()
    }
}
