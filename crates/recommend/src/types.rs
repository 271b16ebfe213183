use serde::{Deserialize, Serialize};
use signature::{ItemId, UserId};
use thiserror::Error;

/// Where a recommended item came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendSource {
    /// Rated by both of the two nearest neighbors; scored by the mean rating.
    Shared,
    /// Rated by the most similar neighbor only.
    Primary,
    /// Rated by the second most similar neighbor only.
    Secondary,
}

/// One suggested item with its predicted rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub item: ItemId,
    pub title: Option<String>,
    pub score: f32,
    pub source: RecommendSource,
}

/// Configuration for recommendation assembly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendConfig {
    /// Maximum number of items to suggest.
    #[serde(default = "RecommendConfig::default_top_k")]
    pub top_k: usize,
}

impl RecommendConfig {
    pub(crate) fn default_top_k() -> usize {
        5
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if self.top_k == 0 {
            return Err(RecommendError::InvalidTopK);
        }
        Ok(())
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: Self::default_top_k(),
        }
    }
}

/// Errors produced while assembling recommendations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecommendError {
    #[error("no neighbors to recommend from for user {user}")]
    NoNeighbors { user: UserId },

    #[error("top_k must be greater than zero")]
    InvalidTopK,

    #[error("rating {rating} of item {item} by user {user} is not a finite number")]
    InvalidRating {
        user: UserId,
        item: ItemId,
        rating: f32,
    },
}
