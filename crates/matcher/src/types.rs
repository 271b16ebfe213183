use std::time::Duration;

use index::IndexError;
use serde::{Deserialize, Serialize};
use signature::UserId;
use thiserror::Error;

/// A candidate user scored against the query user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankedNeighbor {
    /// The neighbor's id.
    pub user: UserId,
    /// Fraction of signature positions shared with the query user, in [0, 1].
    pub similarity: f32,
}

/// Configuration for neighbor searches.
///
/// `SearchConfig` is cheap to copy and serde-friendly so it can be embedded
/// in higher-level configs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of ranked neighbors to return.
    #[serde(default = "SearchConfig::default_top_n")]
    pub top_n: usize,
    /// Maximum number of parameter adjustments (table rebuilds) before a
    /// search gives up.
    #[serde(default = "SearchConfig::default_max_retries")]
    pub max_retries: u32,
    /// Optional wall-clock budget for one search, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SearchConfig {
    pub(crate) fn default_top_n() -> usize {
        2
    }

    pub(crate) fn default_max_retries() -> u32 {
        16
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.top_n == 0 {
            return Err(MatchError::InvalidConfig(
                "top_n must be greater than zero".into(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(MatchError::InvalidConfig(
                "timeout_ms must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_n: Self::default_top_n(),
            max_retries: Self::default_max_retries(),
            timeout_ms: None,
        }
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid search config: {0}")]
    InvalidConfig(String),

    #[error("user {user} has no signature")]
    UnknownUser { user: UserId },

    #[error("no candidates for user {user} after {attempts} parameter adjustments")]
    NoCandidatesExhausted { user: UserId, attempts: u32 },

    #[error("search for user {user} timed out after {attempts} parameter adjustments")]
    SearchTimedOut { user: UserId, attempts: u32 },

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl MatchError {
    /// True when the search ran correctly but no neighbor can be produced
    /// for the user; callers usually treat this as "no recommendation".
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(
            self,
            MatchError::NoCandidatesExhausted { .. } | MatchError::SearchTimedOut { .. }
        )
    }
}
