//! Configuration and error types for simrec signature construction.
//!
//! This module defines the public configuration surface for the MinHash
//! layer. It is free of any I/O or environment-dependent behavior so that
//! signature construction is a pure function of `(item_sets, config)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::HashFamily;
use crate::types::UserId;

/// Default hash modulus: a large prime well above typical item-id ranges.
pub const DEFAULT_MODULUS: u64 = 9_999_991;

/// What to do with a user whose item set is empty.
///
/// An empty set has no minimum, so its signature would stay at +infinity in
/// every slot. Such a signature agrees with every other empty signature and
/// with nothing else, which is rarely what a caller wants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptySetPolicy {
    /// Fail the whole build with [`SignatureError::EmptyItemSet`].
    #[default]
    Reject,
    /// Give the user the canonical empty signature (every slot
    /// [`crate::EMPTY_SLOT`]).
    Sentinel,
}

/// Configuration for MinHash signature construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureConfig {
    /// Configuration schema version.
    ///
    /// Any algorithmic change that can affect signatures must bump this
    /// version.
    pub version: u32,
    /// Number of hash functions, i.e. the signature length H.
    ///
    /// Larger values tighten the Jaccard estimate at linear cost.
    pub num_hashes: usize,
    /// Hash family applied to every item id.
    pub hash_family: HashFamily,
    /// Modulus `p` for the modular hash families.
    ///
    /// `p` should be a prime larger than the item-id space. A smaller modulus
    /// folds distinct items onto the same residue and raises the collision
    /// probability; see [`crate::modulus_for_item_count`] for the
    /// distinct-count sized alternative.
    pub modulus: u64,
    /// Seed for coefficient generation.
    ///
    /// Two builds with the same seed and configuration produce identical
    /// signatures for identical item sets.
    pub seed: u64,
    /// Compute user signatures in parallel via rayon.
    pub use_parallel: bool,
    /// Handling of users with no items.
    pub empty_set_policy: EmptySetPolicy,
}

impl SignatureConfig {
    /// Create a new configuration with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature length. Typical values: 50-256.
    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Set the hash family.
    pub fn with_hash_family(mut self, family: HashFamily) -> Self {
        self.hash_family = family;
        self
    }

    /// Set the hash modulus.
    pub fn with_modulus(mut self, modulus: u64) -> Self {
        self.modulus = modulus;
        self
    }

    /// Set the coefficient seed for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Choose how empty item sets are handled.
    pub fn with_empty_set_policy(mut self, policy: EmptySetPolicy) -> Self {
        self.empty_set_policy = policy;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.version < 1 {
            return Err(SignatureError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.num_hashes < 1 {
            return Err(SignatureError::InvalidNumHashes {
                num_hashes: self.num_hashes,
            });
        }
        if self.modulus < 2 {
            return Err(SignatureError::InvalidModulus {
                modulus: self.modulus,
            });
        }
        Ok(())
    }
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            version: 1,
            num_hashes: 100,
            hash_family: HashFamily::Simple,
            modulus: DEFAULT_MODULUS,
            seed: 0xF00D_BAAD_F00D_BAAD,
            use_parallel: false,
            empty_set_policy: EmptySetPolicy::Reject,
        }
    }
}

/// Errors returned by signature construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid config: num_hashes must be >= 1 (got {num_hashes})")]
    InvalidNumHashes { num_hashes: usize },

    #[error("invalid config: modulus must be >= 2 (got {modulus})")]
    InvalidModulus { modulus: u64 },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("no users to sign")]
    NoUsers,

    #[error("user {user} has an empty item set")]
    EmptyItemSet { user: UserId },
}
