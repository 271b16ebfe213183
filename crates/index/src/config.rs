//! LSH parameters, bucket-table configuration and index errors.

use serde::{Deserialize, Serialize};
use signature::UserId;
use thiserror::Error;

/// Banding parameters of one bucket table.
///
/// Invariant: `bands * rows_per_band` equals the signature length of every
/// user the table is built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LshParameters {
    /// Number of bands each signature is split into.
    ///
    /// More bands (with fewer rows) raise recall and false positives.
    pub bands: usize,
    /// Number of consecutive signature values per band.
    ///
    /// More rows per band raise precision and false negatives.
    pub rows_per_band: usize,
    /// Number of buckets per band.
    pub num_buckets: u64,
}

impl LshParameters {
    pub fn new(bands: usize, rows_per_band: usize, num_buckets: u64) -> Self {
        Self {
            bands,
            rows_per_band,
            num_buckets,
        }
    }

    /// Derive `rows_per_band` from a signature length and band count.
    pub fn for_signature_len(
        signature_len: usize,
        bands: usize,
        num_buckets: u64,
    ) -> Result<Self, IndexError> {
        if bands == 0 || signature_len % bands != 0 {
            return Err(IndexError::IndivisibleLength {
                signature_len,
                bands,
            });
        }
        let params = Self::new(bands, signature_len / bands, num_buckets);
        params.validate()?;
        Ok(params)
    }

    /// Check every field is non-zero and return the signature length the
    /// parameters expect.
    pub fn validate(&self) -> Result<usize, IndexError> {
        let invalid = || IndexError::InvalidParameters {
            bands: self.bands,
            rows_per_band: self.rows_per_band,
            num_buckets: self.num_buckets,
        };
        if self.bands == 0 || self.rows_per_band == 0 || self.num_buckets == 0 {
            return Err(invalid());
        }
        self.bands.checked_mul(self.rows_per_band).ok_or_else(invalid)
    }

    /// `bands * rows_per_band`, saturating on overflow.
    pub fn signature_len(&self) -> usize {
        self.bands.saturating_mul(self.rows_per_band)
    }

    /// Approximate probability that two users with Jaccard similarity `s`
    /// collide in at least one band: `1 - (1 - s^r)^b`.
    pub fn collision_probability(&self, s: f64) -> f64 {
        let s = s.clamp(0.0, 1.0);
        1.0 - (1.0 - s.powi(self.rows_per_band as i32)).powi(self.bands as i32)
    }
}

impl Default for LshParameters {
    fn default() -> Self {
        Self {
            bands: 20,
            rows_per_band: 5,
            num_buckets: 1_000,
        }
    }
}

/// How one band's values are mapped to a bucket id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BandHasher {
    /// Sum of the character codes of the `_`-joined decimal values.
    ///
    /// Cheap and order-insensitive within a value's digits, so distinct
    /// bands collide more often than under [`BandHasher::Xxh3`].
    #[default]
    CharSum,
    /// xxh3 over the little-endian bytes of the band.
    Xxh3 { seed: u64 },
}

/// Configuration for building a [`crate::BucketTable`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexConfig {
    /// Bucket hashing scheme for band values.
    pub band_hasher: BandHasher,
    /// Build bands in parallel via rayon.
    pub use_parallel: bool,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_band_hasher(mut self, band_hasher: BandHasher) -> Self {
        self.band_hasher = band_hasher;
        self
    }

    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            band_hasher: BandHasher::CharSum,
            use_parallel: false,
        }
    }
}

/// Errors raised while building bucket tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error(
        "invalid lsh parameters: bands={bands} rows_per_band={rows_per_band} num_buckets={num_buckets}"
    )]
    InvalidParameters {
        bands: usize,
        rows_per_band: usize,
        num_buckets: u64,
    },

    #[error("signature length {signature_len} is not divisible into {bands} bands")]
    IndivisibleLength { signature_len: usize, bands: usize },

    #[error("signature of user {user} has length {actual}; bands * rows_per_band = {expected}")]
    SignatureLengthMismatch {
        user: UserId,
        expected: usize,
        actual: usize,
    },
}
