//! # simrec Index
//!
//! Locality-sensitive bucketing of MinHash signatures. Each signature is cut
//! into `bands` contiguous slices of `rows_per_band` values and every slice is
//! hashed into one of `num_buckets` buckets of its band.
//!
//! Two users land in the same bucket of a band only when they agree on all
//! rows of that band (modulo bucket-hash collisions), and they become
//! similarity candidates when they share a bucket in *any* band. Raising the
//! band count (with fewer rows each) trades precision for recall; see
//! [`LshParameters::collision_probability`].
//!
//! ## Example Usage
//!
//! ```
//! use index::{BucketTable, IndexConfig, LshParameters};
//! use signature::{build_signatures, collect_item_sets, SignatureConfig};
//!
//! let sets = collect_item_sets(vec![(1, 10), (1, 11), (2, 10), (2, 11), (3, 99)]);
//! let sigs = build_signatures(&sets, &SignatureConfig::new().with_num_hashes(12)).unwrap();
//!
//! let params = LshParameters::new(4, 3, 64);
//! let table = BucketTable::build(&sigs, params, &IndexConfig::default()).unwrap();
//!
//! // Identical item sets share every bucket.
//! assert_eq!(table.assignments(1), table.assignments(2));
//! ```

mod band;
mod config;
mod table;

pub use crate::band::{band_bucket, char_sum, BucketId};
pub use crate::config::{BandHasher, IndexConfig, IndexError, LshParameters};
pub use crate::table::{BandBuckets, BucketTable};
