//! # simrec Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers "who is most similar to this user?" on top of the
//! signature map from `signature` and the bucket table from `index`. It
//! collects every user sharing a bucket with the query user, scores those
//! candidates by signature agreement and returns the best `top_n`.
//!
//! When the current LSH parameters leave a user without any candidate,
//! [`AdaptiveSearch`] walks to new parameters through a [`ParameterAdjuster`]
//! (by default [`DivisorAdjuster`]), rebuilds the table and tries again, up
//! to a configurable retry bound and optional timeout.
//!
//! ## Core Types
//!
//! - [`SearchConfig`]: `top_n`, `max_retries` and `timeout_ms`.
//! - [`RankedNeighbor`]: a candidate and its similarity in `[0, 1]`.
//! - [`NeighborSearch`]: ranked neighbors plus the parameters they were
//!   found with and the rebuilt table, if any.
//! - [`MatchError`]: unknown users, invalid config, retry exhaustion,
//!   timeouts and index failures. [`MatchError::is_unsatisfiable`] separates
//!   "no neighbor exists" from real failures.
//!
//! ## Example Usage
//!
//! ```
//! use index::{BucketTable, IndexConfig, LshParameters};
//! use matcher::{AdaptiveSearch, SearchConfig};
//! use signature::{build_signatures, collect_item_sets, SignatureConfig};
//!
//! let sets = collect_item_sets(vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3), (3, 50)]);
//! let sigs = build_signatures(&sets, &SignatureConfig::new().with_num_hashes(12)).unwrap();
//! let table = BucketTable::build(&sigs, LshParameters::new(1, 12, 97), &IndexConfig::default())
//!     .unwrap();
//!
//! let outcome = AdaptiveSearch::new(&sigs, SearchConfig::default())
//!     .search(1, &table)
//!     .unwrap();
//! assert_eq!(outcome.neighbors[0].user, 2);
//! assert_eq!(outcome.neighbors[0].similarity, 1.0);
//! ```

pub mod adjust;
pub mod controller;
pub mod neighbors;
pub mod types;

pub use crate::adjust::{divisors, DivisorAdjuster, ParameterAdjuster};
pub use crate::controller::{AdaptiveSearch, NeighborSearch};
pub use crate::neighbors::{find_candidates, find_neighbors, rank_candidates};
pub use crate::types::{MatchError, RankedNeighbor, SearchConfig};
