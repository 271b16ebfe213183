//! # simrec Recommend
//!
//! Turns ranked neighbors into item suggestions. A [`RatingTable`] holds who
//! rated what; [`recommend_items`] and [`final_recommendation`] pick items
//! the query user has not rated yet from the ratings of the two nearest
//! neighbors.
//!
//! Items both neighbors rated are scored by the mean of their two ratings
//! and always come first. Items only one neighbor rated keep that
//! neighbor's rating as the score.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::RankedNeighbor;
//! use recommend::{final_recommendation, RatingTable, RecommendSource};
//!
//! let ratings = RatingTable::from_rows(vec![
//!     (1, 100, 5.0),
//!     (2, 100, 4.0), (2, 200, 4.0), (2, 300, 2.0),
//!     (3, 100, 3.0), (3, 200, 5.0), (3, 400, 1.0),
//! ])
//! .unwrap()
//! .with_titles(vec![(200, "Alien (1979)")]);
//!
//! let neighbors = [
//!     RankedNeighbor { user: 2, similarity: 0.8 },
//!     RankedNeighbor { user: 3, similarity: 0.6 },
//! ];
//! let recs = final_recommendation(1, &neighbors, &ratings, 3).unwrap();
//!
//! assert_eq!(recs[0].item, 200);
//! assert_eq!(recs[0].score, 4.5);
//! assert_eq!(recs[0].source, RecommendSource::Shared);
//! assert_eq!(recs[0].title.as_deref(), Some("Alien (1979)"));
//! assert_eq!(recs.len(), 3);
//! ```

mod assemble;
mod ratings;
mod types;

pub use crate::assemble::{final_recommendation, recommend_items};
pub use crate::ratings::RatingTable;
pub use crate::types::{RecommendConfig, RecommendError, RecommendSource, Recommendation};
