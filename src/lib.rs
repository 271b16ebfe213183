//! Workspace umbrella crate for simrec user-similarity search.
//!
//! This crate stitches together MinHash signatures, LSH bucket tables,
//! adaptive neighbor search and recommendation assembly so callers can go
//! from per-user item sets to ranked neighbors and item suggestions through
//! a single [`SimilarityPipeline`].

pub mod config;

pub use config::{ConfigLoadError, LshYamlConfig, SignatureYamlConfig, SimrecConfig};
pub use index::{
    BandBuckets, BandHasher, BucketId, BucketTable, IndexConfig, IndexError, LshParameters,
    band_bucket, char_sum,
};
pub use matcher::{
    AdaptiveSearch, DivisorAdjuster, MatchError, NeighborSearch, ParameterAdjuster,
    RankedNeighbor, SearchConfig, divisors, find_candidates, find_neighbors, rank_candidates,
};
pub use recommend::{
    RatingTable, RecommendConfig, RecommendError, RecommendSource, Recommendation,
    final_recommendation, recommend_items,
};
pub use signature::{
    DEFAULT_MODULUS, EMPTY_SLOT, EmptySetPolicy, HashFamily, HashFunctionSpec, ItemId, ItemSets,
    Signature, SignatureConfig, SignatureError, SignatureMap, UserId, build_signatures,
    collect_item_sets, generate_hash_specs, jaccard, modulus_for_item_count, sign_items,
};

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{Level, debug, info, span};

/// Errors that can occur while running the similarity pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("signature construction failed: {0}")]
    Signature(#[from] SignatureError),
    #[error("bucket table construction failed: {0}")]
    Index(#[from] IndexError),
    #[error("neighbor search failed: {0}")]
    Match(#[from] MatchError),
    #[error("recommendation failed: {0}")]
    Recommend(#[from] RecommendError),
}

impl PipelineError {
    /// True when the pipeline ran correctly but no neighbor could be found.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, PipelineError::Match(err) if err.is_unsatisfiable())
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_signatures(&self, latency: Duration, result: Result<(), SignatureError>);
    fn record_bucket_table(&self, latency: Duration, result: Result<(), IndexError>);
    fn record_search(&self, latency: Duration, result: Result<(), MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_signatures<T>(self, result: &Result<T, SignatureError>) {
        self.recorder
            .record_signatures(self.start.elapsed(), unit(result));
    }

    fn record_bucket_table<T>(self, result: &Result<T, IndexError>) {
        self.recorder
            .record_bucket_table(self.start.elapsed(), unit(result));
    }

    fn record_search<T>(self, result: &Result<T, MatchError>) {
        self.recorder.record_search(self.start.elapsed(), unit(result));
    }
}

fn unit<T, E: Clone>(result: &Result<T, E>) -> Result<(), E> {
    result.as_ref().map(|_| ()).map_err(Clone::clone)
}

/// Signatures and a bucket table built once, queried many times.
///
/// The pipeline is immutable after [`SimilarityPipeline::build`] apart from
/// [`SimilarityPipeline::adopt`], so shared references can be queried from
/// many threads at once.
#[derive(Debug, Clone)]
pub struct SimilarityPipeline {
    config: SimrecConfig,
    signatures: SignatureMap,
    table: BucketTable,
}

impl SimilarityPipeline {
    /// Sign every user in `item_sets` and bucket the signatures.
    pub fn build(item_sets: &ItemSets, config: &SimrecConfig) -> Result<Self, PipelineError> {
        let span = span!(Level::INFO, "pipeline.build", users = item_sets.len());
        let _guard = span.enter();

        let mut signature_cfg = config.signature_config();
        if config.signature.fit_modulus_to_items {
            let distinct: BTreeSet<ItemId> = item_sets.values().flatten().copied().collect();
            signature_cfg.modulus = modulus_for_item_count(distinct.len() as u64);
            debug!(
                distinct_items = distinct.len(),
                modulus = signature_cfg.modulus,
                "modulus_fitted_to_items"
            );
        }

        let metrics = MetricsSpan::start();
        let signatures = build_signatures(item_sets, &signature_cfg);
        if let Some(span) = metrics {
            span.record_signatures(&signatures);
        }
        let signatures = signatures?;

        let metrics = MetricsSpan::start();
        let table = BucketTable::build(
            &signatures,
            config.lsh_parameters(),
            &config.index_config(),
        );
        if let Some(span) = metrics {
            span.record_bucket_table(&table);
        }
        let table = table?;

        info!(
            users = signatures.len(),
            num_hashes = signature_cfg.num_hashes,
            bands = table.params().bands,
            "pipeline_ready"
        );
        Ok(Self {
            config: config.clone(),
            signatures,
            table,
        })
    }

    /// Build from the rated items of every user in `ratings`.
    pub fn from_ratings(ratings: &RatingTable, config: &SimrecConfig) -> Result<Self, PipelineError> {
        Self::build(&ratings.item_sets(), config)
    }

    pub fn config(&self) -> &SimrecConfig {
        &self.config
    }

    pub fn signatures(&self) -> &SignatureMap {
        &self.signatures
    }

    pub fn table(&self) -> &BucketTable {
        &self.table
    }

    /// Adaptive neighbor search for `user` against the current table.
    ///
    /// The pipeline's table is left untouched; any rebuilt table is returned
    /// in the [`NeighborSearch`] for [`SimilarityPipeline::adopt`].
    pub fn neighbors_for(&self, user: UserId) -> Result<NeighborSearch, PipelineError> {
        let metrics = MetricsSpan::start();
        let outcome =
            AdaptiveSearch::new(&self.signatures, self.config.search).search(user, &self.table);
        if let Some(span) = metrics {
            span.record_search(&outcome);
        }
        Ok(outcome?)
    }

    /// [`SimilarityPipeline::neighbors_for`] for many users in parallel.
    pub fn neighbors_for_many(
        &self,
        users: &[UserId],
    ) -> Vec<(UserId, Result<NeighborSearch, PipelineError>)> {
        users
            .par_iter()
            .map(|&user| (user, self.neighbors_for(user)))
            .collect()
    }

    /// Replace the table with the one a search rebuilt, if any, so later
    /// searches start from the adjusted parameters.
    pub fn adopt(&mut self, outcome: &mut NeighborSearch) -> bool {
        match outcome.rebuilt.take() {
            Some(table) => {
                info!(
                    bands = table.params().bands,
                    rows_per_band = table.params().rows_per_band,
                    num_buckets = table.params().num_buckets,
                    "pipeline_adopted_rebuilt_table"
                );
                self.table = table;
                true
            }
            None => false,
        }
    }

    /// Neighbors for `user`, then the final recommendation list from their
    /// ratings.
    pub fn recommend_for(
        &self,
        user: UserId,
        ratings: &RatingTable,
    ) -> Result<Vec<Recommendation>, PipelineError> {
        let outcome = self.neighbors_for(user)?;
        let recs = final_recommendation(
            user,
            &outcome.neighbors,
            ratings,
            self.config.recommend.top_k,
        )?;
        Ok(recs)
    }
}
