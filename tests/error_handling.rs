use std::collections::BTreeSet;

use simrec::{
    ConfigLoadError, EMPTY_SLOT, EmptySetPolicy, IndexError, ItemSets, MatchError, PipelineError,
    RatingTable, RecommendError, SignatureError, SimilarityPipeline, SimrecConfig,
    collect_item_sets, final_recommendation,
};

fn base_sets() -> ItemSets {
    collect_item_sets(vec![(1, 10), (1, 11), (2, 10), (2, 11), (3, 50), (3, 51)])
}

fn small_config() -> SimrecConfig {
    SimrecConfig::with_banding(12, 6).expect("6 divides 12")
}

#[test]
fn band_product_mismatch_is_configuration_error() {
    let mut config = small_config();
    config.lsh.bands = 5;
    config.lsh.rows_per_band = 2;

    let result = SimilarityPipeline::build(&base_sets(), &config);
    assert!(matches!(
        result,
        Err(PipelineError::Index(IndexError::SignatureLengthMismatch {
            expected: 10,
            actual: 12,
            ..
        }))
    ));
}

#[test]
fn zero_band_parameters_are_rejected() {
    let mut config = small_config();
    config.lsh.num_buckets = 0;
    let result = SimilarityPipeline::build(&base_sets(), &config);
    assert!(matches!(
        result,
        Err(PipelineError::Index(IndexError::InvalidParameters { .. }))
    ));
}

#[test]
fn empty_item_set_rejected_before_hashing() {
    let mut sets = base_sets();
    sets.insert(4, BTreeSet::new());

    let result = SimilarityPipeline::build(&sets, &small_config());
    assert_eq!(
        result.unwrap_err(),
        PipelineError::Signature(SignatureError::EmptyItemSet { user: 4 })
    );
}

#[test]
fn sentinel_policy_signs_empty_sets() {
    let mut sets = base_sets();
    sets.insert(4, BTreeSet::new());
    sets.insert(5, BTreeSet::new());
    let mut config = small_config();
    config.signature.empty_set_policy = EmptySetPolicy::Sentinel;

    let pipeline = SimilarityPipeline::build(&sets, &config).unwrap();
    let empty = &pipeline.signatures()[&4];
    assert!(empty.is_sentinel());
    assert!(empty.values().iter().all(|&v| v == EMPTY_SLOT));

    // Two empty users only ever match each other.
    let outcome = pipeline.neighbors_for(4).unwrap();
    assert_eq!(outcome.neighbors[0].user, 5);
    assert_eq!(outcome.neighbors[0].similarity, 1.0);
}

#[test]
fn no_users_is_an_error() {
    let result = SimilarityPipeline::build(&ItemSets::new(), &small_config());
    assert_eq!(
        result.unwrap_err(),
        PipelineError::Signature(SignatureError::NoUsers)
    );
}

#[test]
fn zero_hashes_is_an_error() {
    let mut config = small_config();
    config.signature.num_hashes = 0;
    let result = SimilarityPipeline::build(&base_sets(), &config);
    assert!(matches!(
        result,
        Err(PipelineError::Signature(SignatureError::InvalidNumHashes { num_hashes: 0 }))
    ));
}

#[test]
fn unknown_user_search_fails() {
    let pipeline = SimilarityPipeline::build(&base_sets(), &small_config()).unwrap();
    let err = pipeline.neighbors_for(77).unwrap_err();
    assert_eq!(err, PipelineError::Match(MatchError::UnknownUser { user: 77 }));
    assert!(!err.is_unsatisfiable());
}

#[test]
fn lone_user_exhausts_without_looping() {
    let sets = collect_item_sets(vec![(1, 10), (1, 11)]);
    let pipeline = SimilarityPipeline::build(&sets, &small_config()).unwrap();
    let err = pipeline.neighbors_for(1).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Match(MatchError::NoCandidatesExhausted { user: 1, attempts: 0 })
    );
    assert!(err.is_unsatisfiable());
}

#[test]
fn retry_bound_reports_exhaustion() {
    // One item each, never shared: no parameter choice can make them collide
    // except by bucket-hash accident, which a tiny retry budget rules out.
    let sets = collect_item_sets(vec![(1, 10), (2, 20)]);
    let mut config = SimrecConfig::with_banding(12, 1).unwrap();
    config.lsh.band_hasher = simrec::BandHasher::Xxh3 { seed: 1 };
    config.lsh.num_buckets = 1_000_003;
    config.search.max_retries = 2;

    let pipeline = SimilarityPipeline::build(&sets, &config).unwrap();
    match pipeline.neighbors_for(1) {
        Err(PipelineError::Match(MatchError::NoCandidatesExhausted { user, attempts })) => {
            assert_eq!(user, 1);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[test]
fn invalid_search_config_is_reported() {
    let mut config = small_config();
    config.search.top_n = 0;
    let pipeline = SimilarityPipeline::build(&base_sets(), &config).unwrap();
    assert!(matches!(
        pipeline.neighbors_for(1),
        Err(PipelineError::Match(MatchError::InvalidConfig(_)))
    ));
}

#[test]
fn recommending_without_neighbors_fails() {
    let ratings = RatingTable::from_rows(vec![(1, 1, 3.0)]).unwrap();
    assert_eq!(
        final_recommendation(1, &[], &ratings, 5),
        Err(RecommendError::NoNeighbors { user: 1 })
    );
}

#[test]
fn invalid_yaml_is_rejected() {
    let result = SimrecConfig::from_yaml("version: [unclosed");
    assert!(matches!(result, Err(ConfigLoadError::YamlParse(_))));

    let result = SimrecConfig::from_yaml("version: \"1.0\"\nsignature:\n  num_hashes: 0\n");
    assert!(matches!(result, Err(ConfigLoadError::Validation(_))));
}

#[test]
fn errors_render_readable_messages() {
    let err = PipelineError::from(IndexError::SignatureLengthMismatch {
        user: 3,
        expected: 10,
        actual: 12,
    });
    let text = err.to_string();
    assert!(text.starts_with("bucket table construction failed"));
    assert!(text.contains('3'));
}
