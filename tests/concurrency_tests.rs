//! Concurrency and thread safety tests for simrec

use std::sync::Arc;
use std::thread;

use simrec::{ItemSets, RatingTable, SimilarityPipeline, SimrecConfig, UserId};

fn clustered_ratings(users: u64) -> RatingTable {
    let mut rng = fastrand::Rng::with_seed(99);
    let mut ratings = RatingTable::new();
    for user in 0..users {
        let base = (user % 4) * 100;
        for _ in 0..25 {
            let item = base + rng.u64(0..40);
            let rating = rng.u8(1..=10) as f32 / 2.0;
            ratings.insert(user, item, rating).expect("finite rating");
        }
    }
    ratings
}

fn shared_pipeline(sets: &ItemSets) -> Arc<SimilarityPipeline> {
    let config = SimrecConfig::with_banding(60, 30).expect("30 divides 60");
    Arc::new(SimilarityPipeline::build(sets, &config).expect("pipeline builds"))
}

#[test]
fn concurrent_queries_match_sequential_results() {
    let ratings = clustered_ratings(64);
    let pipeline = shared_pipeline(&ratings.item_sets());

    let expected: Vec<_> = (0..64u64)
        .map(|user| pipeline.neighbors_for(user).map(|o| o.neighbors))
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            thread::spawn(move || {
                (0..64u64)
                    .map(|user| pipeline.neighbors_for(user).map(|o| o.neighbors))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let results = handle.join().unwrap();
        assert_eq!(results, expected, "thread {i} saw different rankings");
    }
}

#[test]
fn batch_queries_match_single_queries() {
    let ratings = clustered_ratings(48);
    let pipeline = shared_pipeline(&ratings.item_sets());
    let users: Vec<UserId> = (0..48).collect();

    let batch = pipeline.neighbors_for_many(&users);
    assert_eq!(batch.len(), users.len());
    for (user, result) in batch {
        let single = pipeline.neighbors_for(user);
        assert_eq!(
            result.map(|o| o.neighbors),
            single.map(|o| o.neighbors),
            "user {user}"
        );
    }
}

#[test]
fn concurrent_recommendations_share_one_rating_table() {
    let ratings = Arc::new(clustered_ratings(32));
    let pipeline = shared_pipeline(&ratings.item_sets());

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let pipeline = Arc::clone(&pipeline);
            let ratings = Arc::clone(&ratings);
            thread::spawn(move || {
                let user = t * 8;
                let recs = pipeline.recommend_for(user, &ratings);
                (user, recs)
            })
        })
        .collect();

    for handle in handles {
        let (user, recs) = handle.join().unwrap();
        match recs {
            Ok(recs) => {
                assert!(recs.len() <= pipeline.config().recommend.top_k);
                assert!(recs.iter().all(|r| !ratings.has_rated(user, r.item)));
                assert_eq!(recs, pipeline.recommend_for(user, &ratings).unwrap());
            }
            Err(err) => assert!(err.is_unsatisfiable(), "user {user}: {err}"),
        }
    }
}

#[test]
fn parallel_builds_from_many_threads_agree() {
    let ratings = clustered_ratings(40);
    let sets = Arc::new(ratings.item_sets());
    let mut config = SimrecConfig::with_banding(60, 30).unwrap();
    config.signature.use_parallel = true;
    config.lsh.use_parallel = true;
    let config = Arc::new(config);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sets = Arc::clone(&sets);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                SimilarityPipeline::build(&sets, &config)
                    .expect("build succeeds")
                    .signatures()
                    .clone()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (i, sigs) in results.iter().enumerate().skip(1) {
        assert_eq!(&results[0], sigs, "thread {i} built different signatures");
    }
}
