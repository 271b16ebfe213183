use simrec::{
    BucketTable, HashFamily, ItemSets, SignatureConfig, SimilarityPipeline, SimrecConfig,
    build_signatures, collect_item_sets,
};

fn synthetic_sets(users: u64) -> ItemSets {
    let mut rng = fastrand::Rng::with_seed(11);
    let mut pairs = Vec::new();
    for user in 0..users {
        let base = (user % 5) * 40;
        for _ in 0..30 {
            pairs.push((user, base + rng.u64(0..60)));
        }
    }
    collect_item_sets(pairs)
}

fn config_for(family: HashFamily) -> SimrecConfig {
    let mut config = SimrecConfig::with_banding(40, 20).expect("20 divides 40");
    config.signature.hash_family = family;
    config
}

#[test]
fn equal_item_sets_get_equal_signatures_for_every_family() {
    let mut sets = synthetic_sets(10);
    let copy = sets[&3].clone();
    sets.insert(100, copy);

    for family in [
        HashFamily::Simple,
        HashFamily::Polynomial,
        HashFamily::Multiplicative,
        HashFamily::Xor,
    ] {
        let cfg = SignatureConfig::new()
            .with_num_hashes(64)
            .with_hash_family(family);
        let sigs = build_signatures(&sets, &cfg).expect("signatures");
        assert_eq!(sigs[&3], sigs[&100], "{family:?} disagrees on equal sets");
    }
}

#[test]
fn repeated_builds_are_identical() {
    let sets = synthetic_sets(50);
    let config = config_for(HashFamily::Polynomial);

    let first = SimilarityPipeline::build(&sets, &config).expect("first build");
    let second = SimilarityPipeline::build(&sets, &config).expect("second build");

    assert_eq!(first.signatures(), second.signatures());
    assert_eq!(first.table().bands(), second.table().bands());
    for user in 0..50 {
        let a = first.neighbors_for(user).map(|o| o.neighbors);
        let b = second.neighbors_for(user).map(|o| o.neighbors);
        assert_eq!(a, b, "user {user} ranked differently across builds");
    }
}

#[test]
fn seed_changes_signatures() {
    let sets = synthetic_sets(5);
    let a = build_signatures(&sets, &SignatureConfig::new().with_seed(1)).unwrap();
    let b = build_signatures(&sets, &SignatureConfig::new().with_seed(2)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn parallel_and_sequential_paths_agree() {
    let sets = synthetic_sets(200);
    let mut sequential = config_for(HashFamily::Simple);
    sequential.signature.use_parallel = false;
    sequential.lsh.use_parallel = false;
    let mut parallel = sequential.clone();
    parallel.signature.use_parallel = true;
    parallel.lsh.use_parallel = true;

    let seq = SimilarityPipeline::build(&sets, &sequential).unwrap();
    let par = SimilarityPipeline::build(&sets, &parallel).unwrap();

    assert_eq!(seq.signatures(), par.signatures());
    assert_eq!(seq.table().bands(), par.table().bands());
    for user in 0..200 {
        assert_eq!(seq.table().assignments(user), par.table().assignments(user));
    }
}

#[test]
fn ranking_is_stable_across_calls() {
    let sets = synthetic_sets(40);
    let pipeline = SimilarityPipeline::build(&sets, &config_for(HashFamily::Simple)).unwrap();
    let first = pipeline.neighbors_for(7).map(|o| o.neighbors);
    for _ in 0..20 {
        assert_eq!(pipeline.neighbors_for(7).map(|o| o.neighbors), first);
    }
}

#[test]
fn rebuilding_with_same_parameters_reproduces_table() {
    let sets = synthetic_sets(30);
    let pipeline = SimilarityPipeline::build(&sets, &config_for(HashFamily::Simple)).unwrap();
    let again: BucketTable = pipeline
        .table()
        .rebuild(pipeline.signatures(), *pipeline.table().params())
        .unwrap();
    assert_eq!(pipeline.table().bands(), again.bands());
}
