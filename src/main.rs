use std::error::Error;

use simrec::{RatingTable, SimilarityPipeline, SimrecConfig, final_recommendation};
use tracing_subscriber::EnvFilter;

/// Synthetic ratings: four taste groups of eight users over overlapping
/// item ranges, plus one user with no overlap at all.
fn demo_ratings() -> Result<RatingTable, Box<dyn Error>> {
    let mut ratings = RatingTable::new();
    for group in 0..4u64 {
        for member in 0..8u64 {
            let user = group * 8 + member + 1;
            for item in (group * 20)..(group * 20 + 25) {
                if (item + member) % 3 != 0 {
                    let rating = 1.0 + ((item * 7 + member * 3) % 9) as f32 / 2.0;
                    ratings.insert(user, item, rating)?;
                }
            }
        }
    }
    for item in 500..505 {
        ratings.insert(99, item, 3.0)?;
    }
    for item in 0..100 {
        ratings.set_title(item, format!("Item #{item}"));
    }
    Ok(ratings)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("simrec=info,warn")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimrecConfig::from_file(path)?,
        None => SimrecConfig::with_banding(60, 20)?,
    };

    let ratings = demo_ratings()?;
    let pipeline = SimilarityPipeline::from_ratings(&ratings, &config)?;

    for user in [1, 9, 17, 25, 99] {
        match pipeline.neighbors_for(user) {
            Ok(outcome) => {
                let recs =
                    final_recommendation(user, &outcome.neighbors, &ratings, config.recommend.top_k)?;
                println!(
                    "user {user}: neighbors {:?} after {} retries",
                    outcome.neighbors, outcome.retries
                );
                println!("  recommendations: {}", serde_json::to_string(&recs)?);
            }
            Err(err) if err.is_unsatisfiable() => {
                println!("user {user}: no recommendation possible ({err})");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
