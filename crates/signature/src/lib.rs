//! # simrec Signatures
//!
//! This crate turns per-user item sets into fixed-length MinHash signatures.
//! Two signatures built in the same run can be compared position by
//! position; the fraction of agreeing positions estimates the Jaccard
//! similarity of the underlying item sets.
//!
//! ## Contract
//!
//! - [`build_signatures`] is a pure function of `(item_sets, config)`: no
//!   I/O, no clocks in the output, no global random state.
//! - One set of hash coefficients is drawn per build from
//!   [`SignatureConfig::seed`] and applied to every user.
//! - Invalid configuration and degenerate input are rejected before any
//!   hashing starts, so a failed build never yields partial signatures.
//!
//! ## Example Usage
//!
//! ```
//! use signature::{build_signatures, collect_item_sets, SignatureConfig};
//!
//! let sets = collect_item_sets(vec![(1, 10), (1, 11), (2, 10), (2, 11)]);
//! let cfg = SignatureConfig::new().with_num_hashes(32);
//!
//! let signatures = build_signatures(&sets, &cfg).unwrap();
//!
//! assert_eq!(signatures[&1].len(), 32);
//! assert_eq!(signatures[&1], signatures[&2]);
//! ```
//!
use std::time::Instant;

use tracing::{info, warn, Level};

pub mod config;
pub mod hash;
mod minhash;
pub mod types;

pub use crate::config::{EmptySetPolicy, SignatureConfig, SignatureError, DEFAULT_MODULUS};
pub use crate::hash::{generate_hash_specs, modulus_for_item_count, HashFamily, HashFunctionSpec};
pub use crate::types::{
    collect_item_sets, jaccard, ItemId, ItemSets, Signature, SignatureMap, UserId, EMPTY_SLOT,
};

/// Build a MinHash signature for every user in `item_sets`.
pub fn build_signatures(
    item_sets: &ItemSets,
    cfg: &SignatureConfig,
) -> Result<SignatureMap, SignatureError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "signature.build",
        users = item_sets.len(),
        num_hashes = cfg.num_hashes,
        family = cfg.hash_family.as_str()
    );
    let _guard = span.enter();

    if let Err(err) = validate_input(item_sets, cfg) {
        warn!(error = %err, "signature_build_rejected");
        return Err(err);
    }

    let specs = generate_hash_specs(cfg.hash_family, cfg.num_hashes, cfg.modulus, cfg.seed);
    let signatures = minhash::sign_all(item_sets, &specs, cfg.use_parallel);

    info!(
        users = signatures.len(),
        parallel = cfg.use_parallel,
        elapsed_micros = start.elapsed().as_micros(),
        "signature_build_success"
    );
    Ok(signatures)
}

/// Sign a single item set with the coefficients `cfg` would use for a build.
///
/// The result is comparable with signatures from [`build_signatures`] under
/// the same configuration.
pub fn sign_items(
    items: &std::collections::BTreeSet<ItemId>,
    cfg: &SignatureConfig,
) -> Result<Signature, SignatureError> {
    cfg.validate()?;
    let specs = generate_hash_specs(cfg.hash_family, cfg.num_hashes, cfg.modulus, cfg.seed);
    Ok(minhash::signature_for(items, &specs))
}

fn validate_input(item_sets: &ItemSets, cfg: &SignatureConfig) -> Result<(), SignatureError> {
    cfg.validate()?;
    if item_sets.is_empty() {
        return Err(SignatureError::NoUsers);
    }
    if cfg.empty_set_policy == EmptySetPolicy::Reject {
        if let Some((&user, _)) = item_sets.iter().find(|(_, items)| items.is_empty()) {
            return Err(SignatureError::EmptyItemSet { user });
        }
    }
    Ok(())
}
