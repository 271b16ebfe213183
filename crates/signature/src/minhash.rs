//! MinHash computation over user item sets.
//!
//! A signature slot `i` holds the minimum of `h_i(item)` over the user's
//! items. All users of a build share one set of [`HashFunctionSpec`]s.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::hash::HashFunctionSpec;
use crate::types::{ItemId, ItemSets, Signature, SignatureMap, EMPTY_SLOT};

/// Sign every user (parallel over users if `use_parallel = true`).
///
/// The parallel path produces the same map as the sequential one.
pub(crate) fn sign_all(
    item_sets: &ItemSets,
    specs: &[HashFunctionSpec],
    use_parallel: bool,
) -> SignatureMap {
    if use_parallel {
        item_sets
            .par_iter()
            .map(|(&user, items)| (user, signature_for(items, specs)))
            .collect()
    } else {
        item_sets
            .iter()
            .map(|(&user, items)| (user, signature_for(items, specs)))
            .collect()
    }
}

/// Compute one user's signature.
///
/// An empty item set yields the all-[`EMPTY_SLOT`] signature.
pub(crate) fn signature_for(items: &BTreeSet<ItemId>, specs: &[HashFunctionSpec]) -> Signature {
    let mut slots = vec![EMPTY_SLOT; specs.len()];
    for &item in items {
        for (slot, spec) in slots.iter_mut().zip(specs) {
            let h = spec.hash(item);
            if h < *slot {
                *slot = h;
            }
        }
    }
    Signature::from(slots)
}
