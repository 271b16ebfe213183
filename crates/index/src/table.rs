//! Banded bucket tables built from a signature map.

use std::time::Instant;

use hashbrown::HashMap;
use rayon::prelude::*;
use signature::{Signature, SignatureMap, UserId};
use tracing::{debug, info, warn};

use crate::band::{band_bucket, BucketId};
use crate::config::{BandHasher, IndexConfig, IndexError, LshParameters};

/// Buckets of a single band: bucket id to the users that landed there.
pub type BandBuckets = HashMap<BucketId, Vec<UserId>>;

/// One bucket map per band, plus each user's bucket in every band.
///
/// A table is immutable once built; changing the parameters means building
/// a new table. Users within a bucket are kept in ascending id order.
#[derive(Debug, Clone)]
pub struct BucketTable {
    params: LshParameters,
    config: IndexConfig,
    bands: Vec<BandBuckets>,
    assignments: HashMap<UserId, Vec<BucketId>>,
}

impl BucketTable {
    /// Split every signature into `params.bands` bands and bucket each band.
    ///
    /// Fails with [`IndexError::SignatureLengthMismatch`] if any signature is
    /// not exactly `bands * rows_per_band` long; nothing is bucketed then.
    pub fn build(
        signatures: &SignatureMap,
        params: LshParameters,
        config: &IndexConfig,
    ) -> Result<Self, IndexError> {
        let start = Instant::now();
        let expected = params.validate()?;
        if let Some((&user, sig)) = signatures.iter().find(|(_, sig)| sig.len() != expected) {
            let err = IndexError::SignatureLengthMismatch {
                user,
                expected,
                actual: sig.len(),
            };
            warn!(error = %err, "bucket_table_rejected");
            return Err(err);
        }

        let rows: Vec<(UserId, &Signature)> = signatures.iter().map(|(&u, s)| (u, s)).collect();
        let hasher = config.band_hasher;
        let per_band: Vec<(BandBuckets, Vec<BucketId>)> = if config.use_parallel {
            (0..params.bands)
                .into_par_iter()
                .map(|band| bucket_band(&rows, band, &params, hasher))
                .collect()
        } else {
            (0..params.bands)
                .map(|band| bucket_band(&rows, band, &params, hasher))
                .collect()
        };

        let mut assignments: HashMap<UserId, Vec<BucketId>> = rows
            .iter()
            .map(|&(user, _)| (user, Vec::with_capacity(params.bands)))
            .collect();
        let mut bands = Vec::with_capacity(params.bands);
        for (buckets, ids) in per_band {
            for (&(user, _), bucket) in rows.iter().zip(ids) {
                if let Some(slots) = assignments.get_mut(&user) {
                    slots.push(bucket);
                }
            }
            bands.push(buckets);
        }

        let table = Self {
            params,
            config: *config,
            bands,
            assignments,
        };
        info!(
            users = table.num_users(),
            bands = params.bands,
            rows_per_band = params.rows_per_band,
            num_buckets = params.num_buckets,
            occupied_buckets = table.occupied_buckets(),
            elapsed_micros = start.elapsed().as_micros(),
            "bucket_table_built"
        );
        Ok(table)
    }

    /// Build a fresh table over the same signatures with new parameters,
    /// keeping this table's [`IndexConfig`].
    pub fn rebuild(
        &self,
        signatures: &SignatureMap,
        params: LshParameters,
    ) -> Result<Self, IndexError> {
        debug!(from = ?self.params, to = ?params, "bucket_table_rebuild");
        Self::build(signatures, params, &self.config)
    }

    pub fn params(&self) -> &LshParameters {
        &self.params
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn num_users(&self) -> usize {
        self.assignments.len()
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.assignments.contains_key(&user)
    }

    /// Bucket map of band `band`, if it exists.
    pub fn band(&self, band: usize) -> Option<&BandBuckets> {
        self.bands.get(band)
    }

    pub fn bands(&self) -> &[BandBuckets] {
        &self.bands
    }

    /// Members of `bucket` in `band`; empty if either does not exist.
    pub fn bucket_members(&self, band: usize, bucket: BucketId) -> &[UserId] {
        self.bands
            .get(band)
            .and_then(|buckets| buckets.get(&bucket))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The bucket `user` occupies in each band, in band order.
    pub fn assignments(&self, user: UserId) -> Option<&[BucketId]> {
        self.assignments.get(&user).map(Vec::as_slice)
    }

    pub fn bucket_of(&self, user: UserId, band: usize) -> Option<BucketId> {
        self.assignments(user).and_then(|ids| ids.get(band).copied())
    }

    /// Number of non-empty buckets over all bands.
    pub fn occupied_buckets(&self) -> usize {
        self.bands.iter().map(|b| b.len()).sum()
    }
}

fn bucket_band(
    rows: &[(UserId, &Signature)],
    band: usize,
    params: &LshParameters,
    hasher: BandHasher,
) -> (BandBuckets, Vec<BucketId>) {
    let start = band * params.rows_per_band;
    let end = start + params.rows_per_band;
    let mut buckets = BandBuckets::new();
    let mut ids = Vec::with_capacity(rows.len());
    for &(user, sig) in rows {
        let bucket = band_bucket(&sig.values()[start..end], params.num_buckets, hasher);
        buckets.entry(bucket).or_default().push(user);
        ids.push(bucket);
    }
    (buckets, ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs(entries: &[(UserId, &[u64])]) -> SignatureMap {
        entries
            .iter()
            .map(|&(u, v)| (u, Signature::from(v.to_vec())))
            .collect()
    }

    #[test]
    fn mismatched_length_is_configuration_error() {
        let map = sigs(&[(1, &[1, 2, 3, 4]), (2, &[1, 2, 3])]);
        let err = BucketTable::build(&map, LshParameters::new(2, 2, 10), &IndexConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::SignatureLengthMismatch {
                user: 2,
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn shorter_band_product_never_truncates() {
        let map = sigs(&[(1, &[1, 2, 3, 4, 5, 6])]);
        assert!(matches!(
            BucketTable::build(&map, LshParameters::new(2, 2, 10), &IndexConfig::default()),
            Err(IndexError::SignatureLengthMismatch { .. })
        ));
    }

    #[test]
    fn one_bucket_map_per_band() {
        let map = sigs(&[(1, &[1, 2, 3, 4, 5, 6]), (2, &[9, 9, 9, 9, 9, 9])]);
        let table =
            BucketTable::build(&map, LshParameters::new(3, 2, 50), &IndexConfig::default())
                .unwrap();
        assert_eq!(table.num_bands(), 3);
        assert_eq!(table.num_users(), 2);
        for band in 0..3 {
            let members: usize = table.band(band).unwrap().values().map(Vec::len).sum();
            assert_eq!(members, 2);
        }
        assert_eq!(table.assignments(1).unwrap().len(), 3);
        assert!(table.band(3).is_none());
    }

    #[test]
    fn equal_band_values_collide() {
        // Users 1 and 2 share band 1 exactly, differ elsewhere.
        let map = sigs(&[(1, &[10, 11, 7, 8]), (2, &[20, 21, 7, 8]), (3, &[5, 6, 1, 2])]);
        let params = LshParameters::new(2, 2, 1_000);
        for hasher in [BandHasher::CharSum, BandHasher::Xxh3 { seed: 3 }] {
            let cfg = IndexConfig::new().with_band_hasher(hasher);
            let table = BucketTable::build(&map, params, &cfg).unwrap();
            let bucket = table.bucket_of(1, 1).unwrap();
            assert_eq!(table.bucket_of(2, 1), Some(bucket));
            assert!(table.bucket_members(1, bucket).contains(&1));
            assert!(table.bucket_members(1, bucket).contains(&2));
        }
    }

    #[test]
    fn members_sorted_by_user() {
        let map = sigs(&[(30, &[1, 1]), (10, &[1, 1]), (20, &[1, 1])]);
        let table =
            BucketTable::build(&map, LshParameters::new(1, 2, 7), &IndexConfig::default())
                .unwrap();
        let bucket = table.bucket_of(10, 0).unwrap();
        assert_eq!(table.bucket_members(0, bucket), &[10, 20, 30]);
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let mut map = SignatureMap::new();
        for user in 0..100u64 {
            map.insert(
                user,
                Signature::from((0..12).map(|i| (user * 31 + i) % 17).collect::<Vec<_>>()),
            );
        }
        let params = LshParameters::new(4, 3, 13);
        let seq = BucketTable::build(&map, params, &IndexConfig::default()).unwrap();
        let par =
            BucketTable::build(&map, params, &IndexConfig::new().with_parallel(true)).unwrap();
        assert_eq!(seq.bands(), par.bands());
        for user in 0..100u64 {
            assert_eq!(seq.assignments(user), par.assignments(user));
        }
    }

    #[test]
    fn rebuild_keeps_config() {
        let map = sigs(&[(1, &[1, 2, 3, 4]), (2, &[1, 2, 3, 5])]);
        let cfg = IndexConfig::new().with_band_hasher(BandHasher::Xxh3 { seed: 11 });
        let table = BucketTable::build(&map, LshParameters::new(1, 4, 8), &cfg).unwrap();
        let rebuilt = table.rebuild(&map, LshParameters::new(2, 2, 16)).unwrap();
        assert_eq!(rebuilt.params(), &LshParameters::new(2, 2, 16));
        assert_eq!(rebuilt.config(), &cfg);
        assert_eq!(rebuilt.num_bands(), 2);
    }

    #[test]
    fn unknown_user_lookups_are_empty() {
        let map = sigs(&[(1, &[1, 2])]);
        let table =
            BucketTable::build(&map, LshParameters::new(1, 2, 4), &IndexConfig::default())
                .unwrap();
        assert!(!table.contains(99));
        assert!(table.assignments(99).is_none());
        assert!(table.bucket_members(0, 12345).is_empty());
    }
}
