//! Band-to-bucket hashing.

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::config::BandHasher;

/// Bucket identifier within one band.
pub type BucketId = u64;

const ZERO: u64 = b'0' as u64;
const SEPARATOR: u64 = b'_' as u64;

/// Map one band's values to a bucket in `[0, num_buckets)`.
///
/// `num_buckets` must be non-zero.
#[inline]
pub fn band_bucket(band: &[u64], num_buckets: u64, hasher: BandHasher) -> BucketId {
    match hasher {
        BandHasher::CharSum => char_sum(band) % num_buckets,
        BandHasher::Xxh3 { seed } => {
            let mut bytes = Vec::with_capacity(band.len() * 8);
            for value in band {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            xxh3_64_with_seed(&bytes, seed) % num_buckets
        }
    }
}

/// Character-code sum of `band` rendered as `v0_v1_..._vn` in decimal.
///
/// Equivalent to building the joined string and summing its bytes, without
/// the allocation.
pub fn char_sum(band: &[u64]) -> u64 {
    let digits: u64 = band.iter().map(|&v| decimal_char_sum(v)).sum();
    let separators = band.len().saturating_sub(1) as u64 * SEPARATOR;
    digits + separators
}

#[inline]
fn decimal_char_sum(mut value: u64) -> u64 {
    if value == 0 {
        return ZERO;
    }
    let mut sum = 0;
    while value > 0 {
        sum += ZERO + value % 10;
        value /= 10;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_sum_via_string(band: &[u64]) -> u64 {
        let joined = band
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("_");
        joined.bytes().map(u64::from).sum()
    }

    #[test]
    fn char_sum_matches_joined_string() {
        let cases: [&[u64]; 6] = [
            &[],
            &[0],
            &[7],
            &[12, 345],
            &[9_999_990, 0, 1, 10],
            &[u64::MAX, u64::MAX],
        ];
        for band in cases {
            assert_eq!(char_sum(band), char_sum_via_string(band), "{band:?}");
        }
    }

    #[test]
    fn char_sum_known_value() {
        // "12_3" = 49 + 50 + 95 + 51
        assert_eq!(char_sum(&[12, 3]), 245);
    }

    #[test]
    fn identical_bands_share_bucket() {
        for hasher in [BandHasher::CharSum, BandHasher::Xxh3 { seed: 1 }] {
            let a = band_bucket(&[4, 8, 15], 97, hasher);
            let b = band_bucket(&[4, 8, 15], 97, hasher);
            assert_eq!(a, b);
            assert!(a < 97);
        }
    }

    #[test]
    fn char_sum_collides_on_digit_permutations() {
        // Known weakness of the character sum: 12 and 21 share a digit multiset.
        assert_eq!(
            band_bucket(&[12], 1_000, BandHasher::CharSum),
            band_bucket(&[21], 1_000, BandHasher::CharSum)
        );
        assert_ne!(
            band_bucket(&[12], 1 << 40, BandHasher::Xxh3 { seed: 0 }),
            band_bucket(&[21], 1 << 40, BandHasher::Xxh3 { seed: 0 })
        );
    }

    #[test]
    fn single_bucket_maps_everything_to_zero() {
        assert_eq!(band_bucket(&[1, 2, 3], 1, BandHasher::CharSum), 0);
        assert_eq!(band_bucket(&[1, 2, 3], 1, BandHasher::Xxh3 { seed: 9 }), 0);
    }
}
