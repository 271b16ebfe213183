//! Scalar hash families used to permute item ids.
//!
//! Every family is a pure function of `(x, a, b, p)`. Intermediate products
//! are carried in `u128`, so any `u64` item id and modulus is safe.

use serde::{Deserialize, Serialize};

/// Scalar hash family applied to item ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum HashFamily {
    /// `(a*x + b) mod p`
    #[default]
    Simple,
    /// `(x² + a*x + b) mod p`
    Polynomial,
    /// `(a*x) mod p`
    Multiplicative,
    /// `x XOR (a + b)`; not reduced by `p`.
    Xor,
}

impl HashFamily {
    /// Apply this family to `x` with coefficients `a`, `b` and modulus `p`.
    ///
    /// `p` must be non-zero for the modular families.
    #[inline]
    pub fn apply(self, x: u64, a: u64, b: u64, p: u64) -> u64 {
        match self {
            HashFamily::Simple => {
                let p = p as u128;
                (((a as u128) * (x as u128) + b as u128) % p) as u64
            }
            HashFamily::Polynomial => {
                let p = p as u128;
                let xr = (x as u128) % p;
                let sq = (xr * xr) % p;
                let lin = ((a as u128) * xr) % p;
                ((sq + lin + (b as u128) % p) % p) as u64
            }
            HashFamily::Multiplicative => {
                (((a as u128) * (x as u128)) % (p as u128)) as u64
            }
            HashFamily::Xor => x ^ a.wrapping_add(b),
        }
    }

    /// Lowercase name used in configs and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            HashFamily::Simple => "simple",
            HashFamily::Polynomial => "polynomial",
            HashFamily::Multiplicative => "multiplicative",
            HashFamily::Xor => "xor",
        }
    }
}

/// One independently parameterized hash instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashFunctionSpec {
    pub family: HashFamily,
    pub a: u64,
    pub b: u64,
    pub modulus: u64,
}

impl HashFunctionSpec {
    #[inline]
    pub fn hash(&self, x: u64) -> u64 {
        self.family.apply(x, self.a, self.b, self.modulus)
    }
}

/// Draw `count` hash specs from a seeded generator.
///
/// `a` is uniform in `[1, p)` and `b` uniform in `[0, p)`. The same seed
/// always yields the same specs, and a build must reuse one set of specs for
/// every user so that signatures stay comparable.
pub fn generate_hash_specs(
    family: HashFamily,
    count: usize,
    modulus: u64,
    seed: u64,
) -> Vec<HashFunctionSpec> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let upper = modulus.max(2);
    (0..count)
        .map(|_| HashFunctionSpec {
            family,
            a: rng.u64(1..upper),
            b: rng.u64(0..upper),
            modulus,
        })
        .collect()
}

/// Smallest prime `>= max(distinct_items, 2)`.
///
/// Sizing the modulus to the number of distinct items keeps hash values
/// compact, but ids above the modulus then share residues with smaller ids.
pub fn modulus_for_item_count(distinct_items: u64) -> u64 {
    let mut candidate = distinct_items.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}
