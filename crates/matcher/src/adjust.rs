//! Strategies for reconfiguring LSH parameters when a search comes up empty.

use index::LshParameters;

/// Produces the next parameters to try after a search found no candidates.
///
/// Implementations must keep `bands * rows_per_band == signature_len`.
pub trait ParameterAdjuster: Send + Sync {
    fn adjust(&self, current: &LshParameters, signature_len: usize) -> LshParameters;
}

/// Walks the band count through the divisors of the signature length and
/// doubles the bucket count on every step.
///
/// From `bands` the next divisor up is chosen; past the largest divisor the
/// walk wraps to the smallest one (1). A `bands` value that is not a divisor
/// moves to the smallest divisor above it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivisorAdjuster;

impl ParameterAdjuster for DivisorAdjuster {
    fn adjust(&self, current: &LshParameters, signature_len: usize) -> LshParameters {
        let divs = divisors(signature_len);
        let Some(&smallest) = divs.first() else {
            return *current;
        };
        let bands = divs
            .iter()
            .copied()
            .find(|&d| d > current.bands)
            .unwrap_or(smallest);
        LshParameters {
            bands,
            rows_per_band: signature_len / bands,
            num_buckets: current.num_buckets.saturating_mul(2),
        }
    }
}

impl<F> ParameterAdjuster for F
where
    F: Fn(&LshParameters, usize) -> LshParameters + Send + Sync,
{
    fn adjust(&self, current: &LshParameters, signature_len: usize) -> LshParameters {
        self(current, signature_len)
    }
}

/// All divisors of `n` in ascending order; empty for 0.
pub fn divisors(n: usize) -> Vec<usize> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            low.push(d);
            if d != n / d {
                high.push(n / d);
            }
        }
        d += 1;
    }
    low.extend(high.into_iter().rev());
    low
}
