//! Sample statistics with empty-input guards.
//!
//! `statrs` returns NaN for under-sized samples; the engine wants 0 there so
//! that downstream ratios stay finite.

use statrs::statistics::Statistics;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().mean()
}

/// Unbiased (n − 1) variance, 0 below two observations.
pub fn sample_variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    data.iter().variance()
}

/// Unbiased (n − 1) standard deviation, 0 below two observations.
pub fn sample_std_dev(data: &[f64]) -> f64 {
    sample_variance(data).sqrt()
}

/// Unbiased (n − 1) covariance of two equal-length samples.
/// Returns 0 when lengths differ or fewer than two pairs exist.
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    a.iter().covariance(b.iter())
}
