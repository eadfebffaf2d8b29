//! Error taxonomy for the risk engine.
//!
//! Every public operation validates its inputs eagerly and returns one of
//! these before producing any output. Numerical degeneracies (flat
//! regressions, runaway variance) are absorbed by clamping and never show
//! up here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    /// Insufficient data points, non-positive prices, mismatched lengths
    #[error("Input error: {0}")]
    Input(String),

    /// A parameter outside its documented bound (including α+β ≥ 1)
    #[error("Parameter out of range: {0}")]
    ParameterRange(String),

    /// Cancellation was requested before every path finished
    #[error("Simulation cancelled")]
    Cancelled,

    /// The background worker running the pipeline failed to join
    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RiskError>;

/// Check `value ∈ [lo, hi]`; NaN is always rejected.
pub(crate) fn ensure_in_range(name: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(RiskError::ParameterRange(format!(
            "{name} must lie in [{lo}, {hi}], got {value}"
        )))
    }
}
