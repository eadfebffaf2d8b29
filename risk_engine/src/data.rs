//! data.rs — Price history and log-returns
//!
//! LOG-RETURN
//!   r_t = ln(close_t / close_{t-1}),   t = 1 … n−1
//!
//! A series of n prices yields n−1 returns. Every close must be strictly
//! positive; the engine rejects the whole series otherwise.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// One OHLCV bar as delivered by the market-data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open:   f64,
    pub high:   f64,
    pub low:    f64,
    pub close:  f64,
    pub volume: f64,
}

impl PricePoint {
    /// Flat bar with `open = high = low = close`; handy for close-only feeds.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, open: close, high: close, low: close, close, volume: 0.0 }
    }
}

/// Reject a series containing any non-positive (or NaN) close.
pub(crate) fn ensure_positive_closes(prices: &[PricePoint]) -> Result<()> {
    match prices.iter().position(|p| !p.close.is_finite() || p.close <= 0.0) {
        Some(i) => Err(RiskError::Input(format!(
            "close at index {i} must be finite and > 0, got {}",
            prices[i].close
        ))),
        None => Ok(()),
    }
}

/// Log-returns of consecutive closes.
pub fn calculate_returns(prices: &[PricePoint]) -> Result<Vec<f64>> {
    if prices.len() < 2 {
        return Err(RiskError::Input(format!(
            "at least 2 price points required, got {}",
            prices.len()
        )));
    }
    ensure_positive_closes(prices)?;

    Ok(prices
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect())
}

/// Load a JSON array of [`PricePoint`]s, sorted by timestamp.
pub fn load_price_history(path: &Path) -> anyhow::Result<Vec<PricePoint>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading price history {}", path.display()))?;
    let mut prices: Vec<PricePoint> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing price history {}", path.display()))?;
    prices.sort_by_key(|p| p.timestamp);
    Ok(prices)
}

/// Load a JSON array of benchmark returns.
pub fn load_benchmark_returns(path: &Path) -> anyhow::Result<Vec<f64>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading benchmark returns {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing benchmark returns {}", path.display()))
}

#[cfg(test)]
pub(crate) fn closes(values: &[f64]) -> Vec<PricePoint> {
    let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    values
        .iter()
        .enumerate()
        .map(|(i, &c)| PricePoint::from_close(start + chrono::Duration::days(i as i64), c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_length_is_n_minus_one() {
        let r = calculate_returns(&closes(&[100.0, 110.0, 99.0, 120.0])).unwrap();
        assert_eq!(r.len(), 3);
        assert!((r[0] - 1.1_f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn too_few_points_is_input_error() {
        assert!(matches!(calculate_returns(&closes(&[100.0])), Err(RiskError::Input(_))));
        assert!(matches!(calculate_returns(&[]), Err(RiskError::Input(_))));
    }

    #[test]
    fn non_positive_close_is_input_error() {
        assert!(matches!(
            calculate_returns(&closes(&[100.0, 0.0, 101.0])),
            Err(RiskError::Input(_))
        ));
        assert!(matches!(
            calculate_returns(&closes(&[100.0, -5.0])),
            Err(RiskError::Input(_))
        ));
    }

    #[test]
    fn non_finite_close_is_input_error() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(matches!(
                calculate_returns(&closes(&[100.0, bad, 101.0])),
                Err(RiskError::Input(_))
            ));
        }
    }

    #[test]
    fn price_history_json_roundtrip() {
        let prices = closes(&[10.0, 11.0]);
        let json = serde_json::to_string(&prices).unwrap();
        let path = std::env::temp_dir().join("risk_engine_prices_test.json");
        fs::write(&path, json).unwrap();
        let loaded = load_price_history(&path).unwrap();
        assert_eq!(loaded, prices);
        let _ = fs::remove_file(&path);
    }
}
