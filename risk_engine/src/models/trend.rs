//! models/trend.rs — Log-price trend and mean-reversion drift
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! OLS of log-price on bar index (x = 0 … n−1, y = ln close):
//!
//!   slope = Σ(x − x̄)(y − ȳ) / Σ(x − x̄)²
//!
//!   trend = exp(slope · n)
//!   drift = θ · (trend − P_last) / P_last
//!
//! A degenerate regression (Σ(x − x̄)² ≈ 0, i.e. a single price) falls
//! back to trend = P_last, drift = 0.
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use serde::{Deserialize, Serialize};

use crate::data::{ensure_positive_closes, PricePoint};
use crate::error::{ensure_in_range, Result, RiskError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendDrift {
    pub trend: f64,
    pub drift: f64,
}

pub fn calculate_trend_and_drift(prices: &[PricePoint], theta: f64) -> Result<TrendDrift> {
    ensure_in_range("theta", theta, 0.0, 1.0)?;
    let last_price = match prices.last() {
        Some(p) => p.close,
        None => return Err(RiskError::Input("trend estimation requires at least one price".into())),
    };
    ensure_positive_closes(prices)?;

    let n = prices.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y: Vec<f64> = prices.iter().map(|p| p.close.ln()).collect();
    let y_mean = y.iter().sum::<f64>() / n;

    let (num, den) = y.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, yi)| {
        let dx = i as f64 - x_mean;
        (num + dx * (yi - y_mean), den + dx * dx)
    });

    if den.abs() < 1e-12 {
        return Ok(TrendDrift { trend: last_price, drift: 0.0 });
    }

    let slope = num / den;
    let trend = (slope * n).exp();
    let drift = theta * (trend - last_price) / last_price;
    Ok(TrendDrift { trend, drift })
}
