//! models/garch.rs — GARCH(1,1) Conditional Volatility
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! MATHEMATICAL SPECIFICATION
//! ─────────────────────────────────────────────────────────────────────────
//!
//! GARCH(1,1): Bollerslev (1986)
//!
//!   Conditional variance update (shock = previous return):
//!
//!       σ²_t = ω  +  α · r²_{t-1}  +  β · σ²_{t-1}
//!
//!   Constraints (covariance stationarity):
//!     α ∈ [0,1],  β ∈ [0,1],  α + β < 1
//!
//!   ω is anchored to a reference variance σ²_ref:
//!       ω = σ²_ref · (1 − α − β)
//!   so the long-run variance σ²_∞ = ω / (1 − α − β) equals σ²_ref.
//!   The estimator uses the unbiased sample variance of the returns
//!   (floored at 1e-8, not capped), the simulator uses the seed
//!   volatility squared.
//!
//!   Stability clamp, applied after every update:
//!       σ²_t ← min(max(σ²_t, 1e-8), 1e4)
//!
//!   Multi-step forecast (h-step ahead):
//!       σ²_{t+h} = σ²_∞ + (α+β)^(h-1) · (σ²_t − σ²_∞)
//!
//!   Regime classification (annualised, 252 bars/year):
//!     - LOW:    σ_annual < 0.40
//!     - NORMAL: 0.40 ≤ σ_annual < 0.80
//!     - HIGH:   σ_annual ≥ 0.80
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::models::GarchParams;
use crate::stats;

pub const VARIANCE_FLOOR: f64 = 1e-8;
pub const VARIANCE_CEILING: f64 = 1e4;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolRegime {
    Low,
    Normal,
    High,
}

#[inline]
pub fn clamp_variance(v: f64) -> f64 {
    v.clamp(VARIANCE_FLOOR, VARIANCE_CEILING)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Garch11 {
    /// ω: long-run variance weight
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
    /// Current conditional variance estimate σ²_t
    pub sigma2: f64,
}

impl Garch11 {
    /// Anchor ω on `reference_variance` and start the recursion there.
    /// Parameters must already be validated; the clamp applies from the
    /// first update onwards.
    pub fn anchored(params: GarchParams, reference_variance: f64) -> Self {
        Self {
            omega: reference_variance * (1.0 - params.alpha - params.beta),
            alpha: params.alpha,
            beta: params.beta,
            sigma2: reference_variance,
        }
    }

    /// σ²_t = clamp(ω + α·shock² + β·σ²_{t-1})
    #[inline]
    pub fn update(&mut self, shock: f64) {
        self.sigma2 =
            clamp_variance(self.omega + self.alpha * shock * shock + self.beta * self.sigma2);
    }

    /// Current conditional σ (per-bar).
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma2.sqrt()
    }

    /// σ²_∞ = ω / (1 − α − β)
    pub fn long_run_variance(&self) -> f64 {
        self.omega / (1.0 - self.alpha - self.beta)
    }

    /// h-step ahead variance forecast (h ≤ 1 returns σ²_t).
    pub fn forecast_variance(&self, h: usize) -> f64 {
        let persistence = self.alpha + self.beta;
        let longrun = self.long_run_variance();
        let exponent = h.saturating_sub(1).min(i32::MAX as usize) as i32;
        clamp_variance(longrun + persistence.powi(exponent) * (self.sigma2 - longrun))
    }
}

/// Classify a per-bar σ by its annualised level.
pub fn classify_volatility(sigma: f64) -> VolRegime {
    let sa = sigma * TRADING_DAYS_PER_YEAR.sqrt();
    if sa < 0.40 {
        VolRegime::Low
    } else if sa < 0.80 {
        VolRegime::Normal
    } else {
        VolRegime::High
    }
}

/// ω uses the floored sample variance; σ²_0 is that variance clamped.
fn anchored_on_sample(params: GarchParams, returns: &[f64]) -> Garch11 {
    let sample_var = stats::sample_variance(returns).max(VARIANCE_FLOOR);
    let mut garch = Garch11::anchored(params, sample_var);
    garch.sigma2 = clamp_variance(sample_var);
    garch
}

/// Per-step conditional σ over a return series.
///
/// σ²_0 is the unbiased sample variance (clamped like every step); each later σ²_t
/// takes r_{t-1} as its shock. Output length equals input length. A single
/// return yields `√max(r₀², 1e-8)`.
pub fn calculate_garch_volatility(returns: &[f64], alpha: f64, beta: f64) -> Result<Vec<f64>> {
    let params = GarchParams::new(alpha, beta)?;

    match returns {
        [] => Err(RiskError::Input("GARCH requires at least one return".into())),
        [r0] => Ok(vec![(r0 * r0).max(VARIANCE_FLOOR).sqrt()]),
        _ => {
            let mut garch = anchored_on_sample(params, returns);

            let mut vols = Vec::with_capacity(returns.len());
            vols.push(garch.sigma());
            for &shock in &returns[..returns.len() - 1] {
                garch.update(shock);
                vols.push(garch.sigma());
            }
            Ok(vols)
        }
    }
}

/// Run the recursion over `returns` and return the filter state after the
/// last observation has been absorbed (used for forecasting).
pub fn garch_filter(returns: &[f64], params: GarchParams) -> Result<Garch11> {
    params.validate()?;
    if returns.is_empty() {
        return Err(RiskError::Input("GARCH requires at least one return".into()));
    }
    let mut garch = anchored_on_sample(params, returns);
    for &r in returns {
        garch.update(r);
    }
    Ok(garch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETURNS: [f64; 8] = [0.01, -0.02, 0.015, -0.005, 0.03, -0.04, 0.002, 0.011];

    #[test]
    fn output_length_and_positivity() {
        let vols = calculate_garch_volatility(&RETURNS, 0.1, 0.8).unwrap();
        assert_eq!(vols.len(), RETURNS.len());
        assert!(vols.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn first_value_is_sample_std() {
        let vols = calculate_garch_volatility(&RETURNS, 0.1, 0.8).unwrap();
        let sd = stats::sample_std_dev(&RETURNS);
        assert!((vols[0] - sd).abs() < 1e-15);
    }

    #[test]
    fn single_return() {
        let vols = calculate_garch_volatility(&[0.05], 0.1, 0.8).unwrap();
        assert_eq!(vols, vec![(0.05_f64 * 0.05).max(1e-8).sqrt()]);

        let flat = calculate_garch_volatility(&[0.0], 0.1, 0.8).unwrap();
        assert_eq!(flat, vec![1e-8_f64.sqrt()]);
    }

    #[test]
    fn instability_and_range_rejected() {
        assert!(matches!(
            calculate_garch_volatility(&RETURNS, 0.2, 0.8),
            Err(RiskError::ParameterRange(_))
        ));
        assert!(matches!(
            calculate_garch_volatility(&RETURNS, 1.2, 0.0),
            Err(RiskError::ParameterRange(_))
        ));
        assert!(matches!(
            calculate_garch_volatility(&RETURNS, 0.1, -0.1),
            Err(RiskError::ParameterRange(_))
        ));
    }

    #[test]
    fn flat_returns_hit_variance_floor() {
        let vols = calculate_garch_volatility(&[0.0; 5], 0.1, 0.8).unwrap();
        assert!(vols.iter().all(|&v| (v - 1e-4).abs() < 1e-12), "{vols:?}");
    }

    #[test]
    fn omega_anchor_is_floored_not_capped() {
        let wild = [200.0, -200.0, 200.0];
        let sample_var = stats::sample_variance(&wild);
        assert!(sample_var > VARIANCE_CEILING);

        let g = garch_filter(&wild, GarchParams { alpha: 0.1, beta: 0.8 }).unwrap();
        assert!((g.omega - sample_var * 0.1).abs() < 1e-9);
        assert!((g.long_run_variance() - sample_var).abs() < 1e-6);

        let vols = calculate_garch_volatility(&wild, 0.1, 0.8).unwrap();
        assert_eq!(vols[0], VARIANCE_CEILING.sqrt());

        let flat = garch_filter(&[0.0; 4], GarchParams { alpha: 0.1, beta: 0.8 }).unwrap();
        assert!((flat.long_run_variance() - VARIANCE_FLOOR).abs() < 1e-20);
    }

    #[test]
    fn variance_ceiling_holds() {
        let mut g = Garch11::anchored(GarchParams { alpha: 0.5, beta: 0.49 }, 9_000.0);
        g.update(1_000.0);
        assert_eq!(g.sigma2, VARIANCE_CEILING);
    }

    #[test]
    fn garch_update_monotonic() {
        let mut g = Garch11::anchored(GarchParams { alpha: 0.10, beta: 0.85 }, 1e-4);
        g.update(0.05);
        let after_shock = g.sigma2;
        g.update(0.0);
        let after_calm = g.sigma2;
        // After shock, variance must be elevated; after calm tick it decays
        assert!(after_shock > after_calm);
    }

    #[test]
    fn forecast_reverts_to_long_run() {
        let mut g = Garch11::anchored(GarchParams { alpha: 0.10, beta: 0.85 }, 1e-4);
        g.update(0.08);
        let longrun = g.long_run_variance();
        assert!((longrun - 1e-4).abs() < 1e-15);
        let near = g.forecast_variance(1);
        let far = g.forecast_variance(500);
        assert!((near - g.sigma2).abs() < 1e-15);
        assert!((far - longrun).abs() < 1e-9);
    }

    #[test]
    fn regime_thresholds() {
        let daily = |annual: f64| annual / TRADING_DAYS_PER_YEAR.sqrt();
        assert_eq!(classify_volatility(daily(0.20)), VolRegime::Low);
        assert_eq!(classify_volatility(daily(0.60)), VolRegime::Normal);
        assert_eq!(classify_volatility(daily(1.20)), VolRegime::High);
    }
}
