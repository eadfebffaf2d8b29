//! metrics.rs — Performance Metrics
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! MATHEMATICAL SPECIFICATION
//! ─────────────────────────────────────────────────────────────────────────
//!
//! Inputs: daily log-returns r_t from the close series, r_f = 2% annual.
//!
//!   R_ann = mean(r) × 252
//!   σ_ann = std(r) × √252               (sample std, n−1)
//!
//! SHARPE RATIO
//!   SR = (R_ann − r_f) / σ_ann
//!
//! SORTINO RATIO
//!   Downside deviation over returns below the sample mean r̄:
//!   σ_d = √(mean_{r_t < r̄} (r_t − r̄)²) × √252
//!   SoR = (R_ann − r_f) / σ_d
//!
//! MAXIMUM DRAWDOWN (close prices)
//!   peak_t = max_{s ≤ t}(P_s)
//!   MaxDD  = min_t (P_t − peak_t) / peak_t      (negative)
//!
//! CALMAR RATIO
//!   Calmar = R_ann / |MaxDD|
//!
//! BENCHMARK-RELATIVE (benchmark returns b_t, same length as r_t)
//!   β      = cov(r, b) / var(b)
//!   α      = R_ann − (r_f + β · (B_ann − r_f))
//!   IR     = (R_ann − B_ann) / (std(r − b) × √252)
//!   Treynor = (R_ann − r_f) / β
//!
//!   Without a benchmark: β = 1, α = 0, IR = 0, Treynor = 0.
//!
//! Ratios whose denominator is ~0 report 0.
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::{calculate_returns, PricePoint};
use crate::error::Result;
use crate::models::garch::TRADING_DAYS_PER_YEAR;
use crate::stats;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
const EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub annualized_return:     f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio:      f64,
    pub sortino_ratio:     f64,
    pub max_drawdown:      f64, // fraction (negative)
    pub calmar_ratio:      f64,
    pub information_ratio: f64,
    pub beta:              f64,
    pub alpha:             f64,
    pub treynor_ratio:     f64,
}

impl std::fmt::Display for PerformanceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  Ann. Return    : {:.2}%", self.annualized_return * 100.0)?;
        writeln!(f, "  Ann. Volatility: {:.2}%", self.annualized_volatility * 100.0)?;
        writeln!(f, "  Sharpe Ratio   : {:.3}", self.sharpe_ratio)?;
        writeln!(f, "  Sortino Ratio  : {:.3}", self.sortino_ratio)?;
        writeln!(f, "  Max Drawdown   : {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "  Calmar Ratio   : {:.3}", self.calmar_ratio)?;
        writeln!(f, "  Beta           : {:.3}", self.beta)?;
        writeln!(f, "  Alpha          : {:.4}", self.alpha)?;
        writeln!(f, "  Information    : {:.3}", self.information_ratio)?;
        writeln!(f, "  Treynor Ratio  : {:.4}", self.treynor_ratio)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den.abs() < EPS {
        0.0
    } else {
        num / den
    }
}

/// Metrics with the default 2% risk-free rate.
pub fn calculate_performance_metrics(
    prices: &[PricePoint],
    benchmark_returns: Option<&[f64]>,
) -> Result<PerformanceMetrics> {
    calculate_performance_metrics_with_rate(prices, benchmark_returns, DEFAULT_RISK_FREE_RATE)
}

pub fn calculate_performance_metrics_with_rate(
    prices: &[PricePoint],
    benchmark_returns: Option<&[f64]>,
    risk_free: f64,
) -> Result<PerformanceMetrics> {
    let returns = calculate_returns(prices)?;
    let ann = TRADING_DAYS_PER_YEAR;

    // ── Return / volatility ───────────────────────────────────────────────
    let r_mean = stats::mean(&returns);
    let ann_return = r_mean * ann;
    let ann_vol = stats::sample_std_dev(&returns) * ann.sqrt();
    let sharpe = ratio(ann_return - risk_free, ann_vol);

    // ── Sortino Ratio ─────────────────────────────────────────────────────
    //   σ_d over returns strictly below the sample mean
    let downside_sq: Vec<f64> = returns
        .iter()
        .filter(|&&r| r < r_mean)
        .map(|&r| (r - r_mean).powi(2))
        .collect();
    let sigma_d = stats::mean(&downside_sq).sqrt() * ann.sqrt();
    let sortino = ratio(ann_return - risk_free, sigma_d);

    // ── Maximum Drawdown / Calmar ─────────────────────────────────────────
    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let max_dd = max_drawdown(&closes);
    let calmar = ratio(ann_return, max_dd.abs());

    // ── Benchmark-relative ────────────────────────────────────────────────
    let (beta, alpha, information_ratio, treynor_ratio) = match benchmark_returns {
        Some(bench) if bench.len() == returns.len() => {
            let bench_var = stats::sample_variance(bench);
            let beta = ratio(stats::sample_covariance(&returns, bench), bench_var);
            let ann_bench = stats::mean(bench) * ann;
            let alpha = ann_return - (risk_free + beta * (ann_bench - risk_free));

            let active: Vec<f64> = returns.iter().zip(bench).map(|(r, b)| r - b).collect();
            let tracking_error = stats::sample_std_dev(&active) * ann.sqrt();
            let information_ratio = ratio(ann_return - ann_bench, tracking_error);
            let treynor = ratio(ann_return - risk_free, beta);
            (beta, alpha, information_ratio, treynor)
        }
        Some(bench) => {
            warn!(
                "Benchmark length {} does not match {} asset returns; ignoring benchmark",
                bench.len(),
                returns.len()
            );
            (1.0, 0.0, 0.0, 0.0)
        }
        None => (1.0, 0.0, 0.0, 0.0),
    };

    Ok(PerformanceMetrics {
        annualized_return: ann_return,
        annualized_volatility: ann_vol,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        max_drawdown: max_dd,
        calmar_ratio: calmar,
        information_ratio,
        beta,
        alpha,
        treynor_ratio,
    })
}

/// Maximum drawdown of any value series.
/// Returns a non-positive value (e.g. −0.15 = −15% drawdown).
pub fn drawdown_of<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut iter = values.into_iter();
    let Some(mut peak) = iter.next() else {
        return 0.0;
    };
    let mut max_dd = 0.0f64;

    for v in iter {
        if v > peak {
            peak = v;
        }
        let dd = (v - peak) / peak;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Maximum drawdown from a price (or equity) curve.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    drawdown_of(curve.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::closes;

    #[test]
    fn max_drawdown_flat() {
        let curve = vec![100.0, 100.0, 100.0];
        assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn max_drawdown_50_pct() {
        let curve = vec![100.0, 120.0, 60.0, 80.0];
        // peak=120, low=60 → DD = (60−120)/120 = −0.5
        let dd = max_drawdown(&curve);
        assert!((dd + 0.5).abs() < 1e-9, "dd = {dd}");
    }

    #[test]
    fn standalone_defaults_without_benchmark() {
        let m = calculate_performance_metrics(&closes(&[100.0, 102.0, 101.0, 104.0, 103.0]), None)
            .unwrap();
        assert_eq!(m.beta, 1.0);
        assert_eq!(m.alpha, 0.0);
        assert_eq!(m.information_ratio, 0.0);
        assert_eq!(m.treynor_ratio, 0.0);
        assert!(m.max_drawdown < 0.0);
    }

    #[test]
    fn sharpe_and_calmar_by_hand() {
        let prices = closes(&[100.0, 102.0, 101.0, 104.0, 103.0]);
        let r = calculate_returns(&prices).unwrap();
        let m = calculate_performance_metrics(&prices, None).unwrap();

        let ann_ret = stats::mean(&r) * 252.0;
        let ann_vol = stats::sample_std_dev(&r) * 252.0_f64.sqrt();
        assert!((m.sharpe_ratio - (ann_ret - 0.02) / ann_vol).abs() < 1e-9);

        // peak 102 → 101 and peak 104 → 103; deepest is (101−102)/102
        let dd = (101.0 - 102.0) / 102.0;
        assert!((m.max_drawdown - dd).abs() < 1e-12);
        assert!((m.calmar_ratio - ann_ret / dd.abs()).abs() < 1e-9);
    }

    #[test]
    fn sortino_uses_below_mean_returns() {
        let prices = closes(&[100.0, 103.0, 101.0, 106.0, 104.0, 108.0]);
        let r = calculate_returns(&prices).unwrap();
        let m = calculate_performance_metrics(&prices, None).unwrap();

        let mean = stats::mean(&r);
        let below: Vec<f64> = r
            .iter()
            .filter(|&&x| x < mean)
            .map(|&x| (x - mean).powi(2))
            .collect();
        let sigma_d = (below.iter().sum::<f64>() / below.len() as f64).sqrt() * 252.0_f64.sqrt();
        assert!((m.sortino_ratio - (mean * 252.0 - 0.02) / sigma_d).abs() < 1e-9);
    }

    #[test]
    fn benchmark_equal_to_asset() {
        let prices = closes(&[100.0, 103.0, 101.0, 106.0, 104.0, 108.0]);
        let r = calculate_returns(&prices).unwrap();
        let m = calculate_performance_metrics(&prices, Some(&r)).unwrap();

        assert!((m.beta - 1.0).abs() < 1e-9);
        assert!(m.alpha.abs() < 1e-9);
        // zero tracking error → IR reported as 0
        assert_eq!(m.information_ratio, 0.0);
        assert!((m.treynor_ratio - (m.annualized_return - 0.02)).abs() < 1e-9);
    }

    #[test]
    fn leveraged_benchmark_beta() {
        let prices = closes(&[100.0, 103.0, 101.0, 106.0, 104.0, 108.0]);
        let r = calculate_returns(&prices).unwrap();
        let bench: Vec<f64> = r.iter().map(|x| x * 0.5).collect();
        let m = calculate_performance_metrics(&prices, Some(&bench)).unwrap();
        assert!((m.beta - 2.0).abs() < 1e-9, "beta = {}", m.beta);
    }

    #[test]
    fn mismatched_benchmark_falls_back() {
        let prices = closes(&[100.0, 103.0, 101.0]);
        let m = calculate_performance_metrics(&prices, Some(&[0.01])).unwrap();
        assert_eq!(m.beta, 1.0);
        assert_eq!(m.treynor_ratio, 0.0);
    }

    #[test]
    fn too_few_prices_is_error() {
        assert!(calculate_performance_metrics(&closes(&[100.0]), None).is_err());
    }
}
