//! risk.rs — Terminal-price risk statistics
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! Given the terminal price of every simulated path, P_0 = initial price,
//! N = number of paths and S = terminal prices sorted ascending:
//!
//!   P(upside ≥ 20%)   = #{p ≥ 1.2·P_0} / N
//!   P(downside ≤ −10%) = #{p ≤ 0.9·P_0} / N
//!
//!   Histogram: 50 equal-width bins on [min, max], last bin closed.
//!
//!   Percentile q (nearest rank, no interpolation):
//!       S[⌊q/100 · (N − 1)⌋]
//!
//!   VaR_c  = P_0 − S[k_c],            k_95 = ⌊0.05·N⌋, k_99 = ⌊0.01·N⌋
//!   ES_c   = P_0 − mean(S[0 ..= k_c])
//!
//! VaR and ES are measured from P_0, not from the sample mean.
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

pub const HISTOGRAM_BINS: usize = 50;
const UPSIDE_MULTIPLIER: f64 = 1.2;
const DOWNSIDE_MULTIPLIER: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub upside20: f64,
    pub downside10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5:  f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

impl Percentiles {
    /// (level, value) pairs in ascending level order.
    pub fn levels(&self) -> [(u8, f64); 7] {
        [
            (5, self.p5),
            (10, self.p10),
            (25, self.p25),
            (50, self.p50),
            (75, self.p75),
            (90, self.p90),
            (95, self.p95),
        ]
    }
}

/// Everything the aggregator reduces a set of terminal prices to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalRisk {
    pub probabilities: Probabilities,
    pub histogram: Vec<HistogramBin>,
    pub percentiles: Percentiles,
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall95: f64,
    pub expected_shortfall99: f64,
    /// Mean terminal price
    pub mean_terminal: f64,
}

/// Reduce terminal prices to probabilities, histogram, percentiles, VaR and ES.
pub fn aggregate_terminal_prices(terminal: &[f64], initial_price: f64) -> Result<TerminalRisk> {
    if terminal.is_empty() {
        return Err(RiskError::Input("no terminal prices to aggregate".into()));
    }
    if terminal.iter().any(|p| p.is_nan()) {
        return Err(RiskError::Input("terminal prices contain NaN".into()));
    }
    let n = terminal.len() as f64;

    let upside = terminal.iter().filter(|&&p| p >= initial_price * UPSIDE_MULTIPLIER).count();
    let downside = terminal.iter().filter(|&&p| p <= initial_price * DOWNSIDE_MULTIPLIER).count();

    let mut sorted = terminal.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (var95, expected_shortfall95) = tail_loss(&sorted, initial_price, 0.05);
    let (var99, expected_shortfall99) = tail_loss(&sorted, initial_price, 0.01);

    Ok(TerminalRisk {
        probabilities: Probabilities {
            upside20: upside as f64 / n,
            downside10: downside as f64 / n,
        },
        histogram: histogram(&sorted, HISTOGRAM_BINS),
        percentiles: Percentiles {
            p5:  nearest_rank(&sorted, 5.0),
            p10: nearest_rank(&sorted, 10.0),
            p25: nearest_rank(&sorted, 25.0),
            p50: nearest_rank(&sorted, 50.0),
            p75: nearest_rank(&sorted, 75.0),
            p90: nearest_rank(&sorted, 90.0),
            p95: nearest_rank(&sorted, 95.0),
        },
        var95,
        var99,
        expected_shortfall95,
        expected_shortfall99,
        mean_terminal: terminal.iter().sum::<f64>() / n,
    })
}

/// `sorted` must be ascending and non-empty.
fn nearest_rank(sorted: &[f64], pct: f64) -> f64 {
    let idx = (pct / 100.0 * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// (VaR, ES) at tail fraction `tail`; `sorted` ascending and non-empty.
fn tail_loss(sorted: &[f64], initial_price: f64, tail: f64) -> (f64, f64) {
    let k = ((tail * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    let var = initial_price - sorted[k];
    let tail_mean = sorted[..=k].iter().sum::<f64>() / (k + 1) as f64;
    (var, initial_price - tail_mean)
}

/// Equal-width histogram over [min, max]; the last bin includes max.
/// A zero-width range puts every sample in the first bin.
pub fn histogram(sorted: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let width = (max - min) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + i as f64 * width,
            upper: if i + 1 == bins { max } else { min + (i + 1) as f64 * width },
            count: 0,
        })
        .collect();

    for &p in sorted {
        let idx = if width > 0.0 {
            (((p - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        out[idx].count += 1;
    }
    out
}
