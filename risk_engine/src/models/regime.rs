//! models/regime.rs — Bull/bear regime labelling and per-regime statistics
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! MARKOV SWITCHING LABELS
//!
//!   s_0 = sign(r_last)          (r_last = 0 → bull)
//!   s_t = −s_{t-1}  with probability p_switch, else s_{t-1}
//!
//! REGIME ANALYSIS (labels aligned index-for-index with returns)
//!
//!   P(bull) = #bull / n,   P(bear) = #bear / n
//!   duration = mean length of consecutive same-label runs
//!   return / volatility = mean / sample σ of returns in that regime
//!
//! Regimes absent from the labels report 0 for every statistic.
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ensure_in_range, Result, RiskError};
use crate::rng::RandomSource;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Regime {
    Bull = 1,
    Bear = -1,
}

impl Regime {
    pub fn from_return(r: f64) -> Self {
        if r < 0.0 {
            Regime::Bear
        } else {
            Regime::Bull
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Regime::Bull => Regime::Bear,
            Regime::Bear => Regime::Bull,
        }
    }

    /// +1 / −1
    pub fn sign(self) -> i8 {
        self as i8
    }
}

/// Paired bull/bear statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegimePair {
    pub bull: f64,
    pub bear: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAnalysis {
    pub bull_market_probability: f64,
    pub bear_market_probability: f64,
    pub regime_duration:   RegimePair,
    pub regime_volatility: RegimePair,
    pub regime_returns:    RegimePair,
}

/// Label `returns.len()` steps with a two-state switching process.
pub fn generate_markov_regime<R: RandomSource + ?Sized>(
    returns: &[f64],
    switch_prob: f64,
    rng: &mut R,
) -> Result<Vec<Regime>> {
    ensure_in_range("switch_prob", switch_prob, 0.0, 1.0)?;
    let Some(&last) = returns.last() else {
        return Ok(Vec::new());
    };

    let mut current = Regime::from_return(last);
    let mut labels = Vec::with_capacity(returns.len());
    labels.push(current);
    for _ in 1..returns.len() {
        if rng.next_uniform() < switch_prob {
            current = current.flipped();
        }
        labels.push(current);
    }
    Ok(labels)
}

pub fn analyze_regime(returns: &[f64], regimes: &[Regime]) -> Result<RegimeAnalysis> {
    if returns.len() != regimes.len() {
        return Err(RiskError::Input(format!(
            "returns ({}) and regimes ({}) must have equal length",
            returns.len(),
            regimes.len()
        )));
    }

    let n = regimes.len();
    let bull_count = regimes.iter().filter(|&&r| r == Regime::Bull).count();
    let (bull_p, bear_p) = if n == 0 {
        (0.0, 0.0)
    } else {
        let bull = bull_count as f64 / n as f64;
        (bull, (n - bull_count) as f64 / n as f64)
    };

    // ── Run lengths ───────────────────────────────────────────────────────
    let mut bull_runs: Vec<f64> = Vec::new();
    let mut bear_runs: Vec<f64> = Vec::new();
    for run in regimes.chunk_by(|a, b| a == b) {
        match run[0] {
            Regime::Bull => bull_runs.push(run.len() as f64),
            Regime::Bear => bear_runs.push(run.len() as f64),
        }
    }

    // ── Per-regime return statistics ──────────────────────────────────────
    let split = |target: Regime| -> Vec<f64> {
        returns
            .iter()
            .zip(regimes)
            .filter(|(_, &r)| r == target)
            .map(|(&ret, _)| ret)
            .collect()
    };
    let bull_returns = split(Regime::Bull);
    let bear_returns = split(Regime::Bear);

    Ok(RegimeAnalysis {
        bull_market_probability: bull_p,
        bear_market_probability: bear_p,
        regime_duration: RegimePair {
            bull: stats::mean(&bull_runs),
            bear: stats::mean(&bear_runs),
        },
        regime_volatility: RegimePair {
            bull: stats::sample_std_dev(&bull_returns),
            bear: stats::sample_std_dev(&bear_returns),
        },
        regime_returns: RegimePair {
            bull: stats::mean(&bull_returns),
            bear: stats::mean(&bear_returns),
        },
    })
}
