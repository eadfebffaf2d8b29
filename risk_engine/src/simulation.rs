//! simulation.rs — Monte Carlo price paths with GARCH volatility
//!
//! ```text
//! ─────────────────────────────────────────────────────────────────────────
//! PER-STEP DYNAMICS (Δt = 1/252)
//!
//!   Z     ~ N(0,1)                        (Box–Muller, per-path stream)
//!   ret   = μ·Δt − ½·σ²_t·Δt + σ_t·√Δt·Z
//!   P_t+1 = max(P_t · e^ret, 0.01)
//!   σ²_t+1 = clamp(ω + α·ret² + β·σ²_t),  ω = σ²_0 · (1 − α − β)
//!
//! Paths share nothing but read-only parameters: each one draws from its
//! own stream (indexed by path number) and runs on the rayon pool. The
//! ordered collect is the only synchronisation point before aggregation.
//!
//! Cancellation is checked once before each path starts.
//! ─────────────────────────────────────────────────────────────────────────
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, RiskError};
use crate::models::garch::Garch11;
use crate::models::SimulationParams;
use crate::risk::{aggregate_terminal_prices, HistogramBin, Percentiles, Probabilities};
use crate::rng::{RandomSource, RandomStreams};

pub const DT: f64 = 1.0 / 252.0;
pub const PRICE_FLOOR: f64 = 0.01;

/// Shared flag polled between paths.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// num_paths × (num_steps + 1); column 0 is the seed price
    pub paths: Array2<f64>,
    pub probabilities: Probabilities,
    pub histogram: Vec<HistogramBin>,
    pub percentiles: Percentiles,
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall95: f64,
    pub expected_shortfall99: f64,
    /// Seed volatility the paths started from
    pub current_volatility: f64,
    /// Expected terminal price (mean over paths)
    pub trend: f64,
    pub drift: f64,
}

impl SimulationResult {
    /// Last price of every path, in path order.
    pub fn terminal_prices(&self) -> Vec<f64> {
        match self.paths.ncols() {
            0 => Vec::new(),
            n => self.paths.column(n - 1).to_vec(),
        }
    }
}

fn validate_inputs(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
) -> Result<()> {
    params.validate()?;
    if !initial_price.is_finite() || initial_price <= 0.0 {
        return Err(RiskError::Input(format!("initial price must be > 0, got {initial_price}")));
    }
    if !initial_volatility.is_finite() || initial_volatility <= 0.0 {
        return Err(RiskError::Input(format!(
            "initial volatility must be > 0, got {initial_volatility}"
        )));
    }
    if !drift.is_finite() {
        return Err(RiskError::Input(format!("drift must be finite, got {drift}")));
    }
    Ok(())
}

/// One path of `num_steps + 1` prices starting at `initial_price`.
fn simulate_path<R: RandomSource>(
    rng: &mut R,
    initial_price: f64,
    mut garch: Garch11,
    drift: f64,
    num_steps: usize,
) -> Vec<f64> {
    let sqrt_dt = DT.sqrt();
    let mut path = Vec::with_capacity(num_steps + 1);
    let mut price = initial_price;
    path.push(price);

    for _ in 0..num_steps {
        let z = rng.next_standard_normal();
        let vol = garch.sigma();
        let ret = drift * DT - 0.5 * vol * vol * DT + vol * sqrt_dt * z;

        price = (price * ret.exp()).max(PRICE_FLOOR);
        path.push(price);

        garch.update(ret);
    }
    path
}

/// Map phase: every path on its own stream. `None` when cancelled.
fn generate_paths<S: RandomStreams>(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
    streams: &S,
    cancel: &CancelToken,
) -> Option<Vec<Vec<f64>>> {
    let seed_garch = Garch11::anchored(params.garch(), initial_volatility * initial_volatility);
    let num_steps = params.num_steps;

    (0..params.num_paths)
        .into_par_iter()
        .map(|i| {
            if cancel.is_cancelled() {
                return None;
            }
            let mut rng = streams.stream(i as u64);
            Some(simulate_path(&mut rng, initial_price, seed_garch, drift, num_steps))
        })
        .collect()
}

pub fn run_monte_carlo_simulation<S: RandomStreams>(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
    streams: &S,
) -> Result<SimulationResult> {
    run_monte_carlo_simulation_with_cancel(
        initial_price,
        params,
        initial_volatility,
        drift,
        streams,
        &CancelToken::new(),
    )
}

pub fn run_monte_carlo_simulation_with_cancel<S: RandomStreams>(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
    streams: &S,
    cancel: &CancelToken,
) -> Result<SimulationResult> {
    validate_inputs(initial_price, params, initial_volatility, drift)?;

    let started = Instant::now();
    debug!(
        "Monte Carlo: paths={} steps={} P0={:.4} σ0={:.6} μ={:.6}",
        params.num_paths, params.num_steps, initial_price, initial_volatility, drift
    );

    let generated =
        generate_paths(initial_price, params, initial_volatility, drift, streams, cancel);
    let Some(paths) = generated else {
        warn!("Monte Carlo cancelled before all {} paths finished", params.num_paths);
        return Err(RiskError::Cancelled);
    };

    // ── Reduce ────────────────────────────────────────────────────────────
    let terminal: Vec<f64> = paths.iter().filter_map(|p| p.last().copied()).collect();
    let risk = aggregate_terminal_prices(&terminal, initial_price)?;

    let cols = params.num_steps + 1;
    let flat: Vec<f64> = paths.into_iter().flatten().collect();
    let paths = Array2::from_shape_vec((params.num_paths, cols), flat)
        .map_err(|e| RiskError::Input(format!("path matrix shape: {e}")))?;

    info!(
        "Monte Carlo done: {} paths × {} steps in {:.1?}  VaR95={:.4} ES95={:.4}",
        params.num_paths,
        params.num_steps,
        started.elapsed(),
        risk.var95,
        risk.expected_shortfall95
    );

    Ok(SimulationResult {
        paths,
        probabilities: risk.probabilities,
        histogram: risk.histogram,
        percentiles: risk.percentiles,
        var95: risk.var95,
        var99: risk.var99,
        expected_shortfall95: risk.expected_shortfall95,
        expected_shortfall99: risk.expected_shortfall99,
        current_volatility: initial_volatility,
        trend: risk.mean_terminal,
        drift,
    })
}
