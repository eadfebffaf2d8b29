//! engine.rs — End-to-end risk pipeline
//!
//! ```text
//! ARCHITECTURE
//! ┌─────────────────────────────────────────────────────┐
//! │  PricePoint[]                                       │
//! │        │                                            │
//! │        ▼                                            │
//! │  calculate_returns ──────────────┐                  │
//! │        │                         │                  │
//! │   ┌────┴─────────────┐           │                  │
//! │   │ GARCH σ_t        │           │                  │
//! │   │ trend / drift    │           │                  │
//! │   │ Markov regimes   │           │                  │
//! │   └────┬─────────────┘           │                  │
//! │        │ σ_last, μ               │                  │
//! │        ▼                         ▼                  │
//! │  Monte Carlo → aggregate    performance metrics     │
//! │  stress scenarios           regime analysis         │
//! └─────────────────────────────────────────────────────┘
//!
//! Nothing here keeps state between calls; every report is rebuilt from
//! its inputs.
//! ```

use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::data::{calculate_returns, PricePoint};
use crate::error::{Result, RiskError};
use crate::metrics::{calculate_performance_metrics_with_rate, PerformanceMetrics};
use crate::models::garch::{
    calculate_garch_volatility, classify_volatility, garch_filter, VolRegime,
};
use crate::models::regime::{analyze_regime, generate_markov_regime, RegimeAnalysis};
use crate::models::trend::{calculate_trend_and_drift, TrendDrift};
use crate::models::SimulationParams;
use crate::rng::RandomStreams;
use crate::simulation::{run_monte_carlo_simulation_with_cancel, CancelToken, SimulationResult};
use crate::stress::{run_stress_test_with_cancel, StressResult, StressScenario};

/// Stream index reserved for the regime generator; path streams use
/// `0..num_paths`.
pub const REGIME_STREAM: u64 = u64::MAX;

/// Everything the pipeline needs besides the random streams.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prices: Vec<PricePoint>,
    pub params: SimulationParams,
    pub benchmark_returns: Option<Vec<f64>>,
    pub scenarios: Vec<StressScenario>,
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub initial_price: f64,
    pub return_count: usize,
    pub latest_volatility: f64,
    /// σ forecast `num_steps` bars ahead
    pub volatility_forecast: f64,
    pub volatility_regime: VolRegime,
    pub trend_drift: TrendDrift,
    pub simulation: SimulationResult,
    pub stress: Vec<StressResult>,
    pub performance: PerformanceMetrics,
    pub regimes: RegimeAnalysis,
}

pub fn analyze_prices<S: RandomStreams>(
    request: &AnalysisRequest,
    streams: &S,
) -> Result<AnalysisReport> {
    analyze_prices_with_cancel(request, streams, &CancelToken::new())
}

pub fn analyze_prices_with_cancel<S: RandomStreams>(
    request: &AnalysisRequest,
    streams: &S,
    cancel: &CancelToken,
) -> Result<AnalysisReport> {
    let params = &request.params;
    params.validate()?;

    let returns = calculate_returns(&request.prices)?;
    let initial_price = match request.prices.last() {
        Some(p) => p.close,
        None => return Err(RiskError::Input("empty price history".into())),
    };

    // ── Estimators ────────────────────────────────────────────────────────
    let vols = calculate_garch_volatility(&returns, params.alpha, params.beta)?;
    let latest_volatility = match vols.last() {
        Some(&v) => v,
        None => return Err(RiskError::Input("no volatility estimate".into())),
    };
    let filter = garch_filter(&returns, params.garch())?;
    let volatility_forecast = filter.forecast_variance(params.num_steps).sqrt();

    let trend_drift = calculate_trend_and_drift(&request.prices, params.theta)?;

    let mut regime_rng = streams.stream(REGIME_STREAM);
    let labels = generate_markov_regime(&returns, params.switch_prob, &mut regime_rng)?;

    info!(
        "Estimators: {} returns  σ_last={:.5}  trend={:.4}  drift={:+.5}",
        returns.len(),
        latest_volatility,
        trend_drift.trend,
        trend_drift.drift
    );

    // ── Simulation branch ─────────────────────────────────────────────────
    let simulation = run_monte_carlo_simulation_with_cancel(
        initial_price,
        params,
        latest_volatility,
        trend_drift.drift,
        streams,
        cancel,
    )?;
    let stress = run_stress_test_with_cancel(
        initial_price,
        params,
        latest_volatility,
        trend_drift.drift,
        &request.scenarios,
        streams,
        cancel,
    )?;

    // ── Historical branch ─────────────────────────────────────────────────
    let performance = calculate_performance_metrics_with_rate(
        &request.prices,
        request.benchmark_returns.as_deref(),
        request.risk_free_rate,
    )?;
    let regimes = analyze_regime(&returns, &labels)?;

    Ok(AnalysisReport {
        initial_price,
        return_count: returns.len(),
        latest_volatility,
        volatility_forecast,
        volatility_regime: classify_volatility(latest_volatility),
        trend_drift,
        simulation,
        stress,
        performance,
        regimes,
    })
}

/// Run the pipeline on tokio's blocking pool so async callers never stall.
pub async fn analyze_in_background<S>(
    request: AnalysisRequest,
    streams: S,
    cancel: CancelToken,
) -> Result<AnalysisReport>
where
    S: RandomStreams + Send + 'static,
{
    tokio::task::spawn_blocking(move || analyze_prices_with_cancel(&request, &streams, &cancel))
        .await
        .map_err(|e| RiskError::Task(e.to_string()))?
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sim = &self.simulation;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  RISK ENGINE — ANALYSIS REPORT")?;
        writeln!(f, "════════════════════════════════════════════")?;
        writeln!(f, "  Last Price     : {:.4}", self.initial_price)?;
        writeln!(f, "  Returns        : {}", self.return_count)?;
        writeln!(
            f,
            "  GARCH σ (bar)  : {:.5}  ({:?})",
            self.latest_volatility, self.volatility_regime
        )?;
        writeln!(f, "  σ Forecast     : {:.5}", self.volatility_forecast)?;
        writeln!(
            f,
            "  Trend / Drift  : {:.4} / {:+.5}",
            self.trend_drift.trend, self.trend_drift.drift
        )?;
        writeln!(f, "────────────────────────────────────────────")?;
        writeln!(
            f,
            "  Paths × Steps  : {} × {}",
            sim.paths.nrows(),
            sim.paths.ncols().saturating_sub(1)
        )?;
        writeln!(f, "  Expected Price : {:.4}", sim.trend)?;
        writeln!(f, "  P(≥ +20%)      : {:.2}%", sim.probabilities.upside20 * 100.0)?;
        writeln!(f, "  P(≤ −10%)      : {:.2}%", sim.probabilities.downside10 * 100.0)?;
        for (level, value) in sim.percentiles.levels() {
            writeln!(f, "  P{:<2}            : {:.4}", level, value)?;
        }
        writeln!(f, "  VaR 95 / 99    : {:.4} / {:.4}", sim.var95, sim.var99)?;
        writeln!(
            f,
            "  ES  95 / 99    : {:.4} / {:.4}",
            sim.expected_shortfall95, sim.expected_shortfall99
        )?;
        if !self.stress.is_empty() {
            writeln!(f, "────────────────────────────────────────────")?;
            for s in &self.stress {
                writeln!(
                    f,
                    "  {:<18} VaR95={:>9.4} P(loss)={:>6.2}% MaxDD={:>6.2}%",
                    s.scenario.name,
                    s.var95,
                    s.probability_of_loss * 100.0,
                    s.max_drawdown * 100.0
                )?;
            }
        }
        writeln!(f, "────────────────────────────────────────────")?;
        write!(f, "{}", self.performance)?;
        writeln!(f, "────────────────────────────────────────────")?;
        let r = &self.regimes;
        writeln!(
            f,
            "  Bull / Bear    : {:.1}% / {:.1}%",
            r.bull_market_probability * 100.0,
            r.bear_market_probability * 100.0
        )?;
        writeln!(
            f,
            "  Avg Duration   : {:.1} / {:.1} bars",
            r.regime_duration.bull, r.regime_duration.bear
        )?;
        writeln!(
            f,
            "  Mean Return    : {:+.5} / {:+.5}",
            r.regime_returns.bull, r.regime_returns.bear
        )?;
        writeln!(
            f,
            "  Volatility     : {:.5} / {:.5}",
            r.regime_volatility.bull, r.regime_volatility.bear
        )?;
        writeln!(f, "════════════════════════════════════════════")
    }
}
