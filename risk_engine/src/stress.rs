//! Stress testing: rerun the simulator under volatility and drift shocks.
//!
//! Each scenario scales the seed volatility and shifts the drift, then
//! reduces the stressed paths to tail losses, the probability of finishing
//! below the starting price, and the worst peak-to-trough decline seen on
//! any single path.
//!
//! Every scenario draws from the same [`RandomStreams`], so scenario
//! differences come from the shocks rather than from sampling noise.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RiskError};
use crate::metrics::drawdown_of;
use crate::models::SimulationParams;
use crate::rng::RandomStreams;
use crate::simulation::{run_monte_carlo_simulation_with_cancel, CancelToken};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    pub name: String,
    /// Multiplier on the seed volatility
    pub volatility_shock: f64,
    /// Added to the drift
    pub drift_shock: f64,
    /// Carried for multi-asset callers; a single-asset run ignores it
    pub correlation_shock: f64,
}

impl StressScenario {
    pub fn new(name: impl Into<String>, volatility_shock: f64, drift_shock: f64) -> Self {
        Self {
            name: name.into(),
            volatility_shock,
            drift_shock,
            correlation_shock: 0.0,
        }
    }

    pub fn with_correlation_shock(mut self, shock: f64) -> Self {
        self.correlation_shock = shock;
        self
    }

    /// Built-in scenarios used by the report when none are configured.
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::new("Market Crash", 3.0, -0.30).with_correlation_shock(0.5),
            Self::new("Volatility Spike", 2.0, 0.0),
            Self::new("Bear Market", 1.5, -0.15),
            Self::new("Liquidity Crunch", 2.5, -0.10).with_correlation_shock(0.3),
        ]
    }

    fn validate(&self) -> Result<()> {
        if !(self.volatility_shock.is_finite() && self.volatility_shock > 0.0) {
            return Err(RiskError::ParameterRange(format!(
                "scenario '{}': volatility shock must be > 0, got {}",
                self.name, self.volatility_shock
            )));
        }
        if !self.drift_shock.is_finite() {
            return Err(RiskError::ParameterRange(format!(
                "scenario '{}': drift shock must be finite, got {}",
                self.name, self.drift_shock
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub scenario: StressScenario,
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall95: f64,
    pub expected_shortfall99: f64,
    /// Fraction of terminal prices strictly below the initial price
    pub probability_of_loss: f64,
    /// Largest peak-to-trough decline over all paths (positive fraction)
    pub max_drawdown: f64,
}

pub fn run_stress_test<S: RandomStreams>(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
    scenarios: &[StressScenario],
    streams: &S,
) -> Result<Vec<StressResult>> {
    run_stress_test_with_cancel(
        initial_price,
        params,
        initial_volatility,
        drift,
        scenarios,
        streams,
        &CancelToken::new(),
    )
}

pub fn run_stress_test_with_cancel<S: RandomStreams>(
    initial_price: f64,
    params: &SimulationParams,
    initial_volatility: f64,
    drift: f64,
    scenarios: &[StressScenario],
    streams: &S,
    cancel: &CancelToken,
) -> Result<Vec<StressResult>> {
    // All scenarios are checked before the first run
    params.validate()?;
    for scenario in scenarios {
        scenario.validate()?;
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let stressed_vol = initial_volatility * scenario.volatility_shock;
        let stressed_drift = drift + scenario.drift_shock;

        let sim = run_monte_carlo_simulation_with_cancel(
            initial_price,
            params,
            stressed_vol,
            stressed_drift,
            streams,
            cancel,
        )?;

        let terminal = sim.terminal_prices();
        let losses = terminal.iter().filter(|&&p| p < initial_price).count();
        let probability_of_loss = losses as f64 / terminal.len() as f64;

        let max_drawdown = sim
            .paths
            .rows()
            .into_iter()
            .map(|row| -drawdown_of(row.iter().copied()))
            .fold(0.0, f64::max);

        info!(
            "Stress [{}]: σ×{:.2} μ{:+.3}  VaR95={:.4} P(loss)={:.1}% MaxDD={:.1}%",
            scenario.name,
            scenario.volatility_shock,
            scenario.drift_shock,
            sim.var95,
            probability_of_loss * 100.0,
            max_drawdown * 100.0
        );

        results.push(StressResult {
            scenario: scenario.clone(),
            var95: sim.var95,
            var99: sim.var99,
            expected_shortfall95: sim.expected_shortfall95,
            expected_shortfall99: sim.expected_shortfall99,
            probability_of_loss,
            max_drawdown,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{CyclicStreams, SeededStreams};
    use crate::simulation::{run_monte_carlo_simulation, PRICE_FLOOR};

    fn params() -> SimulationParams {
        SimulationParams { num_paths: 400, num_steps: 60, ..Default::default() }
    }

    #[test]
    fn one_result_per_scenario_in_order() {
        let scenarios = StressScenario::standard_set();
        let streams = SeededStreams::new(3);
        let results = run_stress_test(100.0, &params(), 0.25, 0.0, &scenarios, &streams).unwrap();
        assert_eq!(results.len(), scenarios.len());
        for (r, s) in results.iter().zip(&scenarios) {
            assert_eq!(&r.scenario, s);
            assert!((0.0..=1.0).contains(&r.probability_of_loss));
            assert!((0.0..1.0).contains(&r.max_drawdown));
            assert!(r.expected_shortfall95 >= r.var95);
        }
    }

    #[test]
    fn unit_shock_matches_plain_simulation() {
        let streams = SeededStreams::new(17);
        let base = run_monte_carlo_simulation(100.0, &params(), 0.25, 0.02, &streams).unwrap();
        let stressed = run_stress_test(
            100.0,
            &params(),
            0.25,
            0.02,
            &[StressScenario::new("Baseline", 1.0, 0.0)],
            &streams,
        )
        .unwrap();
        assert_eq!(stressed[0].var95, base.var95);
        assert_eq!(stressed[0].expected_shortfall99, base.expected_shortfall99);
    }

    #[test]
    fn higher_volatility_widens_tail() {
        let streams = SeededStreams::new(21);
        let results = run_stress_test(
            100.0,
            &params(),
            0.2,
            0.0,
            &[StressScenario::new("Calm", 1.0, 0.0), StressScenario::new("Storm", 3.0, 0.0)],
            &streams,
        )
        .unwrap();
        assert!(results[1].var95 > results[0].var95);
        assert!(results[1].max_drawdown > results[0].max_drawdown);
    }

    #[test]
    fn invalid_scenario_rejected_before_any_run() {
        let scenarios = [
            StressScenario::new("ok", 1.0, 0.0),
            StressScenario::new("bad", 0.0, 0.0),
        ];
        let r = run_stress_test(100.0, &params(), 0.2, 0.0, &scenarios, &SeededStreams::new(1));
        assert!(matches!(r, Err(RiskError::ParameterRange(_))));
    }

    #[test]
    fn zero_shock_paths_lose_deterministically() {
        let streams = CyclicStreams::new(&[0.0]);
        let p = params();
        let base = run_monte_carlo_simulation(100.0, &p, 0.25, 0.0, &streams).unwrap();
        let flat = [StressScenario::new("Flat", 1.0, 0.0)];
        let results = run_stress_test(100.0, &p, 0.25, 0.0, &flat, &streams).unwrap();

        // z = 0 on every step, so each path slides down by ½σ²Δt per bar
        let terminal = base.paths[[0, p.num_steps]];
        assert!(terminal < 100.0);
        assert_eq!(results[0].probability_of_loss, 1.0);
        assert!((results[0].max_drawdown - (1.0 - terminal / 100.0)).abs() < 1e-12);
    }

    #[test]
    fn terminal_equal_to_initial_is_not_a_loss() {
        // Starting at the floor with σ at its cap pins every price to the floor
        let results = run_stress_test(
            PRICE_FLOOR,
            &params(),
            100.0,
            0.0,
            &[StressScenario::new("Pinned", 1.0, 0.0)],
            &CyclicStreams::new(&[0.0]),
        )
        .unwrap();
        assert_eq!(results[0].probability_of_loss, 0.0);
        assert_eq!(results[0].max_drawdown, 0.0);
    }

    #[test]
    fn empty_scenario_list() {
        let r = run_stress_test(100.0, &params(), 0.2, 0.0, &[], &SeededStreams::new(1)).unwrap();
        assert!(r.is_empty());
    }
}
