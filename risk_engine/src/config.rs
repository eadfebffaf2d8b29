//! config.rs — Centralised configuration loaded from .env
//!
//! All parameters consumed by the risk report are defined here.
//! Loading happens once at startup; the pipeline borrows the derived
//! `SimulationParams`.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use crate::metrics::DEFAULT_RISK_FREE_RATE;
use crate::models::SimulationParams;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // ── GARCH(1,1) ───────────────────────────────────────────────────
    /// ARCH coefficient α (shock sensitivity)
    pub garch_alpha: f64,
    /// GARCH coefficient β (variance persistence)
    pub garch_beta:  f64,

    // ── Drift / regimes ──────────────────────────────────────────────
    /// Mean-reversion strength θ toward the regression trend
    pub theta: f64,
    /// Per-step regime switch probability
    pub switch_prob: f64,

    // ── Monte Carlo ──────────────────────────────────────────────────
    pub num_paths: usize,
    pub num_steps: usize,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy
    pub seed: Option<u64>,

    // ── Performance ──────────────────────────────────────────────────
    pub risk_free_rate: f64,

    // ── Files ────────────────────────────────────────────────────────
    pub price_history_path: PathBuf,
    pub benchmark_returns_path: Option<PathBuf>,
    pub report_output_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let sim = SimulationParams::default();
        Self {
            garch_alpha: sim.alpha,
            garch_beta: sim.beta,
            theta: sim.theta,
            switch_prob: sim.switch_prob,
            num_paths: sim.num_paths,
            num_steps: sim.num_steps,
            seed: None,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            price_history_path: PathBuf::from("prices.json"),
            benchmark_returns_path: None,
            report_output_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let defaults = Self::default();
        Ok(Self {
            garch_alpha: parse_env("GARCH_ALPHA", defaults.garch_alpha)?,
            garch_beta:  parse_env("GARCH_BETA",  defaults.garch_beta)?,

            theta:       parse_env("MEAN_REVERSION_THETA", defaults.theta)?,
            switch_prob: parse_env("REGIME_SWITCH_PROB",   defaults.switch_prob)?,

            num_paths: parse_env("MC_NUM_PATHS", defaults.num_paths)?,
            num_steps: parse_env("MC_NUM_STEPS", defaults.num_steps)?,
            seed:      parse_env_opt::<u64>("MC_SEED")?,

            risk_free_rate: parse_env("RISK_FREE_RATE", defaults.risk_free_rate)?,

            price_history_path: env::var("PRICE_HISTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.price_history_path),
            benchmark_returns_path: env::var("BENCHMARK_RETURNS_PATH").ok().map(PathBuf::from),
            report_output_path:     env::var("REPORT_OUTPUT_PATH").ok().map(PathBuf::from),
        })
    }

    /// Simulation parameters, validated.
    pub fn simulation_params(&self) -> Result<SimulationParams> {
        let params = SimulationParams {
            alpha: self.garch_alpha,
            beta: self.garch_beta,
            theta: self.theta,
            switch_prob: self.switch_prob,
            num_paths: self.num_paths,
            num_steps: self.num_steps,
        };
        params.validate()?;
        Ok(params)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    Ok(parse_env_opt(key)?.unwrap_or(default))
}

fn parse_env_opt<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        Err(_) => Ok(None),
    }
}
