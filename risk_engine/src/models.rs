pub mod garch;
pub mod regime;
pub mod trend;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_in_range, Result, RiskError};

pub const MIN_PATHS: usize = 100;
pub const MAX_PATHS: usize = 10_000;
pub const MIN_STEPS: usize = 10;
pub const MAX_STEPS: usize = 1_000;

/// GARCH(1,1) shock / persistence coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchParams {
    pub alpha: f64,
    pub beta: f64,
}

impl GarchParams {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        let params = Self { alpha, beta };
        params.validate()?;
        Ok(params)
    }

    /// α, β ∈ [0, 1] and α + β < 1 (covariance stationarity).
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("alpha", self.alpha, 0.0, 1.0)?;
        ensure_in_range("beta", self.beta, 0.0, 1.0)?;
        if self.alpha + self.beta >= 1.0 {
            return Err(RiskError::ParameterRange(format!(
                "GARCH stationarity requires alpha + beta < 1, got α={} β={}",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }
}

/// Knobs for one Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub alpha: f64,
    pub beta: f64,
    /// Mean-reversion strength toward the regression trend
    pub theta: f64,
    /// Per-step probability of a regime flip
    pub switch_prob: f64,
    pub num_paths: usize,
    pub num_steps: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            alpha: 0.10,
            beta: 0.80,
            theta: 0.05,
            switch_prob: 0.05,
            num_paths: 1_000,
            num_steps: 252,
        }
    }
}

impl SimulationParams {
    pub fn garch(&self) -> GarchParams {
        GarchParams { alpha: self.alpha, beta: self.beta }
    }

    pub fn validate(&self) -> Result<()> {
        self.garch().validate()?;
        ensure_in_range("theta", self.theta, 0.0, 1.0)?;
        ensure_in_range("switch_prob", self.switch_prob, 0.0, 1.0)?;
        if !(MIN_PATHS..=MAX_PATHS).contains(&self.num_paths) {
            return Err(RiskError::ParameterRange(format!(
                "num_paths must lie in [{MIN_PATHS}, {MAX_PATHS}], got {}",
                self.num_paths
            )));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.num_steps) {
            return Err(RiskError::ParameterRange(format!(
                "num_steps must lie in [{MIN_STEPS}, {MAX_STEPS}], got {}",
                self.num_steps
            )));
        }
        Ok(())
    }
}

pub fn validate_params(params: &SimulationParams) -> Result<()> {
    params.validate()
}
