pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod risk;
pub mod rng;
pub mod simulation;
pub mod stats;
pub mod stress;

pub use data::{calculate_returns, PricePoint};
pub use engine::{analyze_in_background, analyze_prices, AnalysisReport, AnalysisRequest};
pub use error::{Result, RiskError};
pub use metrics::{calculate_performance_metrics, PerformanceMetrics};
pub use models::garch::calculate_garch_volatility;
pub use models::regime::{analyze_regime, generate_markov_regime, Regime, RegimeAnalysis};
pub use models::trend::{calculate_trend_and_drift, TrendDrift};
pub use models::{validate_params, GarchParams, SimulationParams};
pub use rng::{EntropyStreams, RandomSource, RandomStreams, SeededStreams};
pub use simulation::{run_monte_carlo_simulation, CancelToken, SimulationResult};
pub use stress::{run_stress_test, StressResult, StressScenario};
