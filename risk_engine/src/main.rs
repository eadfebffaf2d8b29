//! main.rs — Risk Report Entry Point
//!
//! Runs the full risk pipeline on a stored price history:
//!   1. Load config from .env
//!   2. Load price history (and optional benchmark returns) from JSON
//!   3. Run GARCH / trend / regimes → Monte Carlo → stress → performance
//!   4. Print the report, optionally write it as JSON

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use risk_engine::config::EngineConfig;
use risk_engine::data::{load_benchmark_returns, load_price_history};
use risk_engine::{
    analyze_in_background, AnalysisReport, AnalysisRequest, CancelToken, EntropyStreams,
    SeededStreams, StressScenario,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════╗");
    info!("║      RISK ENGINE  —  REPORT MODE            ║");
    info!("║  GARCH(1,1) + Monte Carlo + Stress Tests   ║");
    info!("╚══════════════════════════════════════════════╝");

    // ── Config ───────────────────────────────────────────────────────────
    let cfg = EngineConfig::from_env()?;
    let params = cfg.simulation_params().context("invalid simulation parameters")?;
    info!(
        "GARCH: α={:.2} β={:.2}  θ={:.2}  p_switch={:.2}",
        params.alpha, params.beta, params.theta, params.switch_prob
    );
    info!(
        "Monte Carlo: paths={} steps={} seed={}",
        params.num_paths,
        params.num_steps,
        cfg.seed.map(|s| s.to_string()).unwrap_or_else(|| "entropy".into())
    );

    // ── Load Data ────────────────────────────────────────────────────────
    let prices = load_price_history(&cfg.price_history_path)?;
    if prices.len() < 2 {
        anyhow::bail!(
            "Price history {} has {} bars; at least 2 are required.",
            cfg.price_history_path.display(),
            prices.len()
        );
    }
    info!(
        "Loaded {} bars  ({} → {})",
        prices.len(),
        prices.first().map(|p| p.timestamp.to_rfc3339()).unwrap_or_default(),
        prices.last().map(|p| p.timestamp.to_rfc3339()).unwrap_or_default()
    );

    let benchmark_returns = match &cfg.benchmark_returns_path {
        Some(path) => Some(load_benchmark_returns(path)?),
        None => None,
    };

    // ── Run Pipeline ─────────────────────────────────────────────────────
    let request = AnalysisRequest {
        prices,
        params,
        benchmark_returns,
        scenarios: StressScenario::standard_set(),
        risk_free_rate: cfg.risk_free_rate,
    };
    let cancel = CancelToken::new();
    let report: AnalysisReport = match cfg.seed {
        Some(seed) => analyze_in_background(request, SeededStreams::new(seed), cancel).await?,
        None => analyze_in_background(request, EntropyStreams, cancel).await?,
    };

    // ── Output ───────────────────────────────────────────────────────────
    println!("\n{}", report);

    if let Some(path) = &cfg.report_output_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
