use chrono::{DateTime, Duration, Utc};

use risk_engine::rng::CyclicStreams;
use risk_engine::{
    analyze_in_background, analyze_prices, calculate_garch_volatility, calculate_returns,
    calculate_trend_and_drift, run_monte_carlo_simulation, AnalysisRequest, CancelToken,
    RiskError, SeededStreams, SimulationParams, StressScenario,
};

fn history(n: usize) -> Vec<risk_engine::PricePoint> {
    let start = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 50.0 + 0.05 * i as f64 + 2.0 * (i as f64 * 0.3).cos();
            risk_engine::PricePoint::from_close(start + Duration::days(i as i64), close)
        })
        .collect()
}

fn request() -> AnalysisRequest {
    AnalysisRequest {
        prices: history(90),
        params: SimulationParams { num_paths: 150, num_steps: 15, ..Default::default() },
        benchmark_returns: None,
        scenarios: StressScenario::standard_set(),
        risk_free_rate: 0.02,
    }
}

#[test]
fn reference_scenario_shape() {
    let params = SimulationParams {
        alpha: 0.1,
        beta: 0.8,
        theta: 0.05,
        switch_prob: 0.05,
        num_paths: 100,
        num_steps: 10,
    };
    let r = run_monte_carlo_simulation(100.0, &params, 0.2, 0.0, &SeededStreams::new(2024))
        .unwrap();
    assert_eq!(r.paths.nrows(), 100);
    assert_eq!(r.paths.ncols(), 11);
    for row in r.paths.rows() {
        assert_eq!(row[0], 100.0);
    }
    assert_eq!(r.histogram.iter().map(|b| b.count).sum::<usize>(), 100);
}

#[test]
fn estimators_chain_on_real_shaped_history() {
    let prices = history(60);
    let returns = calculate_returns(&prices).unwrap();
    assert_eq!(returns.len(), 59);

    let vols = calculate_garch_volatility(&returns, 0.1, 0.8).unwrap();
    assert_eq!(vols.len(), returns.len());
    assert!(vols.iter().all(|v| *v > 0.0));

    let td = calculate_trend_and_drift(&prices, 0.05).unwrap();
    assert!(td.trend.is_finite() && td.drift.is_finite());
}

#[test]
fn full_pipeline_is_reproducible() {
    let a = analyze_prices(&request(), &SeededStreams::new(77)).unwrap();
    let b = analyze_prices(&request(), &SeededStreams::new(77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn fixed_stream_pipeline_runs() {
    let streams = CyclicStreams::new(&[0.13, 0.71, 0.42, 0.96, 0.05, 0.58]);
    let report = analyze_prices(&request(), &streams).unwrap();
    assert_eq!(report.simulation.paths.shape(), &[150, 16]);
}

#[test]
fn report_serializes_to_json() {
    let report = analyze_prices(&request(), &SeededStreams::new(5)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["simulation"]["var95"].is_number());
    assert_eq!(json["stress"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn background_run_matches_blocking_run() {
    let blocking = analyze_prices(&request(), &SeededStreams::new(31)).unwrap();
    let background = analyze_in_background(request(), SeededStreams::new(31), CancelToken::new())
        .await
        .unwrap();
    assert_eq!(blocking, background);
}

#[tokio::test]
async fn cancelled_background_run() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let r = analyze_in_background(request(), SeededStreams::new(1), cancel).await;
    assert_eq!(r, Err(RiskError::Cancelled));
}
