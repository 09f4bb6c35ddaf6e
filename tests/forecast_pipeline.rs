use rust_decimal_macros::dec;
use std::sync::Arc;
use stockcast::application::forecasting::{PipelineError, ScalerSource, StockForecastService};
use stockcast::application::ml::naive_predictor::LastValuePredictor;
use stockcast::config::{FeatureMode, ForecastSettings};
use stockcast::domain::errors::{ForecastError, MarketDataError};
use stockcast::domain::market::candle::Candle;
use stockcast::domain::ml::forecaster::ReconstructionStrategy;
use stockcast::domain::ml::scaler::{FeatureRange, ScalerState};
use stockcast::infrastructure::mock::MockHistoricalDataService;

const DAY_MS: i64 = 86_400_000;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn sine_candles(len: usize) -> Vec<Candle> {
    (0..len)
        .map(|i| {
            let close = 150.0 + 20.0 * (i as f64 / 15.0).sin();
            Candle::from_f64(i as i64 * DAY_MS, close, close + 2.0, close - 2.0, close, 1e6)
        })
        .collect()
}

fn service(
    data: MockHistoricalDataService,
    settings: ForecastSettings,
    scaler: ScalerSource,
) -> StockForecastService {
    let layout = settings.layout();
    let predictor = LastValuePredictor::new(
        settings.lookback,
        layout.feature_count(),
        layout.target_index(),
    );
    StockForecastService::new(Arc::new(data), Arc::new(predictor), scaler, settings)
        .expect("valid service wiring")
}

#[tokio::test]
async fn test_random_walk_end_to_end() -> anyhow::Result<()> {
    init_logging();

    // Default settings: 10 years, lookback 100, horizon 5, 70/30 split
    let svc = service(
        MockHistoricalDataService::new(42),
        ForecastSettings::default(),
        ScalerSource::FitPerRequest,
    );
    let prediction = svc.predict("aapl").await?;

    assert_eq!(prediction.ticker.as_str(), "AAPL");
    assert_eq!(prediction.forecast.len(), 5);
    assert_eq!(
        prediction.current_price,
        *prediction.series.close.last().unwrap()
    );

    // Persistence forecast repeats the last close
    for value in &prediction.forecast {
        assert!((value - prediction.current_price).abs() < 1e-6);
    }

    let eval = prediction.evaluation.expect("ten years leave plenty of windows");
    assert!(eval.samples > 700);
    assert!((eval.rmse - eval.mse.sqrt()).abs() < 1e-9);

    let body = prediction.response_body();
    assert_eq!(body["status"], "success");
    assert!(body["next_5_days_prediction"].is_array());
    assert!(body["rmse"].is_number());
    assert!(body["series"]["moving_averages"]["ma100"][98].is_null());
    assert!(body["series"]["moving_averages"]["ma100"][99].is_number());
    Ok(())
}

#[tokio::test]
async fn test_short_history_still_forecasts() -> anyhow::Result<()> {
    init_logging();

    let settings = ForecastSettings {
        lookback: 20,
        horizon: 3,
        ..ForecastSettings::default()
    };
    let data = MockHistoricalDataService::new(1).with_history("SHRT", sine_candles(20));
    let prediction = service(data, settings, ScalerSource::FitPerRequest)
        .predict("SHRT")
        .await?;

    assert!(prediction.evaluation.is_none());
    assert_eq!(prediction.forecast.len(), 3);
    assert!(prediction.response_body()["next_3_days_prediction"].is_array());
    Ok(())
}

#[tokio::test]
async fn test_too_short_history_is_unprocessable() {
    let settings = ForecastSettings {
        lookback: 20,
        ..ForecastSettings::default()
    };
    let data = MockHistoricalDataService::new(1).with_history("TINY", sine_candles(5));
    let err = service(data, settings, ScalerSource::FitPerRequest)
        .predict("TINY")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Forecast(ForecastError::InsufficientData {
            required: 20,
            available: 5
        })
    ));
}

#[tokio::test]
async fn test_invalid_candles_are_dropped_before_scaling() -> anyhow::Result<()> {
    let mut candles = sine_candles(60);
    candles[10].close = dec!(-1);
    candles[20].low = dec!(500);

    let settings = ForecastSettings {
        lookback: 10,
        ..ForecastSettings::default()
    };
    let data = MockHistoricalDataService::new(1).with_history("DIRTY", candles);
    let prediction = service(data, settings, ScalerSource::FitPerRequest)
        .predict("DIRTY")
        .await?;

    assert_eq!(prediction.series.close.len(), 58);
    Ok(())
}

#[tokio::test]
async fn test_multivariate_with_persisted_scaler() -> anyhow::Result<()> {
    init_logging();

    let ranges = ["Open", "High", "Low", "Close", "Volume"]
        .iter()
        .map(|name| FeatureRange {
            name: name.to_string(),
            min: if *name == "Volume" { 0.0 } else { 100.0 },
            max: if *name == "Volume" { 2e6 } else { 200.0 },
        })
        .collect();
    let settings = ForecastSettings {
        lookback: 10,
        feature_mode: FeatureMode::Multivariate,
        reconstruction: ReconstructionStrategy::CarryForward,
        ..ForecastSettings::default()
    };
    let data = MockHistoricalDataService::new(1).with_history("MULTI", sine_candles(80));
    let prediction = service(
        data,
        settings,
        ScalerSource::Persisted(Arc::new(ScalerState::from_ranges(ranges))),
    )
    .predict("MULTI")
    .await?;

    assert_eq!(prediction.forecast.len(), 5);
    assert!(prediction.evaluation.is_some());
    for value in &prediction.forecast {
        assert!((value - prediction.current_price).abs() < 1e-6);
    }
    Ok(())
}

#[tokio::test]
async fn test_unknown_ticker_and_bad_input() {
    let data = MockHistoricalDataService::new(1).with_history("KNOWN", sine_candles(30));
    let svc = service(
        data,
        ForecastSettings {
            lookback: 10,
            ..ForecastSettings::default()
        },
        ScalerSource::FitPerRequest,
    );

    assert!(matches!(
        svc.predict("ZZZZ").await,
        Err(PipelineError::MarketData(MarketDataError::NoData { .. }))
    ));
    assert!(matches!(svc.predict("BRK.B").await, Err(PipelineError::Ticker(_))));
    assert!(matches!(svc.predict("").await, Err(PipelineError::Ticker(_))));
}

#[tokio::test]
async fn test_flat_price_history_is_degenerate() {
    init_logging();

    let flat: Vec<Candle> = (0..60)
        .map(|i| Candle::from_f64(i as i64 * DAY_MS, 42.0, 42.0, 42.0, 42.0, 1e6))
        .collect();
    let svc = service(
        MockHistoricalDataService::new(1).with_history("FLAT", flat),
        ForecastSettings {
            lookback: 10,
            ..ForecastSettings::default()
        },
        ScalerSource::FitPerRequest,
    );

    let err = svc.predict("FLAT").await.unwrap_err();
    assert_eq!(err.outcome(), "unprocessable");
    match err {
        PipelineError::Forecast(ForecastError::DegenerateScale { feature }) => {
            assert_eq!(feature, "Close")
        }
        other => panic!("expected a degenerate scale, got {:?}", other),
    }
}
