use super::chart_series::{BacktestSeries, ChartSeries, format_day};
use crate::config::ForecastSettings;
use crate::domain::errors::{ForecastError, MarketDataError, TickerError};
use crate::domain::market::candle::PriceHistory;
use crate::domain::market::ticker::Ticker;
use crate::domain::ml::evaluator::{EvaluationResult, evaluate};
use crate::domain::ml::forecaster::Forecaster;
use crate::domain::ml::scaler::ScalerState;
use crate::domain::ml::window::build_windows;
use crate::domain::ports::{HistoricalDataService, SequencePredictor};
use crate::domain::validation::data_quality::StrictCandleValidator;
use crate::infrastructure::observability::Metrics;
use chrono::Utc;
use ndarray::s;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the min/max ranges come from.
#[derive(Debug, Clone)]
pub enum ScalerSource {
    /// Fit on each request's backtest corpus
    FitPerRequest,
    /// Ranges saved at training time
    Persisted(Arc<ScalerState>),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ticker(#[from] TickerError),

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Label used for the request outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            PipelineError::Ticker(_) => "bad_request",
            PipelineError::MarketData(MarketDataError::NoData { .. }) => "not_found",
            PipelineError::MarketData(MarketDataError::Timeout { .. }) => "timeout",
            PipelineError::MarketData(_) => "upstream_error",
            PipelineError::Forecast(
                ForecastError::InsufficientData { .. } | ForecastError::DegenerateScale { .. },
            ) => "unprocessable",
            PipelineError::Forecast(_) | PipelineError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockPrediction {
    pub ticker: Ticker,
    pub current_price: f64,
    /// `None` when the history is too short for a single backtest window
    pub evaluation: Option<EvaluationResult>,
    /// Predicted closes for the next `horizon` days, in price units
    pub forecast: Vec<f64>,
    pub horizon: usize,
    pub series: ChartSeries,
    pub model: String,
    /// Ranges used for this prediction, kept so callers can persist them
    pub scaler: Arc<ScalerState>,
}

impl StockPrediction {
    /// JSON body shared by the HTTP API and the CLI.
    pub fn response_body(&self) -> Value {
        let mut body = json!({
            "status": "success",
            "ticker": self.ticker,
            "current_price": self.current_price,
            "mse": self.evaluation.map(|e| e.mse),
            "rmse": self.evaluation.map(|e| e.rmse),
            "r2": self.evaluation.and_then(|e| e.r2),
            "model": self.model,
            "series": self.series,
        });
        body[format!("next_{}_days_prediction", self.horizon)] = json!(self.forecast);
        body
    }
}

/// Fetch, backtest and forecast for one ticker.
pub struct StockForecastService {
    data_service: Arc<dyn HistoricalDataService>,
    predictor: Arc<dyn SequencePredictor>,
    scaler_source: ScalerSource,
    settings: ForecastSettings,
    metrics: Option<Metrics>,
}

impl StockForecastService {
    pub fn new(
        data_service: Arc<dyn HistoricalDataService>,
        predictor: Arc<dyn SequencePredictor>,
        scaler_source: ScalerSource,
        settings: ForecastSettings,
    ) -> anyhow::Result<Self> {
        settings.validate()?;
        let layout = settings.layout();

        if predictor.lookback() != settings.lookback {
            anyhow::bail!(
                "Model {} expects lookback {}, configured LOOKBACK is {}",
                predictor.name(),
                predictor.lookback(),
                settings.lookback
            );
        }
        if predictor.feature_count() != layout.feature_count() {
            anyhow::bail!(
                "Model {} expects {} features, FEATURE_MODE provides {}",
                predictor.name(),
                predictor.feature_count(),
                layout.feature_count()
            );
        }
        match &scaler_source {
            ScalerSource::Persisted(state) if state.feature_count() != layout.feature_count() => {
                anyhow::bail!(
                    "Scaler has {} features, FEATURE_MODE provides {}",
                    state.feature_count(),
                    layout.feature_count()
                );
            }
            ScalerSource::FitPerRequest if !layout.is_univariate() => {
                anyhow::bail!("Multivariate forecasting requires a persisted scaler (SCALER_PATH)");
            }
            _ => {}
        }

        Ok(Self {
            data_service,
            predictor,
            scaler_source,
            settings,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    pub fn data_source_name(&self) -> &str {
        self.data_service.name()
    }

    /// Validates `raw_ticker` and runs the full pipeline.
    pub async fn predict(&self, raw_ticker: &str) -> Result<StockPrediction, PipelineError> {
        let result = self.predict_inner(raw_ticker).await;
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(prediction) => {
                    metrics.inc_predictions("ok");
                    if let Some(eval) = prediction.evaluation {
                        metrics.set_backtest_rmse(prediction.ticker.as_str(), eval.rmse);
                    }
                }
                Err(e) => metrics.inc_predictions(e.outcome()),
            }
        }
        result
    }

    async fn predict_inner(&self, raw_ticker: &str) -> Result<StockPrediction, PipelineError> {
        let ticker = Ticker::parse(raw_ticker)?;

        let fetch_started = Instant::now();
        let end = Utc::now();
        let start = self.settings.history_start(end).ok_or_else(|| {
            PipelineError::Internal(format!(
                "HISTORY_YEARS {} is out of range",
                self.settings.history_years
            ))
        })?;
        let raw = self
            .data_service
            .get_daily_history(&ticker, start, end)
            .await?;
        self.observe("fetch", fetch_started);

        let history = StrictCandleValidator::sanitize(&raw);
        if history.is_empty() {
            return Err(MarketDataError::NoData {
                symbol: ticker.to_string(),
            }
            .into());
        }
        debug!(
            "StockForecastService: {} candles for {} from {}",
            history.len(),
            ticker,
            self.data_service.name()
        );

        let compute_started = Instant::now();
        let predictor = Arc::clone(&self.predictor);
        let scaler_source = self.scaler_source.clone();
        let settings = self.settings.clone();
        let prediction = tokio::task::spawn_blocking(move || {
            run_forecast(&history, predictor.as_ref(), &scaler_source, &settings)
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("Forecast task failed: {}", e)))??;
        self.observe("compute", compute_started);

        if let Some(metrics) = &self.metrics {
            let windows = prediction.evaluation.map(|e| e.samples).unwrap_or(0);
            metrics.inc_predictor_calls(self.predictor.name(), "batch", windows as u64);
            metrics.inc_predictor_calls(self.predictor.name(), "step", prediction.horizon as u64);
        }

        info!(
            "StockForecastService: {} current={:.2} rmse={} next={:?}",
            prediction.ticker,
            prediction.current_price,
            prediction
                .evaluation
                .map(|e| format!("{:.4}", e.rmse))
                .unwrap_or_else(|| "n/a".to_string()),
            prediction.forecast
        );
        Ok(prediction)
    }

    fn observe(&self, stage: &str, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.observe_stage(stage, started.elapsed().as_secs_f64());
        }
    }
}

/// CPU part of the pipeline: split, scale, backtest, forecast.
pub fn run_forecast(
    history: &PriceHistory,
    predictor: &dyn SequencePredictor,
    scaler_source: &ScalerSource,
    settings: &ForecastSettings,
) -> Result<StockPrediction, ForecastError> {
    let layout = settings.layout();
    let target_index = layout.target_index();
    let lookback = settings.lookback;

    let current_price = history
        .last_close()
        .ok_or(ForecastError::InsufficientData {
            required: 1,
            available: 0,
        })?;

    let matrix = layout.history_matrix(history);
    let split = (history.len() as f64 * settings.train_split).floor() as usize;
    let corpus_start = split.saturating_sub(lookback);
    let corpus = matrix.slice(s![corpus_start.., ..]);

    let scaler = match scaler_source {
        ScalerSource::FitPerRequest => Arc::new(ScalerState::fit(corpus, &layout.names())?),
        ScalerSource::Persisted(state) => Arc::clone(state),
    };

    // Backtest over the held-out part, seeded with the tail of the training part
    let normalized_corpus = scaler.transform(corpus)?;
    let windows = build_windows(normalized_corpus.view(), lookback, target_index);
    let mut backtest = None;
    let evaluation = if windows.is_empty() {
        warn!(
            "Backtest skipped for {}: {} rows in corpus, lookback {}",
            history.ticker(),
            normalized_corpus.nrows(),
            lookback
        );
        None
    } else {
        let normalized_predictions = predictor.predict_batch(&windows.windows)?;
        if let Some((i, v)) = normalized_predictions
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ForecastError::Prediction {
                reason: format!("non-finite backtest output {} for window {}", v, i),
            });
        }
        let predicted = scaler.inverse_transform_column(target_index, &normalized_predictions)?;
        let actual = scaler.inverse_transform_column(target_index, &windows.targets)?;
        let result = evaluate(&predicted, &actual)?;

        let first_target = corpus_start + lookback;
        let dates = history.candles()[first_target..first_target + actual.len()]
            .iter()
            .map(|c| format_day(c.timestamp))
            .collect();
        backtest = Some(BacktestSeries {
            dates,
            actual,
            predicted,
        });
        Some(result)
    };

    // Forecast from the end of the full history with the same ranges
    let normalized_full = scaler.transform(matrix.view())?;
    let steps = Forecaster::new(predictor, &scaler, target_index)
        .with_strategy(settings.reconstruction)
        .forecast(normalized_full.view(), settings.horizon)?;
    let forecast = steps.iter().map(|s| s.value).collect();

    let mut series = ChartSeries::from_history(history, &settings.moving_average_periods);
    if let Some(bt) = backtest {
        series = series.with_backtest(bt);
    }

    Ok(StockPrediction {
        ticker: history.ticker().clone(),
        current_price,
        evaluation,
        forecast,
        horizon: settings.horizon,
        series,
        model: format!("{} {}", predictor.name(), predictor.version()),
        scaler,
    })
}
