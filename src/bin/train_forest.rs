//! Trains a SmartCore random forest on one ticker's history.
//!
//! Writes the serialized model (for `MODEL_BACKEND=smartcore`) and the scaler it
//! was trained with (for `SCALER_PATH`). Data source and forecast settings come
//! from the usual environment variables.
//!
//! # Usage
//! ```sh
//! DATA_SOURCE=csv cargo run --bin train_forest -- AAPL --output models/forest.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::PathBuf;
use stockcast::application::ml::smartcore_predictor::SmartCoreSequencePredictor;
use stockcast::config::Config;
use stockcast::domain::market::ticker::Ticker;
use stockcast::domain::ml::evaluator::evaluate;
use stockcast::domain::ml::scaler::ScalerState;
use stockcast::domain::ml::window::build_windows;
use stockcast::domain::ports::SequencePredictor;
use stockcast::domain::validation::data_quality::StrictCandleValidator;
use stockcast::infrastructure::factory::ServiceFactory;
use stockcast::infrastructure::persistence::ScalerStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker to train on
    ticker: String,

    /// Path to output model file
    #[arg(long, default_value = "models/forest.json")]
    output: PathBuf,

    /// Path to output scaler file
    #[arg(long, default_value = "models/scaler.json")]
    scaler_output: PathBuf,

    /// Number of trees in the random forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum depth of trees
    #[arg(long, default_value_t = 10)]
    max_depth: u16,

    /// Minimum samples required to split an internal node
    #[arg(long, default_value_t = 5)]
    min_split: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env()?;
    let settings = &config.forecast;
    let layout = settings.layout();
    let lookback = settings.lookback;
    let target_index = layout.target_index();

    let ticker = Ticker::parse(&args.ticker)?;
    let data_service = ServiceFactory::create_data_service(&config.data_source);
    let end = chrono::Utc::now();
    let start = settings
        .history_start(end)
        .with_context(|| format!("HISTORY_YEARS {} is out of range", settings.history_years))?;
    println!(
        "Fetching {} years of {} from {}",
        settings.history_years,
        ticker,
        data_service.name()
    );
    let history = StrictCandleValidator::sanitize(
        &data_service.get_daily_history(&ticker, start, end).await?,
    );

    let matrix = layout.history_matrix(&history);
    let split = (history.len() as f64 * settings.train_split).floor() as usize;
    let train = matrix.slice(ndarray::s![..split, ..]);
    let test = matrix.slice(ndarray::s![split.saturating_sub(lookback).., ..]);

    // Ranges come from the training part only; test values may leave [0, 1]
    let scaler = ScalerState::fit(train, &layout.names())?;
    let train_set = build_windows(scaler.transform(train)?.view(), lookback, target_index);
    let test_set = build_windows(scaler.transform(test)?.view(), lookback, target_index);
    if train_set.is_empty() {
        anyhow::bail!(
            "Not enough history: {} training rows for lookback {}",
            split,
            lookback
        );
    }
    println!(
        "Windows: {} train / {} test (lookback={}, features={})",
        train_set.len(),
        test_set.len(),
        lookback,
        layout.feature_count()
    );

    let x: Vec<Vec<f64>> = train_set.windows.iter().map(|w| w.to_f64_vec()).collect();
    let x = DenseMatrix::from_2d_vec(&x).map_err(|e| anyhow::anyhow!("Matrix error: {}", e))?;
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(args.n_trees)
        .with_max_depth(args.max_depth)
        .with_min_samples_split(args.min_split);

    println!("Training random forest ({} trees)...", args.n_trees);
    let model = RandomForestRegressor::fit(&x, &train_set.targets, params)
        .map_err(|e| anyhow::anyhow!("Random forest training failed: {}", e))?;

    let predictor = SmartCoreSequencePredictor::from_model(model, lookback, layout.feature_count());
    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    predictor
        .save(&args.output)
        .with_context(|| format!("Failed to save model to {:?}", args.output))?;
    ScalerStore::new(&args.scaler_output).save(&scaler)?;

    if !test_set.is_empty() {
        let predicted = scaler.inverse_transform_column(
            target_index,
            &predictor.predict_batch(&test_set.windows)?,
        )?;
        let actual = scaler.inverse_transform_column(target_index, &test_set.targets)?;
        let result = evaluate(&predicted, &actual)?;
        println!("\nHeld-out evaluation ({} days):", result.samples);
        println!("  MSE:  {:.4}", result.mse);
        println!("  RMSE: {:.4}", result.rmse);
        match result.r2 {
            Some(r2) => println!("  R2:   {:.4}", r2),
            None => println!("  R2:   undefined (constant actuals)"),
        }
    }

    println!("\nModel saved to {:?}", args.output);
    println!("Scaler saved to {:?}", args.scaler_output);
    Ok(())
}
