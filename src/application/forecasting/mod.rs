pub mod chart_series;
pub mod pipeline;

pub use pipeline::{PipelineError, ScalerSource, StockForecastService, StockPrediction};
