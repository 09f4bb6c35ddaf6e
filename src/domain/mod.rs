// Price history and tickers
pub mod market;

// Scaling, windowing, forecasting, evaluation
pub mod ml;

// Port interfaces
pub mod ports;

// Input data checks
pub mod validation;

// Domain-specific error types
pub mod errors;
