// Service wiring shared by the binaries
pub mod bootstrap;

// Forecast pipeline orchestration
pub mod forecasting;

// Model adapters and artifact loading
pub mod ml;
