pub mod evaluator;
pub mod feature_registry;
pub mod forecaster;
pub mod scaler;
pub mod window;
