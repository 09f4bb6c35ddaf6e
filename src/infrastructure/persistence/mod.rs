pub mod scaler_store;

pub use scaler_store::ScalerStore;
