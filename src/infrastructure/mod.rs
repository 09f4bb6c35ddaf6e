pub mod alpaca;
pub mod core;
pub mod csv_source;
pub mod factory;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod yahoo;
