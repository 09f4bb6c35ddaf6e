pub mod candle;
pub mod ticker;
