//! Plot-ready series returned next to a prediction.

use crate::domain::market::candle::PriceHistory;
use serde::Serialize;
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Backtest actual vs predicted prices, aligned with `dates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestSeries {
    pub dates: Vec<String>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub close: Vec<f64>,
    /// `ma<period>` -> simple moving average, `None` until `period` closes exist
    pub moving_averages: BTreeMap<String, Vec<Option<f64>>>,
    pub backtest: Option<BacktestSeries>,
}

impl ChartSeries {
    pub fn from_history(history: &PriceHistory, periods: &[usize]) -> Self {
        let close = history.closes();
        let moving_averages = periods
            .iter()
            .map(|&p| (format!("ma{}", p), moving_average(&close, p)))
            .collect();

        Self {
            dates: history.candles().iter().map(|c| format_day(c.timestamp)).collect(),
            close,
            moving_averages,
            backtest: None,
        }
    }

    pub fn with_backtest(mut self, backtest: BacktestSeries) -> Self {
        self.backtest = Some(backtest);
        self
    }
}

/// Simple moving average over `values`; leading entries are `None`.
pub fn moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let Ok(mut sma) = SimpleMovingAverage::new(period) else {
        return vec![None; values.len()];
    };

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let avg = sma.next(v);
            (i + 1 >= period).then_some(avg)
        })
        .collect()
}

pub(crate) fn format_day(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
