use crate::domain::market::candle::{Candle, PriceHistory};
use ndarray::Array2;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered list of feature names.
/// This order MUST match the column order the models were trained with.
pub const FEATURE_NAMES: &[&str] = &["Open", "High", "Low", "Close", "Volume"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Open,
        Feature::High,
        Feature::Low,
        Feature::Close,
        Feature::Volume,
    ];

    pub fn name(&self) -> &'static str {
        FEATURE_NAMES[*self as usize]
    }

    pub fn value(&self, candle: &Candle) -> f64 {
        let raw = match self {
            Feature::Open => candle.open,
            Feature::High => candle.high,
            Feature::Low => candle.low,
            Feature::Close => candle.close,
            Feature::Volume => candle.volume,
        };
        raw.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown feature: {}", s))
    }
}

/// Which columns go into a model input and which one is forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    features: Vec<Feature>,
    target: Feature,
}

impl FeatureLayout {
    /// Close price only, the shape of the original single-feature model.
    pub fn univariate() -> Self {
        Self {
            features: vec![Feature::Close],
            target: Feature::Close,
        }
    }

    /// All OHLCV columns, forecasting Close.
    pub fn multivariate() -> Self {
        Self {
            features: Feature::ALL.to_vec(),
            target: Feature::Close,
        }
    }

    pub fn new(features: Vec<Feature>, target: Feature) -> anyhow::Result<Self> {
        if !features.contains(&target) {
            anyhow::bail!("Target feature {} missing from layout {:?}", target, features);
        }
        Ok(Self { features, target })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn target(&self) -> Feature {
        self.target
    }

    pub fn target_index(&self) -> usize {
        // Constructors guarantee the target is present
        self.features
            .iter()
            .position(|f| *f == self.target)
            .unwrap_or(0)
    }

    pub fn is_univariate(&self) -> bool {
        self.features.len() == 1
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name().to_string()).collect()
    }

    /// Converts candles into a raw (unscaled) feature matrix, one row per day.
    pub fn to_matrix(&self, candles: &[Candle]) -> Array2<f64> {
        let cols = self.features.len();
        Array2::from_shape_fn((candles.len(), cols), |(row, col)| {
            self.features[col].value(&candles[row])
        })
    }

    pub fn history_matrix(&self, history: &PriceHistory) -> Array2<f64> {
        self.to_matrix(history.candles())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_candle() -> Candle {
        Candle {
            open: dec!(10),
            high: dec!(12),
            low: dec!(9),
            close: dec!(11),
            volume: dec!(5000),
            timestamp: 0,
        }
    }

    #[test]
    fn test_feature_names_consistent() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>().unwrap(), feature);
        }
        assert_eq!(Feature::ALL.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_multivariate_matrix_order() {
        let layout = FeatureLayout::multivariate();
        let m = layout.to_matrix(&[sample_candle()]);
        assert_eq!(m.shape(), &[1, 5]);
        assert_eq!(m[[0, 0]], 10.0);
        // Close is index 3
        assert_eq!(layout.target_index(), 3);
        assert_eq!(m[[0, 3]], 11.0);
        assert_eq!(m[[0, 4]], 5000.0);
    }

    #[test]
    fn test_layout_requires_target() {
        assert!(FeatureLayout::new(vec![Feature::Open], Feature::Close).is_err());
        let layout = FeatureLayout::new(vec![Feature::Volume, Feature::Close], Feature::Close)
            .unwrap();
        assert_eq!(layout.target_index(), 1);
    }
}
