// Liquidity Classifier - THIN / MEDIUM / THICK from average per-level volume
// Pure function of the two totals and the two thresholds

use crate::core::config::{CompassConfig, ConfigError};
use crate::core::types::LiquidityLabel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityClassifier {
    depth_levels: usize,
    thin_threshold: f64,
    thick_threshold: f64,
}

impl LiquidityClassifier {
    pub fn new(depth_levels: usize, thin_threshold: u32, thick_threshold: u32) -> Result<Self, ConfigError> {
        let config = CompassConfig {
            depth_levels,
            thin_threshold,
            thick_threshold,
            ..CompassConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &CompassConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            depth_levels: config.depth_levels,
            thin_threshold: f64::from(config.thin_threshold),
            thick_threshold: f64::from(config.thick_threshold),
        })
    }

    /// Average volume per level across both sides
    pub fn average(&self, bid_total: f64, ask_total: f64) -> f64 {
        (bid_total + ask_total) / (2.0 * self.depth_levels as f64)
    }

    /// A value on a threshold belongs to the higher band
    pub fn label_for_average(&self, average: f64) -> LiquidityLabel {
        if average >= self.thick_threshold {
            LiquidityLabel::Thick
        } else if average >= self.thin_threshold {
            LiquidityLabel::Medium
        } else {
            LiquidityLabel::Thin
        }
    }

    pub fn classify(&self, bid_total: f64, ask_total: f64) -> (f64, LiquidityLabel) {
        let average = self.average(bid_total, ask_total);
        (average, self.label_for_average(average))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColorToken;

    #[test]
    fn test_boundaries_inclusive() {
        let classifier = LiquidityClassifier::new(3, 10, 20).unwrap();

        assert_eq!(classifier.label_for_average(20.0), LiquidityLabel::Thick);
        assert_eq!(classifier.label_for_average(19.99), LiquidityLabel::Medium);
        assert_eq!(classifier.label_for_average(10.0), LiquidityLabel::Medium);
        assert_eq!(classifier.label_for_average(9.99), LiquidityLabel::Thin);
        assert_eq!(classifier.label_for_average(0.0), LiquidityLabel::Thin);
    }

    #[test]
    fn test_average() {
        let classifier = LiquidityClassifier::new(3, 10, 20).unwrap();
        let (avg, label) = classifier.classify(30.0, 15.0);
        assert!((avg - 7.5).abs() < 1e-9);
        assert_eq!(label, LiquidityLabel::Thin);
        assert_eq!(label.color(), ColorToken::Red);

        let (avg, label) = classifier.classify(45.0, 15.0);
        assert!((avg - 10.0).abs() < 1e-9);
        assert_eq!(label, LiquidityLabel::Medium);
    }

    #[test]
    fn test_defaults() {
        let classifier = LiquidityClassifier::from_config(&CompassConfig::default()).unwrap();
        // 10 levels per side: avg 80 needs 1600 total
        assert_eq!(classifier.classify(800.0, 800.0).1, LiquidityLabel::Thick);
        assert_eq!(classifier.classify(400.0, 400.0).1, LiquidityLabel::Medium);
        assert_eq!(classifier.classify(399.0, 400.0).1, LiquidityLabel::Thin);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(LiquidityClassifier::new(3, 20, 10).is_err());
        assert!(LiquidityClassifier::new(3, 10, 10).is_err());
        assert!(LiquidityClassifier::new(0, 10, 20).is_err());
    }
}
