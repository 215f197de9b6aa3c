use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::models::{RiskLevel, Signal};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Shared, read-only settings for one scoring run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub window_length_days: i64,
    pub weights: SignalWeights,
    pub risk_thresholds: RiskThresholds,
    pub recommendation_trigger_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_length_days: 30,
            weights: SignalWeights::default(),
            risk_thresholds: RiskThresholds::default(),
            recommendation_trigger_threshold: 10.0,
        }
    }
}

impl EngineConfig {
    /// Reads a TOML file. Missing keys keep their defaults; the result is validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_window_length(mut self, days: i64) -> Self {
        self.window_length_days = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_length_days < 1 {
            return Err(EngineError::InvalidConfiguration(format!(
                "window_length_days must be at least 1, got {}",
                self.window_length_days
            )));
        }
        self.weights.validate()?;
        self.risk_thresholds.validate()?;

        let trigger = self.recommendation_trigger_threshold;
        if !trigger.is_finite() || trigger < 0.0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "recommendation_trigger_threshold must be a non-negative number, got {trigger}"
            )));
        }
        Ok(())
    }
}

/// Per-signal weights for the composite score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalWeights {
    pub progress: f64,
    pub frequency: f64,
    pub sentiment: f64,
    pub quality: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            progress: 0.30,
            frequency: 0.30,
            sentiment: 0.20,
            quality: 0.20,
        }
    }
}

impl SignalWeights {
    pub fn weight(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Progress => self.progress,
            Signal::Frequency => self.frequency,
            Signal::Sentiment => self.sentiment,
            Signal::Quality => self.quality,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for signal in Signal::ALL {
            let weight = self.weight(signal);
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{signal} weight must be between 0.0 and 1.0, got {weight}"
                )));
            }
        }

        let sum: f64 = Signal::ALL.iter().map(|signal| self.weight(*signal)).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::InvalidConfiguration(format!(
                "signal weights must sum to 1.0, but sum to {sum:.3}"
            )));
        }
        Ok(())
    }
}

/// Lower score bounds (inclusive) of the High and Medium levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskThresholds {
    pub high: u8,
    pub medium: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 60,
            medium: 30,
        }
    }
}

impl RiskThresholds {
    pub fn level_for(&self, score: u8) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.high > 100 || self.medium > self.high {
            return Err(EngineError::InvalidConfiguration(format!(
                "risk thresholds must satisfy 0 <= medium <= high <= 100, got medium {} and high {}",
                self.medium, self.high
            )));
        }
        Ok(())
    }
}
