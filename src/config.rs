//! Detector configuration
//!
//! Thresholds are the live, host-adjustable surface. Tuning constants and
//! window durations default to the values the detector was calibrated with;
//! they are exposed so hosts can persist and tweak them, not re-derived.

use crate::error::GestureError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default blink threshold (mean of both eyes)
pub const DEFAULT_BLINK_THRESHOLD: f64 = 0.5;
/// Default mouth-open threshold
pub const DEFAULT_MOUTH_THRESHOLD: f64 = 0.5;
/// Default brow raise threshold (delta above baseline)
pub const DEFAULT_BROW_HIGH_THRESHOLD: f64 = 0.3;

/// Per-gesture trigger thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub blink: f64,
    pub mouth: f64,
    /// Brow delta that fires a raise; the release level is derived from it
    pub brow_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blink: DEFAULT_BLINK_THRESHOLD,
            mouth: DEFAULT_MOUTH_THRESHOLD,
            brow_high: DEFAULT_BROW_HIGH_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), GestureError> {
        check_unit("blink", self.blink)?;
        check_unit("mouth", self.mouth)?;
        check_unit("brow_high", self.brow_high)?;
        Ok(())
    }

    /// Return a copy with any overridden values replaced
    pub fn apply(&self, overrides: &ThresholdOverrides) -> Self {
        Self {
            blink: overrides.blink.unwrap_or(self.blink),
            mouth: overrides.mouth.unwrap_or(self.mouth),
            brow_high: overrides.brow_high.unwrap_or(self.brow_high),
        }
    }
}

/// Partial threshold update carried by a frame record or a CLI flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blink: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brow_high: Option<f64>,
}

impl ThresholdOverrides {
    pub fn is_empty(&self) -> bool {
        self.blink.is_none() && self.mouth.is_none() && self.brow_high.is_none()
    }
}

/// Brow hysteresis and baseline smoothing constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowTuning {
    /// Release threshold as a fraction of the raise threshold
    pub low_ratio: f64,
    /// Minimum release threshold
    pub low_floor: f64,
    /// Idle drift only runs while |delta| is below this fraction of the release threshold
    pub drift_guard: f64,
    /// Smoothing factor during the calibration window
    pub calibration_alpha: f64,
    /// Smoothing factor for idle drift
    pub drift_alpha: f64,
}

impl Default for BrowTuning {
    fn default() -> Self {
        Self {
            low_ratio: 0.4,
            low_floor: 0.05,
            drift_guard: 0.8,
            calibration_alpha: 0.35,
            drift_alpha: 0.03,
        }
    }
}

impl BrowTuning {
    /// Release threshold derived from the raise threshold
    pub fn low_threshold(&self, high: f64) -> f64 {
        self.low_floor.max(high * self.low_ratio)
    }

    fn validate(&self) -> Result<(), GestureError> {
        for (name, value) in [
            ("low_ratio", self.low_ratio),
            ("low_floor", self.low_floor),
            ("drift_guard", self.drift_guard),
            ("calibration_alpha", self.calibration_alpha),
            ("drift_alpha", self.drift_alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(GestureError::InvalidConfig(format!(
                    "brow.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Session window durations (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    /// Baseline warm-up after start or reset
    pub calibration_ms: f64,
    /// Quiet period after reset during which nothing is counted
    pub pause_after_reset_ms: f64,
    /// How long a brow must stay released before it re-arms
    pub release_confirm_ms: f64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            calibration_ms: 800.0,
            pause_after_reset_ms: 400.0,
            release_confirm_ms: 150.0,
        }
    }
}

impl SessionTiming {
    fn validate(&self) -> Result<(), GestureError> {
        for (name, value) in [
            ("calibration_ms", self.calibration_ms),
            ("pause_after_reset_ms", self.pause_after_reset_ms),
            ("release_confirm_ms", self.release_confirm_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(GestureError::InvalidConfig(format!(
                    "timing.{name} must be a non-negative duration, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub thresholds: Thresholds,
    pub brow: BrowTuning,
    pub timing: SessionTiming,
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), GestureError> {
        self.thresholds.validate()?;
        self.brow.validate()?;
        self.timing.validate()
    }

    /// Load configuration from JSON; missing sections take defaults
    pub fn from_json(json: &str) -> Result<Self, GestureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, GestureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, GestureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), GestureError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GestureError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_low_threshold_derivation() {
        let tuning = BrowTuning::default();
        assert!((tuning.low_threshold(0.3) - 0.12).abs() < 1e-9);
        // Floor kicks in for small raise thresholds
        assert!((tuning.low_threshold(0.1) - 0.05).abs() < 1e-9);
        assert!((tuning.low_threshold(0.0) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = GestureConfig::from_json(r#"{"thresholds": {"blink": 0.4}}"#).unwrap();

        assert_eq!(config.thresholds.blink, 0.4);
        assert_eq!(config.thresholds.mouth, DEFAULT_MOUTH_THRESHOLD);
        assert_eq!(config.brow, BrowTuning::default());
        assert_eq!(config.timing, SessionTiming::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = GestureConfig::default();
        config.thresholds.brow_high = 0.25;
        config.timing.calibration_ms = 1000.0;

        let json = config.to_json().unwrap();
        let loaded = GestureConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = GestureConfig::from_json(r#"{"thresholds": {"mouth": 1.5}}"#);
        match result {
            Err(GestureError::InvalidThreshold { name, value }) => {
                assert_eq!(name, "mouth");
                assert_eq!(value, 1.5);
            }
            other => panic!("expected InvalidThreshold, got {other:?}"),
        }

        let nan = Thresholds {
            blink: f64::NAN,
            ..Thresholds::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_duration() {
        let result = GestureConfig::from_json(r#"{"timing": {"pause_after_reset_ms": -1}}"#);
        assert!(matches!(result, Err(GestureError::InvalidConfig(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let base = Thresholds::default();
        let overrides = ThresholdOverrides {
            mouth: Some(0.7),
            ..Default::default()
        };

        let applied = base.apply(&overrides);
        assert_eq!(applied.blink, base.blink);
        assert_eq!(applied.mouth, 0.7);
        assert_eq!(applied.brow_high, base.brow_high);
        assert!(!overrides.is_empty());
        assert!(ThresholdOverrides::default().is_empty());
    }
}
