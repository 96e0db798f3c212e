//! Brow baseline tracking
//!
//! Resting brow intensity differs per subject, so brow raises are measured
//! as a deviation from an exponentially smoothed baseline. The baseline
//! follows the signal quickly during calibration, drifts slowly while the
//! brow is idle and close to rest, and is frozen otherwise.

use crate::config::BrowTuning;
use serde::{Deserialize, Serialize};

/// Which update rule the tracker applied on a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineUpdate {
    Calibrating,
    Drifting,
    Frozen,
}

/// Exponentially smoothed brow reference level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowBaselineTracker {
    baseline: Option<f64>,
}

impl BrowBaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current baseline, if seeded
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Clear the baseline; the next frame seeds it again
    pub fn clear(&mut self) {
        self.baseline = None;
    }

    /// Seed from `brow` if unset and return the deviation against the
    /// baseline as it stood before this frame's smoothing.
    pub fn seed_and_delta(&mut self, brow: f64) -> f64 {
        let base = *self.baseline.get_or_insert(brow);
        brow - base
    }

    /// Apply this frame's smoothing update.
    ///
    /// `delta` is the value returned by [`seed_and_delta`](Self::seed_and_delta),
    /// `low_threshold` the current brow release level and `brow_idle` whether
    /// the brow machine is idle.
    pub fn update(
        &mut self,
        brow: f64,
        delta: f64,
        calibrating: bool,
        brow_idle: bool,
        low_threshold: f64,
        tuning: &BrowTuning,
    ) -> BaselineUpdate {
        let Some(base) = self.baseline else {
            // Not seeded yet; seed_and_delta runs first on every frame
            self.baseline = Some(brow);
            return BaselineUpdate::Calibrating;
        };

        let (alpha, kind) = if calibrating {
            (tuning.calibration_alpha, BaselineUpdate::Calibrating)
        } else if brow_idle && delta.abs() < low_threshold * tuning.drift_guard {
            (tuning.drift_alpha, BaselineUpdate::Drifting)
        } else {
            return BaselineUpdate::Frozen;
        };

        self.baseline = Some(base * (1.0 - alpha) + brow * alpha);
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOW: f64 = 0.12;

    fn step(tracker: &mut BrowBaselineTracker, brow: f64, calibrating: bool, idle: bool) -> BaselineUpdate {
        let delta = tracker.seed_and_delta(brow);
        tracker.update(brow, delta, calibrating, idle, LOW, &BrowTuning::default())
    }

    #[test]
    fn test_first_sample_seeds_without_lag() {
        let mut tracker = BrowBaselineTracker::new();
        assert_eq!(tracker.baseline(), None);

        let delta = tracker.seed_and_delta(0.3);
        assert_eq!(delta, 0.0);
        assert_eq!(tracker.baseline(), Some(0.3));

        tracker.update(0.3, delta, true, true, LOW, &BrowTuning::default());
        assert!((tracker.baseline().unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_uses_fast_smoothing() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);

        let kind = step(&mut tracker, 0.4, true, true);
        assert_eq!(kind, BaselineUpdate::Calibrating);
        // 0.2 * 0.65 + 0.4 * 0.35
        assert!((tracker.baseline().unwrap() - 0.27).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_ignores_brow_state() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, false);
        let kind = step(&mut tracker, 0.9, true, false);
        assert_eq!(kind, BaselineUpdate::Calibrating);
    }

    #[test]
    fn test_idle_drift_uses_slow_smoothing() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);

        // |0.25 - 0.2| = 0.05 < 0.8 * 0.12
        let kind = step(&mut tracker, 0.25, false, true);
        assert_eq!(kind, BaselineUpdate::Drifting);
        assert!((tracker.baseline().unwrap() - (0.2 * 0.97 + 0.25 * 0.03)).abs() < 1e-9);
    }

    #[test]
    fn test_frozen_on_large_deviation() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);

        // |0.31 - 0.2| = 0.11 >= 0.096
        let kind = step(&mut tracker, 0.31, false, true);
        assert_eq!(kind, BaselineUpdate::Frozen);
        assert!((tracker.baseline().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_frozen_while_raised() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);

        let kind = step(&mut tracker, 0.21, false, false);
        assert_eq!(kind, BaselineUpdate::Frozen);
        assert!((tracker.baseline().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_delta_uses_pre_update_baseline() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);

        let delta = tracker.seed_and_delta(0.4);
        assert!((delta - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_clear_reseeds() {
        let mut tracker = BrowBaselineTracker::new();
        step(&mut tracker, 0.2, true, true);
        tracker.clear();
        assert_eq!(tracker.baseline(), None);

        step(&mut tracker, 0.6, true, true);
        assert!((tracker.baseline().unwrap() - 0.6).abs() < 1e-12);
    }
}
