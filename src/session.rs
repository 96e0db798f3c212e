//! Gesture session controller
//!
//! A `GestureSession` owns every piece of per-subject state and evaluates one
//! frame per call, in a fixed order:
//!
//! 1. extract signals
//! 2. update the brow baseline
//! 3. update blink/mouth edge state (always)
//! 4. count events, unless the post-reset pause window is open
//! 5. return a snapshot for display
//!
//! Time is whatever monotonic millisecond value the caller supplies; the
//! session never reads a clock of its own.

use crate::baseline::{BaselineUpdate, BrowBaselineTracker};
use crate::brow::{BrowStateMachine, BrowTransition};
use crate::config::{GestureConfig, Thresholds};
use crate::debounce::EdgeDetector;
use crate::extractor::SignalExtractor;
use crate::types::{FaceResult, FrameSignals, FrameSnapshot, Gesture, GestureCounts};
use log::{debug, info};
use uuid::Uuid;

/// Stateful gesture counter for a single tracked face
#[derive(Debug, Clone)]
pub struct GestureSession {
    id: Uuid,
    config: GestureConfig,
    baseline: BrowBaselineTracker,
    blink_edge: EdgeDetector,
    mouth_edge: EdgeDetector,
    brow: BrowStateMachine,
    counts: GestureCounts,
    calibrating_until: f64,
    pause_until: f64,
    running: bool,
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureSession {
    /// Create a stopped session; call [`start`](Self::start) before feeding frames.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            baseline: BrowBaselineTracker::new(),
            blink_edge: EdgeDetector::new(),
            mouth_edge: EdgeDetector::new(),
            brow: BrowStateMachine::new(),
            counts: GestureCounts::default(),
            calibrating_until: 0.0,
            pause_until: f64::NEG_INFINITY,
            running: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn thresholds(&self) -> Thresholds {
        self.config.thresholds
    }

    /// Replace the live thresholds; takes effect on the next frame.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.config.thresholds = thresholds;
    }

    pub fn counts(&self) -> GestureCounts {
        self.counts
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline.baseline()
    }

    pub fn brow(&self) -> &BrowStateMachine {
        &self.brow
    }

    pub fn is_calibrating(&self, now: f64) -> bool {
        now < self.calibrating_until
    }

    pub fn is_paused(&self, now: f64) -> bool {
        now < self.pause_until
    }

    /// Begin (or resume) a session at `now`: re-seed the baseline, open the
    /// calibration window and re-arm the brow machine. Counts are kept.
    pub fn start(&mut self, now: f64) {
        self.baseline.clear();
        self.calibrating_until = now + self.config.timing.calibration_ms;
        self.brow.reset();
        self.pause_until = f64::NEG_INFINITY;
        self.running = true;
        info!(
            "gesture session {} started at {now:.1}ms (calibrating until {:.1}ms)",
            self.id, self.calibrating_until
        );
    }

    /// Stop evaluating frames; state is kept for a later `start`.
    pub fn stop(&mut self) {
        if self.running {
            info!("gesture session {} stopped", self.id);
        }
        self.running = false;
    }

    /// Zero the counters and re-calibrate, suppressing counting for the
    /// post-reset pause window.
    pub fn reset(&mut self, now: f64) {
        self.counts = GestureCounts::default();
        self.blink_edge.clear();
        self.mouth_edge.clear();
        self.brow.reset();
        self.baseline.clear();
        self.calibrating_until = now + self.config.timing.calibration_ms;
        self.pause_until = now + self.config.timing.pause_after_reset_ms;
        info!(
            "gesture session {} reset at {now:.1}ms (paused until {:.1}ms)",
            self.id, self.pause_until
        );
    }

    /// Evaluate one frame captured at `now` (ms).
    ///
    /// `face` is `None` when the engine found no face; this reads as all-zero
    /// signals. Frames fed to a stopped session change nothing.
    pub fn process_frame(&mut self, now: f64, face: Option<&FaceResult>) -> FrameSnapshot {
        let signals = SignalExtractor::extract(face);

        if !self.running {
            return self.idle_snapshot(now, signals, face.is_some());
        }

        let thresholds = self.config.thresholds;
        let tuning = self.config.brow;
        let brow_low = tuning.low_threshold(thresholds.brow_high);
        let calibrating = self.is_calibrating(now);

        let delta = self.baseline.seed_and_delta(signals.brow);
        let baseline_update = self.baseline.update(
            signals.brow,
            delta,
            calibrating,
            self.brow.is_idle(),
            brow_low,
            &tuning,
        );

        let blink_edge = self.blink_edge.observe(signals.blink, thresholds.blink);
        let mouth_edge = self.mouth_edge.observe(signals.mouth, thresholds.mouth);

        let paused = self.is_paused(now);
        let mut events = Vec::new();
        if !paused {
            if blink_edge {
                events.push(Gesture::Blink);
            }
            if mouth_edge {
                events.push(Gesture::Mouth);
            }
            let transition = self.brow.step(
                delta,
                now,
                thresholds.brow_high,
                brow_low,
                self.config.timing.release_confirm_ms,
            );
            if transition == BrowTransition::Raised {
                events.push(Gesture::Brow);
            }
        }

        for gesture in &events {
            self.counts.increment(*gesture);
            debug!(
                "{} counted at {now:.1}ms (total {})",
                gesture.as_str(),
                self.counts.get(*gesture)
            );
        }

        FrameSnapshot {
            timestamp_ms: now,
            signals,
            baseline: self.baseline.baseline().unwrap_or(signals.brow),
            delta,
            baseline_update,
            counts: self.counts,
            brow_phase: self.brow.phase(),
            events,
            calibrating,
            paused,
            face_present: face.is_some(),
        }
    }

    /// Snapshot of the stored state for a frame that was not evaluated
    fn idle_snapshot(&self, now: f64, signals: FrameSignals, face_present: bool) -> FrameSnapshot {
        let baseline = self.baseline.baseline();
        FrameSnapshot {
            timestamp_ms: now,
            signals,
            baseline: baseline.unwrap_or(0.0),
            delta: baseline.map_or(0.0, |base| signals.brow - base),
            baseline_update: BaselineUpdate::Frozen,
            counts: self.counts,
            brow_phase: self.brow.phase(),
            events: Vec::new(),
            calibrating: self.is_calibrating(now),
            paused: self.is_paused(now),
            face_present,
        }
    }
}
