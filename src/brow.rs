//! Brow raise state machine
//!
//! A raise fires when the brow delta reaches the high threshold. The machine
//! then stays disarmed until the delta has remained at or below the derived
//! low threshold continuously for the release confirmation window. Any
//! excursion back above the low threshold restarts that window.
//!
//! ```text
//!   Idle (armed) ── delta >= high ──▶ Raised (disarmed)
//!        ▲                                  │
//!        └── delta <= low for release_ms ───┘
//! ```

use crate::types::BrowPhase;
use log::debug;
use serde::{Deserialize, Serialize};

/// Outcome of one brow step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowTransition {
    /// Nothing changed
    None,
    /// A raise was detected (count it)
    Raised,
    /// The release was confirmed and the machine re-armed
    Released,
}

/// Latched high/low hysteresis for brow raises
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowStateMachine {
    phase: BrowPhase,
    armed: bool,
    release_started_at: Option<f64>,
}

impl Default for BrowStateMachine {
    fn default() -> Self {
        Self {
            phase: BrowPhase::Idle,
            armed: true,
            release_started_at: None,
        }
    }
}

impl BrowStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BrowPhase {
        self.phase
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BrowPhase::Idle
    }

    /// Timestamp at which the current release window started, if running
    pub fn release_started_at(&self) -> Option<f64> {
        self.release_started_at
    }

    /// Return to idle and armed with no release window pending
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the machine with the brow delta observed at `now` (ms).
    pub fn step(&mut self, delta: f64, now: f64, high: f64, low: f64, release_confirm_ms: f64) -> BrowTransition {
        if self.armed && self.phase == BrowPhase::Idle {
            if delta >= high {
                self.phase = BrowPhase::Raised;
                self.armed = false;
                self.release_started_at = None;
                debug!("brow raised: delta {delta:.3} >= {high:.3} at {now:.1}ms");
                return BrowTransition::Raised;
            }
            return BrowTransition::None;
        }

        if self.armed {
            return BrowTransition::None;
        }

        if delta > low {
            if self.release_started_at.take().is_some() {
                debug!("brow release interrupted: delta {delta:.3} > {low:.3} at {now:.1}ms");
            }
            return BrowTransition::None;
        }

        match self.release_started_at {
            None => {
                self.release_started_at = Some(now);
                BrowTransition::None
            }
            Some(started) if now - started >= release_confirm_ms => {
                self.phase = BrowPhase::Idle;
                self.armed = true;
                self.release_started_at = None;
                debug!("brow released after {:.1}ms", now - started);
                BrowTransition::Released
            }
            Some(_) => BrowTransition::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HIGH: f64 = 0.3;
    const LOW: f64 = 0.12;
    const RELEASE: f64 = 150.0;

    fn run(machine: &mut BrowStateMachine, frames: &[(f64, f64)]) -> usize {
        frames
            .iter()
            .filter(|(now, delta)| machine.step(*delta, *now, HIGH, LOW, RELEASE) == BrowTransition::Raised)
            .count()
    }

    #[test]
    fn test_raise_fires_once_while_held() {
        let mut machine = BrowStateMachine::new();
        let frames: Vec<(f64, f64)> = (0..100).map(|i| (i as f64 * 16.0, 0.5)).collect();
        assert_eq!(run(&mut machine, &frames), 1);
        assert_eq!(machine.phase(), BrowPhase::Raised);
        assert!(!machine.is_armed());
    }

    #[test]
    fn test_hysteresis_band_never_counts() {
        let mut machine = BrowStateMachine::new();
        let frames: Vec<(f64, f64)> = (0..1000)
            .map(|i| (i as f64 * 16.0, if i % 2 == 0 { LOW + 0.01 } else { HIGH - 0.01 }))
            .collect();
        assert_eq!(run(&mut machine, &frames), 0);
        assert_eq!(machine.phase(), BrowPhase::Idle);
    }

    #[test]
    fn test_band_chatter_after_raise_does_not_recount() {
        let mut machine = BrowStateMachine::new();
        assert_eq!(run(&mut machine, &[(0.0, 0.4)]), 1);

        let frames: Vec<(f64, f64)> = (1..500)
            .map(|i| (i as f64 * 16.0, if i % 2 == 0 { 0.35 } else { LOW + 0.02 }))
            .collect();
        assert_eq!(run(&mut machine, &frames), 0);
        assert_eq!(machine.phase(), BrowPhase::Raised);
    }

    #[test]
    fn test_release_requires_continuous_window() {
        let mut machine = BrowStateMachine::new();
        assert_eq!(run(&mut machine, &[(0.0, 0.4)]), 1);

        // Low for 140ms, then back above the low threshold
        run(&mut machine, &[(100.0, 0.0), (170.0, 0.0), (240.0, 0.0)]);
        assert_eq!(machine.release_started_at(), Some(100.0));
        run(&mut machine, &[(250.0, 0.2)]);
        assert_eq!(machine.release_started_at(), None);
        assert_eq!(machine.phase(), BrowPhase::Raised);

        // A raise-level delta while disarmed is not counted
        assert_eq!(run(&mut machine, &[(260.0, 0.5)]), 0);

        // Low again for a full 150ms
        let transition_frames = [(300.0, 0.0), (380.0, 0.0)];
        assert_eq!(run(&mut machine, &transition_frames), 0);
        assert_eq!(machine.phase(), BrowPhase::Raised);
        assert_eq!(machine.step(0.0, 450.0, HIGH, LOW, RELEASE), BrowTransition::Released);
        assert_eq!(machine.phase(), BrowPhase::Idle);
        assert!(machine.is_armed());

        // Only a fresh crossing of the high threshold counts again
        assert_eq!(run(&mut machine, &[(466.0, 0.2), (482.0, 0.31)]), 1);
    }

    #[test]
    fn test_low_threshold_boundary_is_inclusive() {
        let mut machine = BrowStateMachine::new();
        machine.step(0.4, 0.0, HIGH, LOW, RELEASE);
        machine.step(LOW, 10.0, HIGH, LOW, RELEASE);
        assert_eq!(machine.release_started_at(), Some(10.0));
        assert_eq!(machine.step(LOW, 160.0, HIGH, LOW, RELEASE), BrowTransition::Released);
    }

    #[test]
    fn test_release_timer_starts_at_zero_timestamp() {
        let mut machine = BrowStateMachine::new();
        machine.step(0.4, -20.0, HIGH, LOW, RELEASE);
        machine.step(0.0, 0.0, HIGH, LOW, RELEASE);
        assert_eq!(machine.release_started_at(), Some(0.0));
        assert_eq!(machine.step(0.0, 150.0, HIGH, LOW, RELEASE), BrowTransition::Released);
    }

    #[test]
    fn test_reset_rearms() {
        let mut machine = BrowStateMachine::new();
        machine.step(0.4, 0.0, HIGH, LOW, RELEASE);
        machine.step(0.0, 10.0, HIGH, LOW, RELEASE);
        machine.reset();

        assert_eq!(machine.phase(), BrowPhase::Idle);
        assert!(machine.is_armed());
        assert_eq!(machine.release_started_at(), None);
    }
}
