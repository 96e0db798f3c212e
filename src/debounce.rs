//! Rising-edge debouncing for blink and mouth
//!
//! A gesture fires once when its signal crosses up through the threshold and
//! cannot fire again until the signal has dropped back below it.

use serde::{Deserialize, Serialize};

/// Level-crossing edge detector with a single threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDetector {
    was_above: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last observed sample was at or above its threshold
    pub fn is_above(&self) -> bool {
        self.was_above
    }

    /// Observe one sample and report whether it is a rising edge.
    ///
    /// The stored level is always updated, whether or not the caller counts
    /// the edge.
    pub fn observe(&mut self, signal: f64, threshold: f64) -> bool {
        let is_above = signal >= threshold;
        let rising = is_above && !self.was_above;
        self.was_above = is_above;
        rising
    }

    pub fn clear(&mut self) {
        self.was_above = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_edges(samples: &[f64], threshold: f64) -> usize {
        let mut edge = EdgeDetector::new();
        samples.iter().filter(|&&s| edge.observe(s, threshold)).count()
    }

    #[test]
    fn test_sustained_excursion_counts_once() {
        let samples = vec![0.9; 500];
        assert_eq!(count_edges(&samples, 0.5), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(count_edges(&[0.0, 0.5], 0.5), 1);
        assert_eq!(count_edges(&[0.0, 0.4999], 0.5), 0);
    }

    #[test]
    fn test_noise_around_threshold_counts_every_crossing() {
        // No hysteresis: each upward crossing is a new event
        let samples: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 0.49 } else { 0.51 }).collect();
        assert_eq!(count_edges(&samples, 0.5), 5);
    }

    #[test]
    fn test_blink_sequence() {
        assert_eq!(count_edges(&[0.0, 0.6, 0.6, 0.2, 0.7], 0.5), 2);
    }

    #[test]
    fn test_threshold_change_applies_next_sample() {
        let mut edge = EdgeDetector::new();
        assert!(!edge.observe(0.4, 0.5));
        // Lowering the threshold makes the same level a rising edge
        assert!(edge.observe(0.4, 0.3));
        assert!(!edge.observe(0.4, 0.3));
    }

    #[test]
    fn test_clear_rearms() {
        let mut edge = EdgeDetector::new();
        assert!(edge.observe(0.9, 0.5));
        edge.clear();
        assert!(!edge.is_above());
        assert!(edge.observe(0.9, 0.5));
    }
}
