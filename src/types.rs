//! Core types for the Synheart Gesture detector
//!
//! This module defines the data that flows through each stage of a frame:
//! upstream blendshape categories, extracted signals, counters, and the
//! per-frame snapshot handed to the display side.

use crate::baseline::BaselineUpdate;
use crate::config::Thresholds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Countable facial gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Blink,
    Mouth,
    Brow,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Blink => "blink",
            Gesture::Mouth => "mouth",
            Gesture::Brow => "brow",
        }
    }
}

/// One named expression score produced by the inference engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendshapeCategory {
    /// Canonical category name (e.g. "eyeBlinkLeft")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Human-readable name; some engine versions only populate this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Intensity in [0, 1]; absent scores read as 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl BlendshapeCategory {
    pub fn new(name: &str, score: f64) -> Self {
        Self {
            category_name: Some(name.to_string()),
            display_name: None,
            score: Some(score),
        }
    }

    /// Name used for substring matching: the category name, or the display
    /// name when the category name is missing or empty.
    pub fn lookup_name(&self) -> &str {
        match self.category_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.display_name.as_deref().unwrap_or(""),
        }
    }

    /// True if either name equals `name` exactly
    pub fn is_named(&self, name: &str) -> bool {
        self.category_name.as_deref() == Some(name) || self.display_name.as_deref() == Some(name)
    }
}

/// Result for the single tracked face in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    #[serde(default)]
    pub categories: Vec<BlendshapeCategory>,
}

impl FaceResult {
    pub fn from_scores<'a>(scores: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            categories: scores
                .into_iter()
                .map(|(name, score)| BlendshapeCategory::new(name, score))
                .collect(),
        }
    }
}

/// The three logical signals derived for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSignals {
    pub blink: f64,
    pub mouth: f64,
    pub brow: f64,
}

/// Cumulative event counts for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureCounts {
    pub blink: u64,
    pub mouth: u64,
    pub brow: u64,
}

impl GestureCounts {
    pub fn get(&self, gesture: Gesture) -> u64 {
        match gesture {
            Gesture::Blink => self.blink,
            Gesture::Mouth => self.mouth,
            Gesture::Brow => self.brow,
        }
    }

    pub(crate) fn increment(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Blink => self.blink += 1,
            Gesture::Mouth => self.mouth += 1,
            Gesture::Brow => self.brow += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.blink + self.mouth + self.brow
    }
}

/// Phase of the brow hysteresis machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowPhase {
    #[default]
    Idle,
    Raised,
}

/// Diagnostic view of one processed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Caller-supplied monotonic timestamp (ms)
    pub timestamp_ms: f64,
    pub signals: FrameSignals,
    /// Brow baseline after this frame's update
    pub baseline: f64,
    /// Brow deviation used for counting on this frame
    pub delta: f64,
    /// Smoothing rule applied to the baseline on this frame
    pub baseline_update: BaselineUpdate,
    pub counts: GestureCounts,
    pub brow_phase: BrowPhase,
    /// Gestures counted on this frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Gesture>,
    pub calibrating: bool,
    pub paused: bool,
    pub face_present: bool,
}

/// Producer metadata embedded in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
}

impl Default for ReportProducer {
    fn default() -> Self {
        Self {
            name: crate::PRODUCER_NAME.to_string(),
            version: crate::GESTURE_VERSION.to_string(),
        }
    }
}

/// End-of-stream summary for a processed frame stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureReport {
    pub producer: ReportProducer,
    pub session_id: Uuid,
    pub computed_at_utc: DateTime<Utc>,
    /// Frames evaluated by a running session
    pub frames_processed: u64,
    /// Evaluated frames where the engine found no face
    pub frames_without_face: u64,
    /// Evaluated frames that fell inside a post-reset pause
    pub frames_paused: u64,
    pub counts: GestureCounts,
    /// Thresholds in effect at the end of the stream
    pub thresholds: Thresholds,
}
