//! Synheart Gesture - On-device facial gesture event counting
//!
//! Gesture turns per-frame blendshape scores from a face inference engine
//! into debounced event counts for three gestures: eye blinks, mouth
//! openings and eyebrow raises. Each frame flows through a fixed pipeline:
//! signal extraction → brow baseline → edge debouncing / brow hysteresis →
//! session gating → snapshot.
//!
//! ## Modules
//!
//! - **Session**: the stateful per-subject detector (`GestureSession`)
//! - **Pipeline**: stream-level processing over gesture.frame_stream.v1 records
//! - **FFI**: C bindings for hosts that own the camera and inference engine

pub mod baseline;
pub mod brow;
pub mod config;
pub mod debounce;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{GestureConfig, ThresholdOverrides, Thresholds};
pub use error::GestureError;
pub use pipeline::{count_gestures, count_records, GestureProcessor};
pub use session::GestureSession;
pub use stream::{StreamRecord, STREAM_VERSION};
pub use types::{
    BlendshapeCategory, BrowPhase, FaceResult, FrameSignals, FrameSnapshot, Gesture,
    GestureCounts, GestureReport,
};

/// Gesture version embedded in reports
pub const GESTURE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-gesture";
