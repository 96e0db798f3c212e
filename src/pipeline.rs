//! Pipeline orchestration
//!
//! This module provides the public API for feeding frame streams into a
//! gesture session: a stateless one-shot counter and a stateful processor
//! for hosts that deliver records one at a time.

use crate::config::{GestureConfig, Thresholds};
use crate::error::GestureError;
use crate::session::GestureSession;
use crate::stream::{parse_ndjson, parse_record, StreamRecord};
use crate::types::{FrameSnapshot, GestureCounts, GestureReport, ReportProducer};
use chrono::Utc;
use log::{debug, warn};

/// Count gestures in an NDJSON frame stream (stateless, one-shot).
///
/// # Arguments
/// * `ndjson` - gesture.frame_stream.v1 records, one per line
/// * `config` - Detector configuration
///
/// # Returns
/// A report with the final counts and frame statistics
///
/// # Example
/// ```ignore
/// let report = count_gestures(&ndjson, GestureConfig::default())?;
/// println!("{} blinks", report.counts.blink);
/// ```
pub fn count_gestures(ndjson: &str, config: GestureConfig) -> Result<GestureReport, GestureError> {
    let records = parse_ndjson(ndjson)?;
    count_records(&records, config)
}

/// Count gestures in already-parsed records (stateless, one-shot).
pub fn count_records(records: &[StreamRecord], config: GestureConfig) -> Result<GestureReport, GestureError> {
    let mut processor = GestureProcessor::new(config)?;
    for record in records {
        processor.process_record(record)?;
    }
    Ok(processor.report())
}

/// Stateful processor over a single frame stream.
///
/// The session starts automatically at the first record's timestamp unless
/// the stream opens with an explicit `start`.
pub struct GestureProcessor {
    session: GestureSession,
    last_timestamp: Option<f64>,
    frames_processed: u64,
    frames_without_face: u64,
    frames_paused: u64,
}

impl Default for GestureProcessor {
    fn default() -> Self {
        Self::from_session(GestureSession::default())
    }
}

impl GestureProcessor {
    /// Create a processor after validating `config`
    pub fn new(config: GestureConfig) -> Result<Self, GestureError> {
        config.validate()?;
        Ok(Self::from_session(GestureSession::new(config)))
    }

    fn from_session(session: GestureSession) -> Self {
        Self {
            session,
            last_timestamp: None,
            frames_processed: 0,
            frames_without_face: 0,
            frames_paused: 0,
        }
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn config(&self) -> &GestureConfig {
        self.session.config()
    }

    pub fn counts(&self) -> GestureCounts {
        self.session.counts()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Replace the live thresholds
    pub fn set_thresholds(&mut self, thresholds: Thresholds) -> Result<(), GestureError> {
        thresholds.validate()?;
        self.session.set_thresholds(thresholds);
        Ok(())
    }

    /// Feed one record. Frame records always return a snapshot; a stopped
    /// session reports its stored state without evaluating the frame.
    /// Lifecycle records return `None`.
    pub fn process_record(&mut self, record: &StreamRecord) -> Result<Option<FrameSnapshot>, GestureError> {
        record.validate()?;
        let now = record.timestamp_ms();

        match self.last_timestamp {
            Some(previous) if now < previous => {
                return Err(GestureError::NonMonotonicTimestamp {
                    previous,
                    current: now,
                });
            }
            None if !matches!(record, StreamRecord::Start { .. }) => {
                debug!("stream opened with a {} record; starting session at {now:.1}ms", record.kind());
                self.session.start(now);
            }
            _ => {}
        }
        self.last_timestamp = Some(now);

        match record {
            StreamRecord::Start { .. } => {
                self.session.start(now);
                Ok(None)
            }
            StreamRecord::Reset { .. } => {
                self.session.reset(now);
                Ok(None)
            }
            StreamRecord::Stop { .. } => {
                self.session.stop();
                Ok(None)
            }
            StreamRecord::Frame {
                face, thresholds, ..
            } => {
                if let Some(overrides) = thresholds {
                    let updated = self.session.thresholds().apply(overrides);
                    debug!("thresholds updated at {now:.1}ms: {updated:?}");
                    self.session.set_thresholds(updated);
                }

                if !self.session.is_running() {
                    warn!("frame at {now:.1}ms ignored: session is stopped");
                    return Ok(Some(self.session.process_frame(now, face.as_ref())));
                }

                let snapshot = self.session.process_frame(now, face.as_ref());
                self.frames_processed += 1;
                if !snapshot.face_present {
                    self.frames_without_face += 1;
                }
                if snapshot.paused {
                    self.frames_paused += 1;
                }
                Ok(Some(snapshot))
            }
        }
    }

    /// Feed one JSON record and return the snapshot as JSON, if any
    pub fn process_json(&mut self, json: &str) -> Result<Option<String>, GestureError> {
        let record = parse_record(json)?;
        match self.process_record(&record)? {
            Some(snapshot) => Ok(Some(serde_json::to_string(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Summarize everything processed so far
    pub fn report(&self) -> GestureReport {
        GestureReport {
            producer: ReportProducer::default(),
            session_id: self.session.id(),
            computed_at_utc: Utc::now(),
            frames_processed: self.frames_processed,
            frames_without_face: self.frames_without_face,
            frames_paused: self.frames_paused,
            counts: self.session.counts(),
            thresholds: self.session.thresholds(),
        }
    }
}
