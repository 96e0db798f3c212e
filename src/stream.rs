//! gesture.frame_stream.v1 record format
//!
//! Hosts that run the inference engine out of process feed the detector a
//! newline-delimited JSON stream. Each record is either a frame (with the
//! engine's blendshape categories, or `null` when no face was found) or a
//! lifecycle signal.

use crate::config::ThresholdOverrides;
use crate::error::GestureError;
use crate::types::FaceResult;
use serde::{Deserialize, Serialize};

/// Current stream format version
pub const STREAM_VERSION: &str = "gesture.frame_stream.v1";

/// One record of a frame stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRecord {
    /// Engine output for one frame
    Frame {
        timestamp_ms: f64,
        #[serde(default)]
        face: Option<FaceResult>,
        /// Threshold changes that apply from this frame on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thresholds: Option<ThresholdOverrides>,
    },
    /// Begin counting (re-calibrates the baseline)
    Start { timestamp_ms: f64 },
    /// Zero counters and pause briefly
    Reset { timestamp_ms: f64 },
    /// Stop counting
    Stop { timestamp_ms: f64 },
}

impl StreamRecord {
    pub fn frame(timestamp_ms: f64, face: Option<FaceResult>) -> Self {
        StreamRecord::Frame {
            timestamp_ms,
            face,
            thresholds: None,
        }
    }

    pub fn timestamp_ms(&self) -> f64 {
        match self {
            StreamRecord::Frame { timestamp_ms, .. }
            | StreamRecord::Start { timestamp_ms }
            | StreamRecord::Reset { timestamp_ms }
            | StreamRecord::Stop { timestamp_ms } => *timestamp_ms,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamRecord::Frame { .. } => "frame",
            StreamRecord::Start { .. } => "start",
            StreamRecord::Reset { .. } => "reset",
            StreamRecord::Stop { .. } => "stop",
        }
    }

    /// Check the record on its own (not against the stream it belongs to)
    pub fn validate(&self) -> Result<(), GestureError> {
        let ts = self.timestamp_ms();
        if !ts.is_finite() {
            return Err(GestureError::ParseError(format!(
                "{} record has non-finite timestamp",
                self.kind()
            )));
        }
        if let StreamRecord::Frame {
            thresholds: Some(overrides),
            ..
        } = self
        {
            for (name, value) in [
                ("blink", overrides.blink),
                ("mouth", overrides.mouth),
                ("brow_high", overrides.brow_high),
            ] {
                if let Some(value) = value {
                    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                        return Err(GestureError::InvalidThreshold { name, value });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Parse and validate a single JSON record
pub fn parse_record(json: &str) -> Result<StreamRecord, GestureError> {
    let record: StreamRecord = serde_json::from_str(json.trim())?;
    record.validate()?;
    Ok(record)
}

/// Parse NDJSON, skipping blank lines
pub fn parse_ndjson(ndjson: &str) -> Result<Vec<StreamRecord>, GestureError> {
    let mut records = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_record(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                return Err(GestureError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(records)
}

/// Parse a JSON array of records
pub fn parse_array(json: &str) -> Result<Vec<StreamRecord>, GestureError> {
    let records: Vec<StreamRecord> = serde_json::from_str(json)?;
    for record in &records {
        record.validate()?;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_frame_record() {
        let record = parse_record(
            r#"{"type":"frame","timestamp_ms":33.3,"face":{"categories":[
                {"category_name":"jawOpen","score":0.4},
                {"display_name":"eyeBlinkLeft"}
            ]}}"#,
        )
        .unwrap();

        match record {
            StreamRecord::Frame {
                timestamp_ms,
                face: Some(face),
                thresholds: None,
            } => {
                assert_eq!(timestamp_ms, 33.3);
                assert_eq!(face.categories.len(), 2);
                assert_eq!(face.categories[0].score, Some(0.4));
                assert_eq!(face.categories[1].score, None);
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_frame_without_face() {
        let explicit = parse_record(r#"{"type":"frame","timestamp_ms":1,"face":null}"#).unwrap();
        let omitted = parse_record(r#"{"type":"frame","timestamp_ms":1}"#).unwrap();
        assert_eq!(explicit, StreamRecord::frame(1.0, None));
        assert_eq!(omitted, StreamRecord::frame(1.0, None));
    }

    #[test]
    fn test_lifecycle_records() {
        assert_eq!(
            parse_record(r#"{"type":"reset","timestamp_ms":500}"#).unwrap(),
            StreamRecord::Reset { timestamp_ms: 500.0 }
        );
        assert_eq!(parse_record(r#"{"type":"start","timestamp_ms":0}"#).unwrap().kind(), "start");
        assert_eq!(parse_record(r#"{"type":"stop","timestamp_ms":9}"#).unwrap().timestamp_ms(), 9.0);
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(parse_record(r#"{"type":"pause","timestamp_ms":0}"#).is_err());
    }

    #[test]
    fn test_rejects_bad_threshold_override() {
        let result = parse_record(r#"{"type":"frame","timestamp_ms":0,"thresholds":{"blink":2.0}}"#);
        assert!(matches!(
            result,
            Err(GestureError::InvalidThreshold { name: "blink", .. })
        ));
    }

    #[test]
    fn test_ndjson_reports_line_number() {
        let ndjson = "{\"type\":\"start\",\"timestamp_ms\":0}\n\n{\"type\":\"frame\"}\n";
        let err = parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_ndjson_skips_blank_lines() {
        let ndjson = "\n{\"type\":\"start\",\"timestamp_ms\":0}\n   \n{\"type\":\"frame\",\"timestamp_ms\":16}\n";
        let records = parse_ndjson(ndjson).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_array() {
        let records = parse_array(
            r#"[{"type":"start","timestamp_ms":0},{"type":"frame","timestamp_ms":16,"face":null}]"#,
        )
        .unwrap();
        assert_eq!(records[1], StreamRecord::frame(16.0, None));
    }
}
