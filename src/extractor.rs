//! Signal extraction
//!
//! Resolves the three logical gesture signals from the blendshape categories
//! of one frame. Names are matched exactly first, then by case-insensitive
//! substring, so engine versions with variant naming still resolve.

use crate::types::{BlendshapeCategory, FaceResult, FrameSignals};

pub const EYE_BLINK_LEFT: &[&str] = &["eyeBlinkLeft"];
pub const EYE_BLINK_RIGHT: &[&str] = &["eyeBlinkRight"];
pub const MOUTH_OPEN: &[&str] = &["mouthOpen"];
pub const JAW_OPEN: &[&str] = &["jawOpen"];
pub const BROW_INNER_UP: &[&str] = &["browInnerUp"];
pub const BROW_OUTER_UP_LEFT: &[&str] = &["browOuterUpLeft"];
pub const BROW_OUTER_UP_RIGHT: &[&str] = &["browOuterUpRight"];

/// Extractor for turning named scores into gesture signals
pub struct SignalExtractor;

impl SignalExtractor {
    /// Extract blink, mouth and brow signals. A missing face reads as all zero.
    pub fn extract(face: Option<&FaceResult>) -> FrameSignals {
        let Some(face) = face else {
            return FrameSignals::default();
        };
        let cats = face.categories.as_slice();

        let blink = (resolve_score(cats, EYE_BLINK_LEFT) + resolve_score(cats, EYE_BLINK_RIGHT)) / 2.0;
        let mouth = resolve_score(cats, MOUTH_OPEN).max(resolve_score(cats, JAW_OPEN));

        let brow_inner = resolve_score(cats, BROW_INNER_UP);
        let brow_outer =
            (resolve_score(cats, BROW_OUTER_UP_LEFT) + resolve_score(cats, BROW_OUTER_UP_RIGHT)) / 2.0;

        FrameSignals {
            blink,
            mouth,
            brow: brow_inner.max(brow_outer),
        }
    }
}

/// Resolve one score from `categories` using the ordered `candidates`.
///
/// Exact name matches win in candidate order; otherwise the first category
/// whose name contains any candidate (case-insensitive) is used; otherwise 0.
pub fn resolve_score(categories: &[BlendshapeCategory], candidates: &[&str]) -> f64 {
    for candidate in candidates {
        if let Some(exact) = categories.iter().find(|c| c.is_named(candidate)) {
            return sanitize(exact.score);
        }
    }

    let lowered: Vec<String> = candidates.iter().map(|c| c.to_lowercase()).collect();
    categories
        .iter()
        .find(|c| {
            let name = c.lookup_name().to_lowercase();
            lowered.iter().any(|k| name.contains(k.as_str()))
        })
        .map(|c| sanitize(c.score))
        .unwrap_or(0.0)
}

fn sanitize(score: Option<f64>) -> f64 {
    match score {
        Some(s) if !s.is_nan() => s.clamp(0.0, 1.0),
        _ => 0.0,
    }
}
