//! Report validation: rejects malformed or low-confidence frames before
//! they reach any stateful logic.
//!
//! The validator is the only place a [`ReportFrame`] becomes a
//! [`TrackReport`]; downstream components never see unchecked input. It
//! must not consult or mutate the track store.

use crate::error::{EngineError, MalformedReport};
use crate::fixed::Fixed;
use crate::types::{ReportFrame, ReportId, SourceKind, TrackReport};

const POS_FIELDS: [&str; 3] = ["pos_east", "pos_north", "pos_up"];
const VEL_FIELDS: [&str; 3] = ["vel_east", "vel_north", "vel_up"];

/// Validate one wire frame against the configured minimum quality, and
/// quantize its kinematics to Q16.16.
///
/// Rejection order mirrors the checks: quality, source enum, then each
/// numeric field (finite, then representable).
pub fn validate_frame(frame: &ReportFrame, min_quality: u8) -> Result<TrackReport, EngineError> {
    if frame.quality < min_quality {
        return Err(EngineError::RejectedLowQuality {
            quality: frame.quality,
            min_quality,
        });
    }

    let source = SourceKind::from_wire(frame.source)
        .ok_or(MalformedReport::UnknownSource(frame.source))?;

    let pos = quantize_axes(&frame.pos, &POS_FIELDS)?;
    let vel = quantize_axes(&frame.vel, &VEL_FIELDS)?;

    Ok(TrackReport {
        track_id: ReportId(frame.track_id),
        source,
        class_hint: frame.class_hint,
        pos,
        vel,
        cov_pos: frame.cov_pos,
        cov_vel: frame.cov_vel,
        timestamp: frame.timestamp,
        quality: frame.quality,
    })
}

fn quantize_axes(values: &[f64; 3], names: &[&'static str; 3]) -> Result<[Fixed; 3], MalformedReport> {
    let mut out = [Fixed::ZERO; 3];
    for i in 0..3 {
        if !values[i].is_finite() {
            return Err(MalformedReport::NonFinite(names[i]));
        }
        out[i] = Fixed::try_from_f64(values[i]).ok_or(MalformedReport::OutOfRange(names[i]))?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
