//! Statistical merge of an associated report into an existing track, and
//! creation of new tracks from unassociated reports.
//!
//! # Covariance intersection (information form, per axis)
//! cov_f   = (cov_a · cov_b) / (cov_a + cov_b)
//! value_f = (value_a · cov_b + value_b · cov_a) / (cov_a + cov_b)
//!
//! `a` is the existing track, `b` the incoming report. The fused covariance
//! never exceeds either input, so track uncertainty is monotonically
//! non-increasing under fusion. All products run in 64/128-bit
//! intermediates and clamp instead of wrapping.

use crate::fixed::Fixed;
use crate::types::{FusedId, FusedTrack, SourceSet, TrackReport, TrackState};

/// Fused covariance proxy: `a·b / (a + b)`. Both inputs exact (zero) fuse
/// to an exact result.
pub fn ci_merge_cov(a: u32, b: u32) -> u32 {
    let denom = a as u64 + b as u64;
    if denom == 0 {
        return 0;
    }
    ((a as u64 * b as u64) / denom) as u32
}

/// Covariance-weighted value merge. When both covariances are zero the
/// incoming value wins (both inputs claim exactness; the report is newer).
pub fn ci_merge_value(value_a: Fixed, cov_a: u32, value_b: Fixed, cov_b: u32) -> Fixed {
    let denom = cov_a as i128 + cov_b as i128;
    if denom == 0 {
        return value_b;
    }
    let num = value_a.raw() as i128 * cov_b as i128 + value_b.raw() as i128 * cov_a as i128;
    let raw = num / denom;
    Fixed::from_raw(raw.clamp(i32::MIN as i128, i32::MAX as i128) as i32)
}

/// Merge a validated report into an existing track in place.
///
/// Applies the CI rule per axis to position and velocity, ratchets the
/// quality, records the contributing source, and promotes a tentative or
/// stale track to confirmed. `now_ms` is the engine clock at commit time.
pub fn fuse_into(track: &mut FusedTrack, report: &TrackReport, now_ms: u64) {
    let (cov_pos_a, cov_pos_b) = (track.cov_pos, report.cov_pos);
    let (cov_vel_a, cov_vel_b) = (track.cov_vel, report.cov_vel);

    for i in 0..3 {
        track.pos[i] = ci_merge_value(track.pos[i], cov_pos_a, report.pos[i], cov_pos_b);
        track.vel[i] = ci_merge_value(track.vel[i], cov_vel_a, report.vel[i], cov_vel_b);
    }
    track.cov_pos = ci_merge_cov(cov_pos_a, cov_pos_b);
    track.cov_vel = ci_merge_cov(cov_vel_a, cov_vel_b);

    // Quality ratchet: a noisy repeat report never degrades the recorded
    // confidence.
    track.quality = track.quality.max(report.quality);
    track.contributing_sources.insert(report.source);

    // A fusion also revives a stale track: it is demonstrably still being
    // observed, so it goes back to confirmed rather than aging out.
    if matches!(track.state, TrackState::Tentative | TrackState::Stale) {
        track.state = TrackState::Confirmed;
    }
    track.last_update = now_ms;
    track.total_fusions += 1;
}

/// Instantiate a tentative track from an unassociated report.
pub fn spawn_track(id: FusedId, report: &TrackReport, now_ms: u64) -> FusedTrack {
    FusedTrack {
        id,
        pos: report.pos,
        vel: report.vel,
        cov_pos: report.cov_pos,
        cov_vel: report.cov_vel,
        quality: report.quality,
        contributing_sources: SourceSet::single(report.source),
        state: TrackState::Tentative,
        last_update: now_ms,
        born_at: now_ms,
        total_fusions: 0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
