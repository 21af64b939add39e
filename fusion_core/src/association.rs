//! Association: deciding whether an incoming report and an existing fused
//! track refer to the same object.
//!
//! # Distance criterion
//! d = √( |Δpos|² / (cov_pos_track + cov_pos_report)
//!      + |Δvel|² / (cov_vel_track + cov_vel_report) )
//!
//! where |Δpos| and |Δvel| are Euclidean norms over the three axes. A
//! candidate matches iff `d ≤ assoc_threshold`. Ties on `d` are broken by
//! the lowest `cov_pos` (the most certain existing track); a residual exact
//! tie is ambiguous and drops the report.

use crate::error::EngineError;
use crate::fixed::{Fixed, FRAC_BITS};
use crate::types::{FusedId, FusedTrack, TrackReport, TrackState};

/// Outcome of resolving one report against the candidate set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Association {
    /// Best-matching existing track
    Matched(FusedId),
    /// No candidate within the gate — spawn a new track
    Unmatched,
}

/// Squared Euclidean norm of the per-axis difference, in integer
/// units² (meters² or (m/s)²). The Q16.16 raw difference squared carries
/// 32 fractional bits; shifting them off leaves the integer norm. The
/// three-axis sum saturates rather than wrapping.
fn diff_norm_sq(a: &[Fixed; 3], b: &[Fixed; 3]) -> u64 {
    let mut acc: u64 = 0;
    for i in 0..3 {
        let d = (a[i].raw() as i64 - b[i].raw() as i64).unsigned_abs();
        let sq = ((d as u128 * d as u128) >> (2 * FRAC_BITS)).min(u64::MAX as u128) as u64;
        acc = acc.saturating_add(sq);
    }
    acc
}

/// `norm_sq / cov_sum` as a raw Q16.16 quantity. A zero covariance sum with
/// a non-zero separation is an infinite distance (both inputs claim
/// exactness about different points); zero over zero is a perfect match.
fn normalized_term(norm_sq: u64, cov_sum: u64) -> u64 {
    if cov_sum == 0 {
        return if norm_sq == 0 { 0 } else { u64::MAX };
    }
    (((norm_sq as u128) << FRAC_BITS) / cov_sum as u128).min(u64::MAX as u128) as u64
}

/// Normalized kinematic distance between a report and a candidate track.
/// Saturates to `Fixed::MAX` when the true distance exceeds the Q16.16
/// range, which any sane gate threshold rejects anyway.
pub fn normalized_distance(report: &TrackReport, candidate: &FusedTrack) -> Fixed {
    let pos_term = normalized_term(
        diff_norm_sq(&report.pos, &candidate.pos),
        report.cov_pos as u64 + candidate.cov_pos as u64,
    );
    let vel_term = normalized_term(
        diff_norm_sq(&report.vel, &candidate.vel),
        report.cov_vel as u64 + candidate.cov_vel as u64,
    );
    let d_sq_raw = pos_term
        .saturating_add(vel_term)
        .min(i32::MAX as u64) as i32;
    Fixed::from_raw(d_sq_raw).sqrt()
}

/// Resolve a report against the candidate set returned by the store query.
///
/// Single-best-match semantics: at most one candidate is selected per
/// report; a report never associates with more than one track.
pub fn select_candidate(
    report: &TrackReport,
    candidates: &[FusedTrack],
    assoc_threshold: Fixed,
) -> Result<Association, EngineError> {
    let mut best: Option<(Fixed, u32, FusedId)> = None;
    let mut tied = 0usize;

    for cand in candidates {
        if cand.state == TrackState::Deleted {
            continue;
        }
        let d = normalized_distance(report, cand);
        if d > assoc_threshold {
            continue;
        }
        let key = (d, cand.cov_pos, cand.id);
        match &mut best {
            None => {
                best = Some(key);
                tied = 1;
            }
            Some((bd, bcov, bid)) => {
                if (d, cand.cov_pos) < (*bd, *bcov) {
                    *bd = d;
                    *bcov = cand.cov_pos;
                    *bid = cand.id;
                    tied = 1;
                } else if (d, cand.cov_pos) == (*bd, *bcov) {
                    tied += 1;
                }
            }
        }
    }

    match best {
        Some(_) if tied > 1 => Err(EngineError::AssociationAmbiguous { candidates: tied }),
        Some((_, _, id)) => Ok(Association::Matched(id)),
        None => Ok(Association::Unmatched),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
