//! Fundamental types shared across the workspace: identifiers, report
//! sources, the wire-level report frame, the validated report, and the
//! engine-owned fused track record.

use crate::fixed::Fixed;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

/// Globally unique fused-track identifier. Assigned once at track creation
/// and never reused, even after the track is deleted.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FusedId(pub u64);

/// Source-local track identifier carried by an incoming report. Opaque to
/// the engine; kept for traceability only.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReportId(pub u32);

impl fmt::Display for FusedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Report sources
// ---------------------------------------------------------------------------

/// Sensor or link that produced a report. Discriminants match the wire
/// source IDs used by upstream normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SourceKind {
    /// Own-ship primary radar
    OwnRadar = 0,
    /// Tactical data link (Link 16 class)
    TacticalDataLink = 1,
    /// Surveillance network feed (ASTERIX class)
    SurveillanceAsterix = 2,
    /// Infrared search-and-track (angle-accurate, range-poor)
    InfraredSearchTrack = 3,
    /// Electronic support measures (emitter bearing reports)
    ElectronicSupport = 4,
    /// ADS-B transponder reports
    Adsb = 5,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::OwnRadar,
        SourceKind::TacticalDataLink,
        SourceKind::SurveillanceAsterix,
        SourceKind::InfraredSearchTrack,
        SourceKind::ElectronicSupport,
        SourceKind::Adsb,
    ];

    /// Decode a wire source ID; unknown values are a validation failure.
    pub fn from_wire(v: u8) -> Option<SourceKind> {
        Self::ALL.get(v as usize).copied()
    }

    pub fn wire_id(self) -> u8 {
        self as u8
    }
}

/// Set of sources that have contributed to a fused track, packed as a
/// bitmask over the wire IDs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourceSet(u8);

impl SourceSet {
    pub const EMPTY: SourceSet = SourceSet(0);

    pub fn single(kind: SourceKind) -> Self {
        SourceSet(1 << kind.wire_id())
    }

    pub fn insert(&mut self, kind: SourceKind) {
        self.0 |= 1 << kind.wire_id();
    }

    pub fn contains(self, kind: SourceKind) -> bool {
        self.0 & (1 << kind.wire_id()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = SourceKind> {
        SourceKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Wire-level report as delivered by upstream normalization, before
/// validation. Numeric fields are engineering-unit floats; the validator
/// quantizes them to Q16.16 and rejects anything non-finite or outside the
/// representable range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportFrame {
    /// Source-local track number (opaque)
    pub track_id: u32,
    /// Wire source ID (see [`SourceKind::from_wire`])
    pub source: u8,
    /// Coarse classification hint from the source (opaque to the engine)
    pub class_hint: u8,
    /// Position east/north/up, meters
    pub pos: [f64; 3],
    /// Velocity east/north/up, m/s
    pub vel: [f64; 3],
    /// Scalar position uncertainty proxy (larger = less certain)
    pub cov_pos: u32,
    /// Scalar velocity uncertainty proxy
    pub cov_vel: u32,
    /// Source timestamp, milliseconds
    pub timestamp: u64,
    /// Confidence score, 0–255
    pub quality: u8,
}

/// A validated track report. Produced only by the validator; every field is
/// in-range by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackReport {
    pub track_id: ReportId,
    pub source: SourceKind,
    pub class_hint: u8,
    /// Position east/north/up, Q16.16 meters
    pub pos: [Fixed; 3],
    /// Velocity east/north/up, Q16.16 m/s
    pub vel: [Fixed; 3],
    pub cov_pos: u32,
    pub cov_vel: u32,
    pub timestamp: u64,
    pub quality: u8,
}

// ---------------------------------------------------------------------------
// Fused track
// ---------------------------------------------------------------------------

/// Lifecycle state of a fused track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    /// Created from a single unassociated report — may be spurious
    Tentative,
    /// Received at least one associated update
    Confirmed,
    /// Silence timeout elapsed, pending deletion grace
    Stale,
    /// Removed from the store; the id is permanently retired
    Deleted,
}

/// Engine-owned fused track state, persisted through the track store.
///
/// Mutated only by the fusion engine and the lifecycle manager. Covariance
/// proxies are monotonically non-increasing under fusion by construction of
/// the merge rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FusedTrack {
    pub id: FusedId,
    /// Last-known position east/north/up, Q16.16 meters
    pub pos: [Fixed; 3],
    /// Last-known velocity east/north/up, Q16.16 m/s
    pub vel: [Fixed; 3],
    pub cov_pos: u32,
    pub cov_vel: u32,
    /// Aggregate confidence; never lowered by fusion (quality ratchet)
    pub quality: u8,
    pub contributing_sources: SourceSet,
    pub state: TrackState,
    /// Engine time of the last creation/fusion commit, milliseconds
    pub last_update: u64,
    /// Engine time of creation, milliseconds
    pub born_at: u64,
    /// Number of fusion updates absorbed since creation
    pub total_fusions: u32,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
