//! Output emission and running counters.
//!
//! One [`TrackEmission`] is produced per committed report (creation or
//! fusion), never for rejected reports, and never twice for the same
//! report. The spec counters ride along with every emission so downstream
//! consumers see a consistent snapshot.

use crate::types::{FusedTrack, FusedId};
use serde::{Deserialize, Serialize};

/// How the committed report changed the track picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// A new tentative track was instantiated
    Created,
    /// The report was merged into an existing track
    Fused,
}

/// Monotonic engine counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub new_tracks_created: u64,
    pub fusions_performed: u64,
    pub reports_rejected: u64,
    pub latency_violations: u64,
    pub emissions: u64,
}

/// Snapshot published after each committed report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackEmission {
    pub track: FusedTrack,
    pub disposition: Disposition,
    pub new_tracks_created: u64,
    pub fusions_performed: u64,
    /// Measured end-to-end processing time for this report, microseconds
    pub latency_us: u64,
}

/// Owns the counters and builds emissions. The engine calls
/// [`Emitter::emit`] exactly once per committed report.
#[derive(Clone, Debug, Default)]
pub struct Emitter {
    counters: Counters,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn record_creation(&mut self) {
        self.counters.new_tracks_created += 1;
    }

    pub fn record_fusion(&mut self) {
        self.counters.fusions_performed += 1;
    }

    pub fn record_rejection(&mut self) {
        self.counters.reports_rejected += 1;
    }

    pub fn record_latency_violation(&mut self) {
        self.counters.latency_violations += 1;
    }

    /// Build the per-report output snapshot.
    pub fn emit(
        &mut self,
        track: FusedTrack,
        disposition: Disposition,
        latency_us: u64,
    ) -> TrackEmission {
        self.counters.emissions += 1;
        tracing::debug!(
            track = %track.id,
            ?disposition,
            latency_us,
            created = self.counters.new_tracks_created,
            fused = self.counters.fusions_performed,
            "emit"
        );
        TrackEmission {
            track,
            disposition,
            new_tracks_created: self.counters.new_tracks_created,
            fusions_performed: self.counters.fusions_performed,
            latency_us,
        }
    }
}

impl TrackEmission {
    pub fn fused_id(&self) -> FusedId {
        self.track.id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::types::{SourceKind, SourceSet, TrackState};

    fn track() -> FusedTrack {
        FusedTrack {
            id: FusedId(3),
            pos: [Fixed::ZERO; 3],
            vel: [Fixed::ZERO; 3],
            cov_pos: 100,
            cov_vel: 10,
            quality: 128,
            contributing_sources: SourceSet::single(SourceKind::OwnRadar),
            state: TrackState::Tentative,
            last_update: 0,
            born_at: 0,
            total_fusions: 0,
        }
    }

    #[test]
    fn counters_ride_along_with_emissions() {
        let mut emitter = Emitter::new();
        emitter.record_creation();
        let e1 = emitter.emit(track(), Disposition::Created, 42);
        assert_eq!(e1.new_tracks_created, 1);
        assert_eq!(e1.fusions_performed, 0);

        emitter.record_fusion();
        let e2 = emitter.emit(track(), Disposition::Fused, 17);
        assert_eq!(e2.new_tracks_created, 1);
        assert_eq!(e2.fusions_performed, 1);
        assert_eq!(emitter.counters().emissions, 2);
    }

    #[test]
    fn rejections_do_not_touch_emission_counters() {
        let mut emitter = Emitter::new();
        emitter.record_rejection();
        emitter.record_rejection();
        let c = emitter.counters();
        assert_eq!(c.reports_rejected, 2);
        assert_eq!(c.emissions, 0);
        assert_eq!(c.new_tracks_created, 0);
        assert_eq!(c.fusions_performed, 0);
    }
}
