//! Track lifecycle management: id allocation, aging, demotion, deletion.
//!
//! # State machine
//! - `Tentative → Confirmed` on first fusion (applied by the fusion step)
//! - `Tentative | Confirmed → Stale` once `now − last_update ≥ track_timeout`
//! - `Stale → Confirmed` when a report fuses into it during the grace window
//!   (revival; applied by the fusion step)
//! - `Stale → Deleted` once `now − last_update ≥ track_timeout + stale_grace`;
//!   the store entry is removed and the id is permanently retired.
//!
//! Time is an explicit `now` input in milliseconds. The manager never reads
//! a wall clock, so timeout behavior is deterministic and testable.

use crate::store::TrackStore;
use crate::types::{FusedId, TrackState};
use serde::{Deserialize, Serialize};

/// Aging policy configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Silence timeout before a track goes stale, milliseconds
    pub track_timeout_ms: u64,
    /// Additional grace a stale track survives before deletion, milliseconds
    pub stale_grace_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            track_timeout_ms: 30_000,
            stale_grace_ms: 0,
        }
    }
}

/// What one aging sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Tracks demoted to stale this sweep
    pub demoted: Vec<FusedId>,
    /// Tracks deleted from the store this sweep
    pub deleted: Vec<FusedId>,
}

/// Owns id allocation and the aging sweep. Ids are monotonically increasing
/// and never reused, including ids allocated for creations that later
/// failed on store capacity.
#[derive(Clone, Debug)]
pub struct LifecycleManager {
    pub config: LifecycleConfig,
    next_id: u64,
}

impl LifecycleManager {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config, next_id: 0 }
    }

    pub fn allocate_id(&mut self) -> FusedId {
        let id = FusedId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Age every stored track against `now_ms`. Demotions are written back
    /// through `Upsert`; deletions go through `Delete`. With the default
    /// zero grace a silent track passes through stale and out of the store
    /// in a single sweep.
    pub fn sweep<S: TrackStore>(&mut self, store: &mut S, now_ms: u64) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let timeout = self.config.track_timeout_ms;
        let grace = self.config.stale_grace_ms;

        for mut track in store.all() {
            let silent_for = now_ms.saturating_sub(track.last_update);
            if silent_for < timeout {
                continue;
            }

            if matches!(track.state, TrackState::Tentative | TrackState::Confirmed) {
                track.state = TrackState::Stale;
                summary.demoted.push(track.id);
            }

            if track.state == TrackState::Stale && silent_for >= timeout + grace {
                let id = track.id;
                store.delete(id);
                summary.deleted.push(id);
            } else {
                // Demotion only: write the state change back.
                let replaced = store.upsert(track);
                debug_assert!(
                    replaced.is_ok(),
                    "demotion write-back exceeded capacity"
                );
            }
        }

        if !summary.deleted.is_empty() || !summary.demoted.is_empty() {
            tracing::debug!(
                demoted = summary.demoted.len(),
                deleted = summary.deleted.len(),
                "lifecycle sweep"
            );
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::fusion::spawn_track;
    use crate::store::{MemoryStore, TrackStore};
    use crate::types::{ReportId, SourceKind, TrackReport};

    fn manager(timeout: u64, grace: u64) -> LifecycleManager {
        LifecycleManager::new(LifecycleConfig {
            track_timeout_ms: timeout,
            stale_grace_ms: grace,
        })
    }

    fn seed_track<S: TrackStore>(mgr: &mut LifecycleManager, store: &mut S, born: u64) -> FusedId {
        let report = TrackReport {
            track_id: ReportId(0),
            source: SourceKind::OwnRadar,
            class_hint: 0,
            pos: [Fixed::from_int(1000); 3],
            vel: [Fixed::ZERO; 3],
            cov_pos: 10_000,
            cov_vel: 100,
            timestamp: born,
            quality: 128,
        };
        let id = mgr.allocate_id();
        store.upsert(spawn_track(id, &report, born)).unwrap();
        id
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut mgr = manager(30_000, 0);
        let a = mgr.allocate_id();
        let b = mgr.allocate_id();
        let c = mgr.allocate_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn fresh_track_survives_sweep() {
        let mut mgr = manager(30_000, 0);
        let mut store = MemoryStore::new(8);
        let id = seed_track(&mut mgr, &mut store, 0);

        let summary = mgr.sweep(&mut store, 29_999);
        assert_eq!(summary, SweepSummary::default());
        assert!(store.get(id).is_some());
    }

    #[test]
    fn silent_track_is_deleted_at_timeout() {
        let mut mgr = manager(30_000, 0);
        let mut store = MemoryStore::new(8);
        let id = seed_track(&mut mgr, &mut store, 0);

        let summary = mgr.sweep(&mut store, 30_000);
        assert_eq!(summary.demoted, vec![id]);
        assert_eq!(summary.deleted, vec![id]);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn grace_holds_stale_track_before_deletion() {
        let mut mgr = manager(10_000, 5_000);
        let mut store = MemoryStore::new(8);
        let id = seed_track(&mut mgr, &mut store, 0);

        // Past timeout, inside grace: demoted but retained.
        let s1 = mgr.sweep(&mut store, 12_000);
        assert_eq!(s1.demoted, vec![id]);
        assert!(s1.deleted.is_empty());
        assert_eq!(store.get(id).unwrap().state, TrackState::Stale);

        // Second sweep inside grace: no further transition.
        let s2 = mgr.sweep(&mut store, 14_000);
        assert!(s2.demoted.is_empty() && s2.deleted.is_empty());

        // Grace elapsed: deleted.
        let s3 = mgr.sweep(&mut store, 15_000);
        assert_eq!(s3.deleted, vec![id]);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn updated_track_resets_its_clock() {
        let mut mgr = manager(10_000, 0);
        let mut store = MemoryStore::new(8);
        let id = seed_track(&mut mgr, &mut store, 0);

        // Simulate a fusion commit at t=8s.
        let mut track = store.get(id).unwrap();
        track.last_update = 8_000;
        store.upsert(track).unwrap();

        let summary = mgr.sweep(&mut store, 12_000);
        assert!(summary.deleted.is_empty());
        assert!(store.get(id).is_some());
    }
}
