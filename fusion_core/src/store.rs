//! Track store contract and a bounded in-memory implementation.
//!
//! The engine never depends on a specific storage technology: it talks to
//! the persistent store through [`TrackStore`], an approximate-spatial-query
//! plus create-or-replace plus delete interface. `MemoryStore` backs the
//! simulator, the CLI, and the tests.

use crate::fixed::Fixed;
use crate::types::{FusedId, FusedTrack};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Axis-aligned spatial window for candidate lookup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QueryWindow {
    /// Window center, east/north/up meters (Q16.16)
    pub center: [Fixed; 3],
    /// Half-extent applied per axis
    pub half_extent: Fixed,
}

impl QueryWindow {
    pub fn contains(&self, pos: &[Fixed; 3]) -> bool {
        (0..3).all(|i| {
            let d = pos[i].saturating_sub(self.center[i]).abs();
            d <= self.half_extent
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Upsert of a brand-new track while the store is full. Existing tracks
    /// can always be replaced in place.
    #[error("store at capacity")]
    CapacityExceeded,
}

/// Query/update contract of the external track store.
pub trait TrackStore {
    /// Approximate spatial lookup: every track whose last-known position
    /// lies inside `window`. May over-approximate; must never miss a track
    /// inside the window.
    fn query(&self, window: &QueryWindow) -> Vec<FusedTrack>;

    /// Create-or-replace by `fused_id`.
    fn upsert(&mut self, track: FusedTrack) -> Result<(), StoreError>;

    /// Permanently remove a track. Returns whether it existed.
    fn delete(&mut self, id: FusedId) -> bool;

    /// Point lookup by id.
    fn get(&self, id: FusedId) -> Option<FusedTrack>;

    /// Full snapshot, used by the lifecycle sweep.
    fn all(&self) -> Vec<FusedTrack>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded in-memory store. Iteration order is by `FusedId`, so sweeps and
/// query results are deterministic.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    capacity: usize,
    tracks: BTreeMap<FusedId, FusedTrack>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tracks: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl TrackStore for MemoryStore {
    fn query(&self, window: &QueryWindow) -> Vec<FusedTrack> {
        self.tracks
            .values()
            .filter(|t| window.contains(&t.pos))
            .cloned()
            .collect()
    }

    fn upsert(&mut self, track: FusedTrack) -> Result<(), StoreError> {
        if !self.tracks.contains_key(&track.id) && self.tracks.len() >= self.capacity {
            return Err(StoreError::CapacityExceeded);
        }
        self.tracks.insert(track.id, track);
        Ok(())
    }

    fn delete(&mut self, id: FusedId) -> bool {
        self.tracks.remove(&id).is_some()
    }

    fn get(&self, id: FusedId) -> Option<FusedTrack> {
        self.tracks.get(&id).cloned()
    }

    fn all(&self) -> Vec<FusedTrack> {
        self.tracks.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
