//! `fusion_core` — Multi-source track fusion engine.
//!
//! Ingests kinematic track reports from heterogeneous sensors (own radar,
//! tactical data links, ESM, IRST, ADS-B) and maintains a single,
//! reduced-uncertainty track picture by associating and statistically
//! merging reports that refer to the same physical object.
//!
//! # Module layout
//! - [`fixed`]       — Q16.16 saturating fixed-point scalar
//! - [`types`]       — Ids, sources, report and fused-track records
//! - [`error`]       — Error taxonomy
//! - [`validate`]    — Report validation and quantization
//! - [`association`] — Candidate selection by normalized kinematic distance
//! - [`fusion`]      — Covariance-intersection merge, track creation
//! - [`lifecycle`]   — Aging state machine and id allocation
//! - [`store`]       — Track store contract + bounded in-memory impl
//! - [`emit`]        — Per-report emission and running counters
//! - [`engine`]      — Single-in-flight pipeline orchestrator

pub mod association;
pub mod emit;
pub mod engine;
pub mod error;
pub mod fixed;
pub mod fusion;
pub mod lifecycle;
pub mod store;
pub mod types;
pub mod validate;

pub use emit::{Counters, Disposition, TrackEmission};
pub use engine::{EngineConfig, FusionEngine};
pub use error::EngineError;
pub use fixed::Fixed;
pub use store::{MemoryStore, QueryWindow, TrackStore};
pub use types::{FusedId, FusedTrack, ReportFrame, SourceKind, TrackReport, TrackState};
