//! `sim` — Deterministic multi-source report streams for the fusion engine.

pub mod replay;
pub mod scenarios;
pub mod sources;

pub use replay::{load_log, save_log, ReportLog, TimedFrame};
pub use scenarios::{Scenario, ScenarioKind};
pub use sources::{SimSource, Target};
