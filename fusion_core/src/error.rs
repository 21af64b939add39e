//! Engine error taxonomy.
//!
//! Validator- and association-level errors are handled locally by the
//! engine (report dropped, rejection counter incremented, no mutation).
//! `StoreCapacityExceeded` is surfaced to the caller since capacity policy
//! is a deployment decision. `LatencyBudgetExceeded` is fatal: it indicates
//! a design or configuration fault, not a transient condition.

use thiserror::Error;

/// Why a report frame failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MalformedReport {
    #[error("unknown source id {0}")]
    UnknownSource(u8),
    #[error("non-finite value in field `{0}`")]
    NonFinite(&'static str),
    #[error("field `{0}` outside the Q16.16 range")]
    OutOfRange(&'static str),
}

/// Per-report processing error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("report quality {quality} below minimum {min_quality}")]
    RejectedLowQuality { quality: u8, min_quality: u8 },

    #[error("malformed report: {0}")]
    RejectedMalformedInput(#[from] MalformedReport),

    #[error("association ambiguous: {candidates} equally ranked candidates")]
    AssociationAmbiguous { candidates: usize },

    #[error("track store at capacity, cannot create new track")]
    StoreCapacityExceeded,

    #[error("report processing took {elapsed_us} µs, budget {budget_us} µs")]
    LatencyBudgetExceeded { elapsed_us: u64, budget_us: u64 },
}

impl EngineError {
    /// True for errors that drop the report without mutating any track.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, EngineError::LatencyBudgetExceeded { .. })
    }
}
