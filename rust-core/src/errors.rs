//! Error taxonomy of the tight-binding core.
//!
//! Geometry and assembly errors are raised before any solve starts and never
//! leave a half-applied result behind. Hermiticity problems are not errors;
//! see [`crate::model::NonHermitianWarning`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TbError {
    #[error("degenerate lattice: periodic cell volume {volume:e} is numerically zero")]
    DegenerateLattice { volume: f64 },

    #[error("invalid dimensionality {requested}: {reason}")]
    InvalidDimensionality { requested: usize, reason: String },

    #[error("invalid supercell multiplier {value} along axis {axis}: {reason}")]
    InvalidMultiplier {
        axis: usize,
        value: i64,
        reason: String,
    },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("solve cancelled")]
    SolverCancelled,

    #[error("a solve is already in flight for this unit cell")]
    SolverBusy,

    #[error("solver worker terminated abnormally: {0}")]
    WorkerPanicked(String),

    #[error("unknown state index {index} (unit cell has {count} states)")]
    UnknownState { index: usize, count: usize },

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("invalid band path: {0}")]
    InvalidPath(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl TbError {
    /// Cooperative cancellation is reported through the error channel but is not a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TbError::SolverCancelled)
    }
}

pub type Result<T> = std::result::Result<T, TbError>;
