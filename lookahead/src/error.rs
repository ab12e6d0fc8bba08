//! Error types for estimator construction, queries and persistence.

use eda_common::fabric::{Axis, HierarchyError, TimingGroup, TileCoord};

/// Structural failures while building an estimator. These abort
/// construction and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("no {axis} path from {from} to {to} over distance {distance}")]
    Unreachable {
        from: TimingGroup,
        to: TimingGroup,
        axis: Axis,
        distance: u32,
    },

    #[error("inconsistent interconnect hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("no delay coefficients for declared timing group {0}")]
    MissingCoefficients(TimingGroup),

    #[error("distance array of {group} decreases at coordinate {index}")]
    DecreasingDistances { group: TimingGroup, index: usize },

    #[error("{axis} table limit {limit} is too narrow to extend long legs; needs at least {required}")]
    TableTooNarrow {
        axis: Axis,
        limit: u32,
        required: u32,
    },

    #[error("failed to start table construction workers: {0}")]
    ThreadPool(String),
}

/// Internal consistency failures detected while answering a query. They
/// abort the offending query only.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    #[error("negative delay {delay} ps for {group} hop from {start} to {end}")]
    NegativeWeight {
        group: TimingGroup,
        start: i64,
        end: i64,
        delay: f64,
    },

    #[error("no {axis} table entry for {from} -> {to} at distance {distance}")]
    MissingTable {
        axis: Axis,
        distance: u32,
        from: TimingGroup,
        to: TimingGroup,
    },

    #[error("path graph destination was never settled")]
    DestinationUnreachable,

    #[error("no table decomposition connects {src} to {sink}")]
    NoDecomposition { src: TileCoord, sink: TileCoord },
}

/// Persistence failures. Callers may recover by rebuilding the estimator.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("failed to encode estimator: {reason}")]
    Encode { reason: String },

    #[error("failed to decode estimator: {reason}")]
    Decode { reason: String },

    #[error("blob does not start with the estimator magic bytes")]
    BadMagic,

    #[error("format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum LookaheadError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl From<HierarchyError> for LookaheadError {
    fn from(err: HierarchyError) -> Self {
        LookaheadError::Construction(ConstructionError::Hierarchy(err))
    }
}

pub type Result<T, E = LookaheadError> = std::result::Result<T, E>;
