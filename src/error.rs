//! Error types for system indexing and assembly.

use thiserror::Error;

use crate::indices::Formulation;

/// Errors raised while building indices, allocating systems, or assembling.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Start and stop connectivity arrays differ in length.
    #[error("connectivity mismatch: {n_start} start points but {n_stop} stop points")]
    MismatchedConnectivity { n_start: usize, n_stop: usize },

    /// An element references a point that does not exist.
    #[error("element {elem} references point {point}, but only {n_points} points exist")]
    PointOutOfRange {
        elem: usize,
        point: usize,
        n_points: usize,
    },

    /// A point is not connected to any element, so it has no state block.
    #[error("point {0} is not referenced by any element")]
    UnreferencedPoint(usize),

    /// A prescribed condition, point mass, or load names a missing entity.
    #[error("{kind} given for {entity} {id}, but only {count} exist")]
    EntityOutOfRange {
        kind: &'static str,
        entity: &'static str,
        id: usize,
        count: usize,
    },

    /// A vector or matrix has the wrong length for the system.
    #[error("{name} has length {actual}, expected {expected}")]
    VectorLength {
        name: &'static str,
        actual: usize,
        expected: usize,
    },

    /// A kernel wrote to an entry the sparsity pattern does not contain.
    #[error("entry ({row}, {col}) is outside the Jacobian sparsity pattern")]
    EntryOutsidePattern { row: usize, col: usize },

    /// Two sparse buffers were combined with different patterns or shapes.
    #[error("sparsity pattern mismatch: {0}")]
    PatternMismatch(String),

    /// The sparsity pattern could not be created.
    #[error("cannot create sparsity pattern: {0}")]
    PatternCreation(String),

    /// The body acceleration columns of the indices disagree with the
    /// prescribed conditions of the context.
    #[error("body acceleration columns {actual:?} do not match prescribed conditions {expected:?}")]
    BodyAccelerationMismatch {
        expected: [Option<usize>; 6],
        actual: [Option<usize>; 6],
    },

    /// Force scaling must be finite and strictly positive.
    #[error("invalid force scaling {0}: must be finite and positive")]
    InvalidForceScaling(f64),

    /// An assembler was used with indices built for another formulation.
    #[error("{mode} assembly requires {expected:?} indices, got {actual:?}")]
    FormulationMismatch {
        mode: &'static str,
        expected: Formulation,
        actual: Formulation,
    },

    /// Analysis settings could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssemblyError>;
