//! Adapter error types.
//!
//! Every `Err` returned by the adapter is fatal for the coupled run:
//! configuration errors are found at setup, consistency errors point at a
//! defect in the caller (mesh changed without re-enumeration, mismatched
//! checkpoint lists, out-of-range lookups), and coupling errors are passed
//! through from the library. None of them is retried.

use std::error::Error;
use std::fmt;

use coupler_core::{CouplingError, FaceId};

use crate::config::ConfigError;

/// Internal bookkeeping violations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsistencyError {
    /// The operation needs an initialized adapter.
    NotInitialized,
    /// `initialize` was called a second time.
    AlreadyInitialized,
    /// The adapter was finalized; no further coupling calls are valid.
    Finalized,
    /// The write traversal produced more points than were registered.
    WriteVertexOverrun {
        /// Number of registered write vertices.
        registered: usize,
    },
    /// The write traversal finished with registered vertices left over.
    WriteVertexUnderrun {
        /// Number of registered write vertices.
        registered: usize,
        /// Number of vertices actually written.
        written: usize,
    },
    /// The discretization returned a different number of quadrature
    /// points (or coordinates per point) than the rule prescribes.
    QuadraturePointCount {
        /// The face being evaluated.
        face: FaceId,
        /// Expected number of scalars.
        expected: usize,
        /// Number of scalars received.
        got: usize,
    },
    /// The discretization returned a different number of field
    /// components than `points * dim`.
    FieldValueCount {
        /// The face being evaluated.
        face: FaceId,
        /// Expected number of scalars.
        expected: usize,
        /// Number of scalars received.
        got: usize,
    },
    /// A read-side lookup past the number of read vertices.
    ReadIndexOutOfRange {
        /// The requested vertex index.
        index: usize,
        /// Number of read vertices.
        len: usize,
    },
    /// The boundary traversal yielded the same face twice.
    DuplicateFace {
        /// The repeated face.
        face: FaceId,
    },
    /// A face that is not part of the coupling interface.
    UnknownFace {
        /// The requested face.
        face: FaceId,
    },
    /// A restore was requested before any state was saved.
    NoCheckpoint,
    /// The restore list has a different length than the saved snapshot.
    CheckpointLengthMismatch {
        /// Number of vectors in the snapshot.
        stored: usize,
        /// Number of vectors supplied for restore.
        supplied: usize,
    },
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "adapter is not initialized"),
            Self::AlreadyInitialized => write!(f, "adapter is already initialized"),
            Self::Finalized => write!(f, "adapter is finalized"),
            Self::WriteVertexOverrun { registered } => write!(
                f,
                "write traversal exceeds the {registered} registered write vertices; \
                 the mesh or quadrature changed since enumeration"
            ),
            Self::WriteVertexUnderrun {
                registered,
                written,
            } => write!(
                f,
                "write traversal covered {written} of {registered} registered write vertices; \
                 the mesh or quadrature changed since enumeration"
            ),
            Self::QuadraturePointCount {
                face,
                expected,
                got,
            } => write!(
                f,
                "face {face}: expected {expected} quadrature coordinates, got {got}"
            ),
            Self::FieldValueCount {
                face,
                expected,
                got,
            } => write!(f, "face {face}: expected {expected} field values, got {got}"),
            Self::ReadIndexOutOfRange { index, len } => {
                write!(f, "read vertex index {index} out of range for {len} vertices")
            }
            Self::DuplicateFace { face } => {
                write!(f, "face {face} appears twice in the boundary traversal")
            }
            Self::UnknownFace { face } => {
                write!(f, "face {face} is not on the coupling interface")
            }
            Self::NoCheckpoint => write!(f, "restore requested before any state was saved"),
            Self::CheckpointLengthMismatch { stored, supplied } => write!(
                f,
                "state variables are not the same as previously saved: \
                 {stored} stored, {supplied} supplied"
            ),
        }
    }
}

impl Error for ConsistencyError {}

/// Top-level adapter error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdapterError {
    /// Invalid configuration or configuration/solver mismatch.
    Config(ConfigError),
    /// Bookkeeping violation.
    Consistency(ConsistencyError),
    /// Failure reported by the coupling library.
    Coupling(CouplingError),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Consistency(e) => write!(f, "consistency: {e}"),
            Self::Coupling(e) => write!(f, "coupling library: {e}"),
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Consistency(e) => Some(e),
            Self::Coupling(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AdapterError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ConsistencyError> for AdapterError {
    fn from(e: ConsistencyError) -> Self {
        Self::Consistency(e)
    }
}

impl From<CouplingError> for AdapterError {
    fn from(e: CouplingError) -> Self {
        Self::Coupling(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_chains_to_inner_error() {
        let err = AdapterError::from(ConsistencyError::NoCheckpoint);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("restore requested before any state was saved")
        );
    }

    #[test]
    fn overrun_message_names_the_cause() {
        let msg = ConsistencyError::WriteVertexOverrun { registered: 4 }.to_string();
        assert!(msg.contains("4 registered"));
        assert!(msg.contains("changed since enumeration"));
    }
}
