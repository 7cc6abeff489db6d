//! Error types shared across the coupler workspace.
//!
//! [`CouplingError`] is what a [`CouplingInterface`](crate::CouplingInterface)
//! implementation reports. [`QuadratureError`] comes from constructing
//! face quadrature rules, [`TimeError`] from configuring a [`Time`](crate::Time).

use std::error::Error;
use std::fmt;

use crate::id::{DataId, MeshId, VertexHandle};

/// Failures reported by the coupling library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CouplingError {
    /// No mesh with this name exists in the coupling configuration.
    UnknownMesh {
        /// The requested mesh name.
        name: String,
    },
    /// No data with this name exists on the given mesh.
    UnknownData {
        /// The requested data name.
        name: String,
        /// The mesh the data was looked up on.
        mesh: MeshId,
    },
    /// A data id that was never handed out.
    InvalidData {
        /// The offending data id.
        data: DataId,
    },
    /// A vertex handle not registered on the mesh of the data.
    UnknownVertex {
        /// The offending handle.
        vertex: VertexHandle,
        /// The mesh the handle was expected on.
        mesh: MeshId,
    },
    /// A value buffer whose length does not match the expected
    /// component count.
    ComponentCount {
        /// Number of components the library expected.
        expected: usize,
        /// Number of components supplied.
        got: usize,
    },
    /// The call is not allowed in the library's current state
    /// (e.g. registering vertices after `initialize`).
    InvalidState {
        /// Description of the violated protocol step.
        reason: String,
    },
}

impl fmt::Display for CouplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMesh { name } => write!(f, "unknown coupling mesh '{name}'"),
            Self::UnknownData { name, mesh } => {
                write!(f, "unknown data '{name}' on mesh {mesh}")
            }
            Self::InvalidData { data } => write!(f, "invalid data id {data}"),
            Self::UnknownVertex { vertex, mesh } => {
                write!(f, "vertex {vertex} is not registered on mesh {mesh}")
            }
            Self::ComponentCount { expected, got } => {
                write!(f, "expected {expected} components, got {got}")
            }
            Self::InvalidState { reason } => write!(f, "invalid coupling state: {reason}"),
        }
    }
}

impl Error for CouplingError {}

/// Errors from constructing a [`FaceQuadrature`](crate::FaceQuadrature).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuadratureError {
    /// A rule with zero points per direction was requested.
    ZeroPoints,
    /// Face dimension outside `0..=2`.
    UnsupportedFaceDim {
        /// The requested face dimension.
        face_dim: usize,
    },
}

impl fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPoints => write!(f, "quadrature needs at least one point per direction"),
            Self::UnsupportedFaceDim { face_dim } => {
                write!(f, "face dimension {face_dim} is not supported (expected 0, 1 or 2)")
            }
        }
    }
}

impl Error for QuadratureError {}

/// Errors from configuring a [`Time`](crate::Time).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeError {
    /// The step size is zero, negative or not finite.
    InvalidStep {
        /// The rejected step size.
        delta: f64,
    },
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStep { delta } => {
                write!(f, "time step must be finite and positive, got {delta}")
            }
        }
    }
}

impl Error for TimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mesh_names_the_mesh() {
        let err = CouplingError::UnknownMesh {
            name: "Solid-Mesh".to_string(),
        };
        assert_eq!(err.to_string(), "unknown coupling mesh 'Solid-Mesh'");
    }

    #[test]
    fn component_count_display() {
        let err = CouplingError::ComponentCount {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "expected 3 components, got 2");
    }
}
