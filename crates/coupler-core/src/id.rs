//! Strongly-typed identifiers and the [`Point`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Library-assigned handle of a registered interface vertex.
///
/// Returned by [`CouplingInterface::set_mesh_vertex`](crate::CouplingInterface::set_mesh_vertex)
/// and passed back verbatim on every read and write of that vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexHandle(pub i32);

impl fmt::Display for VertexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for VertexHandle {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Library-assigned identifier of a coupling mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub i32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MeshId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Library-assigned identifier of a data field living on a coupling mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub i32);

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for DataId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Solver-side identifier of one boundary face.
///
/// Only meaningful for the mesh configuration it was produced by; any
/// mesh change invalidates every stored `FaceId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FaceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Boundary marker used by the solver mesh to tag a surface.
///
/// The coupling surface is identified by one such marker. The same
/// marker must not be reused for another part of the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryId(pub u32);

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BoundaryId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A point (or vector of components) in physical space.
///
/// Uses `SmallVec<[f64; 3]>` so coordinates of 2D and 3D problems stay
/// on the stack.
pub type Point = SmallVec<[f64; 3]>;
