//! Abstraction traits for the two external collaborators of the adapter:
//! the coupling library and the finite-element discretization.

use std::fmt;
use std::path::Path;

use crate::error::CouplingError;
use crate::id::{BoundaryId, DataId, FaceId, MeshId, Point, VertexHandle};
use crate::quadrature::FaceQuadrature;

/// Identity a coupling library is opened with.
///
/// `rank` and `size` place this process among all processes of the
/// participant; a serial solver is rank `0` of `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Participant<'a> {
    /// Participant name in the coupling configuration file.
    pub name: &'a str,
    /// Path of the coupling configuration file.
    pub config_file: &'a Path,
    /// Zero-based rank of this process.
    pub rank: u32,
    /// Number of processes of this participant.
    pub size: u32,
}

/// Actions the coupling library may require from a participant.
///
/// Polled with [`CouplingInterface::is_action_required`] and acknowledged
/// with [`CouplingInterface::mark_action_fulfilled`]. These are flags
/// driving control flow, never errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CouplingAction {
    /// Initial data must be written before `initialize_data`.
    WriteInitialData,
    /// The participant must store its state (implicit coupling).
    WriteIterationCheckpoint,
    /// The participant must restore its stored state (implicit coupling).
    ReadIterationCheckpoint,
}

impl CouplingAction {
    /// All actions, in declaration order.
    pub const ALL: [CouplingAction; 3] = [
        Self::WriteInitialData,
        Self::WriteIterationCheckpoint,
        Self::ReadIterationCheckpoint,
    ];
}

impl fmt::Display for CouplingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteInitialData => write!(f, "write-initial-data"),
            Self::WriteIterationCheckpoint => write!(f, "write-iteration-checkpoint"),
            Self::ReadIterationCheckpoint => write!(f, "read-iteration-checkpoint"),
        }
    }
}

/// The coupling library as seen by one participant rank.
///
/// Every call is blocking: it returns before the next step proceeds.
/// Waiting for peers, mapping between meshes and convergence checks all
/// happen inside the implementation (typically inside [`advance`](Self::advance)).
///
/// Vertex data is always exchanged as vectors with
/// [`dimensions()`](Self::dimensions) components per vertex.
pub trait CouplingInterface {
    /// Spatial dimensionality of the coupling configuration.
    fn dimensions(&self) -> usize;

    /// Look up a mesh by its configured name.
    fn mesh_id(&self, name: &str) -> Result<MeshId, CouplingError>;

    /// Look up a data field by name on a mesh.
    fn data_id(&self, name: &str, mesh: MeshId) -> Result<DataId, CouplingError>;

    /// Register one vertex at `position` and return its handle.
    fn set_mesh_vertex(&mut self, mesh: MeshId, position: &[f64])
        -> Result<VertexHandle, CouplingError>;

    /// Finish setup and establish the connection to the other participants.
    ///
    /// Returns the maximum allowed length of the first time step.
    fn initialize(&mut self) -> Result<f64, CouplingError>;

    /// Exchange initial data after it was written.
    fn initialize_data(&mut self) -> Result<(), CouplingError>;

    /// Advance the coupling by `dt`. Returns the maximum allowed length of
    /// the next time step.
    fn advance(&mut self, dt: f64) -> Result<f64, CouplingError>;

    /// `false` once the coupled simulation has reached its end.
    fn is_coupling_ongoing(&self) -> bool;

    /// Whether the library requires `action` to be performed now.
    fn is_action_required(&self, action: CouplingAction) -> bool;

    /// Acknowledge that `action` was performed.
    fn mark_action_fulfilled(&mut self, action: CouplingAction);

    /// Whether data has to be written before advancing by `dt`.
    fn is_write_data_required(&self, dt: f64) -> bool;

    /// Whether new data arrived during the last `advance`.
    fn is_read_data_available(&self) -> bool;

    /// Write one vector value for `vertex`.
    fn write_vector_data(
        &mut self,
        data: DataId,
        vertex: VertexHandle,
        value: &[f64],
    ) -> Result<(), CouplingError>;

    /// Read one vector value for `vertex` into `out`.
    fn read_vector_data(
        &self,
        data: DataId,
        vertex: VertexHandle,
        out: &mut [f64],
    ) -> Result<(), CouplingError>;

    /// Read the vector values of all `vertices` into `out`, vertex-major
    /// (`out[i * dim + d]`).
    fn read_block_vector_data(
        &self,
        data: DataId,
        vertices: &[VertexHandle],
        out: &mut [f64],
    ) -> Result<(), CouplingError>;

    /// Tear the connection down. No other call is valid afterwards.
    fn finalize(&mut self) -> Result<(), CouplingError>;
}

/// Boundary traversal and evaluation capability of the solver.
///
/// Implementations must be deterministic: two traversals of the same mesh
/// configuration visit the same faces in the same order, and quadrature
/// point `q` of a face always refers to the same physical location in
/// [`quadrature_points`](Self::quadrature_points) and
/// [`field_values`](Self::field_values).
pub trait BoundaryDiscretization {
    /// The solver's solution container.
    type Field;

    /// Spatial dimension of the solver mesh.
    fn dim(&self) -> usize;

    /// Boundary faces tagged with `boundary`, in traversal order.
    fn boundary_faces(&self, boundary: BoundaryId) -> Box<dyn Iterator<Item = FaceId> + '_>;

    /// Physical coordinates of each quadrature point of `face`.
    ///
    /// Clears `out` and pushes one point of `dim()` components per
    /// quadrature point, in quadrature order.
    fn quadrature_points(&self, face: FaceId, quadrature: &FaceQuadrature, out: &mut Vec<Point>);

    /// Field values at each quadrature point of `face`.
    ///
    /// Clears `out` and pushes `dim()` components per quadrature point,
    /// point-major, in the same order as
    /// [`quadrature_points`](Self::quadrature_points).
    fn field_values(
        &self,
        field: &Self::Field,
        face: FaceId,
        quadrature: &FaceQuadrature,
        out: &mut Vec<f64>,
    );
}
