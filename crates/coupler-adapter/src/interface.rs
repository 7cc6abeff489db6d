//! Interface enumeration: registering boundary quadrature points as
//! coupling-mesh vertices.
//!
//! The coupling library identifies vertices only by the handles it hands
//! out. The adapter therefore keeps, per direction, the handles in the
//! exact order the boundary traversal produced them ([`InterfaceMesh`]).
//! Every later read or write re-runs the same traversal and walks the
//! handle list in lockstep.
//!
//! The read side additionally records where each face's vertices start
//! ([`FaceIndexMap`]), so assembly loops can find incoming data for a
//! face without traversing the boundary again.

use indexmap::map::Entry;
use indexmap::IndexMap;

use coupler_core::{
    BoundaryDiscretization, BoundaryId, CouplingInterface, FaceId, FaceQuadrature, MeshId, Point,
    VertexHandle,
};

use crate::error::{AdapterError, ConsistencyError};

// ── InterfaceMesh ──────────────────────────────────────────────────

/// Ordered vertex handles of one coupling mesh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceMesh {
    mesh: MeshId,
    handles: Vec<VertexHandle>,
}

impl InterfaceMesh {
    /// An empty vertex set on `mesh`.
    pub fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            handles: Vec::new(),
        }
    }

    /// The coupling mesh the vertices are registered on.
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// Handles in traversal order.
    pub fn handles(&self) -> &[VertexHandle] {
        &self.handles
    }

    /// Number of registered vertices.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// `true` if no vertex is registered.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

// ── FaceIndexMap ───────────────────────────────────────────────────

/// Offset of each interface face's first vertex in the read vertex set.
///
/// Holds face ids without owning the faces; it is only valid for the mesh
/// configuration it was built from and is rebuilt on every enumeration.
/// Insertion order is traversal order and offsets increase monotonically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceIndexMap {
    offsets: IndexMap<FaceId, usize>,
}

impl FaceIndexMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `face` at `offset`. Offsets come from the growing vertex
    /// set, so they are monotonic; a face seen twice is rejected.
    fn insert(&mut self, face: FaceId, offset: usize) -> Result<(), ConsistencyError> {
        match self.offsets.entry(face) {
            Entry::Occupied(_) => Err(ConsistencyError::DuplicateFace { face }),
            Entry::Vacant(slot) => {
                slot.insert(offset);
                Ok(())
            }
        }
    }

    /// Starting offset of `face`, if it lies on the interface.
    pub fn offset(&self, face: FaceId) -> Option<usize> {
        self.offsets.get(&face).copied()
    }

    /// Number of interface faces.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` if no face was recorded.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `(face, offset)` pairs in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceId, usize)> + '_ {
        self.offsets.iter().map(|(&f, &o)| (f, o))
    }

    fn clear(&mut self) {
        self.offsets.clear();
    }
}

// ── Enumeration ────────────────────────────────────────────────────

/// Register every quadrature point of every face tagged `boundary` as a
/// vertex of `mesh`.
///
/// With `face_map` given (read side), the map is cleared and each face's
/// starting offset is recorded before its points are registered. A face
/// yielded twice by the traversal is [`ConsistencyError::DuplicateFace`]
/// on either side.
pub fn enumerate_interface<C, D>(
    coupling: &mut C,
    mesh: MeshId,
    discretization: &D,
    boundary: BoundaryId,
    quadrature: &FaceQuadrature,
    face_map: Option<&mut FaceIndexMap>,
) -> Result<InterfaceMesh, AdapterError>
where
    C: CouplingInterface + ?Sized,
    D: BoundaryDiscretization + ?Sized,
{
    let dim = discretization.dim();
    let n_q = quadrature.len();
    let mut interface = InterfaceMesh::new(mesh);
    let mut points: Vec<Point> = Vec::with_capacity(n_q);
    let mut scratch = FaceIndexMap::new();
    let map = face_map.unwrap_or(&mut scratch);
    map.clear();

    for face in discretization.boundary_faces(boundary) {
        discretization.quadrature_points(face, quadrature, &mut points);
        check_points(face, &points, n_q, dim)?;
        map.insert(face, interface.len())?;

        for point in &points {
            let handle = coupling.set_mesh_vertex(mesh, point)?;
            interface.handles.push(handle);
        }
    }

    Ok(interface)
}

fn check_points(
    face: FaceId,
    points: &[Point],
    n_q: usize,
    dim: usize,
) -> Result<(), ConsistencyError> {
    let got: usize = points.iter().map(|p| p.len()).sum();
    if points.len() != n_q || got != n_q * dim {
        return Err(ConsistencyError::QuadraturePointCount {
            face,
            expected: n_q * dim,
            got,
        });
    }
    Ok(())
}
