//! Data transfer between solver fields and coupling-mesh vertices.
//!
//! Writes re-run the enumeration traversal and pair each quadrature point
//! with the next handle of the write set. Reads go through a
//! [`ReadBuffer`] that is refreshed in one bulk call whenever the library
//! reports new data.

use coupler_core::{
    BoundaryDiscretization, BoundaryId, CouplingInterface, DataId, FaceQuadrature, VertexHandle,
};

use crate::error::{AdapterError, ConsistencyError};
use crate::interface::InterfaceMesh;

// ── Write path ─────────────────────────────────────────────────────

/// Write `dim` field components for every vertex of `write_mesh`.
///
/// The traversal must reproduce the one used at enumeration exactly:
/// running out of handles ([`ConsistencyError::WriteVertexOverrun`]) or
/// finishing with handles left ([`ConsistencyError::WriteVertexUnderrun`])
/// means the mesh or the quadrature changed in between.
///
/// The whole traversal is evaluated and checked before the first value is
/// sent, so a consistency error leaves the library's data untouched. A
/// library error part way through the sends can leave a partial write.
///
/// Returns the number of vertices written.
pub fn write_all_quadrature_nodes<C, D>(
    coupling: &mut C,
    data: DataId,
    write_mesh: &InterfaceMesh,
    discretization: &D,
    field: &D::Field,
    boundary: BoundaryId,
    quadrature: &FaceQuadrature,
) -> Result<usize, AdapterError>
where
    C: CouplingInterface + ?Sized,
    D: BoundaryDiscretization + ?Sized,
{
    let dim = discretization.dim();
    let n_q = quadrature.len();
    let registered = write_mesh.len();
    let mut values: Vec<f64> = Vec::with_capacity(n_q * dim);
    let mut staged: Vec<f64> = Vec::with_capacity(registered * dim);

    for face in discretization.boundary_faces(boundary) {
        discretization.field_values(field, face, quadrature, &mut values);
        if values.len() != n_q * dim {
            return Err(ConsistencyError::FieldValueCount {
                face,
                expected: n_q * dim,
                got: values.len(),
            }
            .into());
        }
        if staged.len() + values.len() > registered * dim {
            return Err(ConsistencyError::WriteVertexOverrun { registered }.into());
        }
        staged.extend_from_slice(&values);
    }

    let written = if dim == 0 { 0 } else { staged.len() / dim };
    if written != registered {
        return Err(ConsistencyError::WriteVertexUnderrun {
            registered,
            written,
        }
        .into());
    }

    for (&handle, point_values) in write_mesh.handles().iter().zip(staged.chunks_exact(dim.max(1))) {
        coupling.write_vector_data(data, handle, point_values)?;
    }
    Ok(written)
}

// ── ReadBuffer ─────────────────────────────────────────────────────

/// Incoming vertex data, `dim` components per read vertex.
///
/// Vertex `i` occupies `values[i * dim..(i + 1) * dim]`, where `i` is the
/// vertex's position in the read vertex set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadBuffer {
    dim: usize,
    values: Vec<f64>,
}

impl ReadBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the buffer for `n_vertices` vertices of `dim` components,
    /// zero-filled.
    pub fn resize(&mut self, n_vertices: usize, dim: usize) {
        self.dim = dim;
        self.values.clear();
        self.values.resize(n_vertices * dim, 0.0);
    }

    /// Replace the contents with the library's current data for `handles`.
    pub fn refresh<C>(
        &mut self,
        coupling: &C,
        data: DataId,
        handles: &[VertexHandle],
    ) -> Result<(), AdapterError>
    where
        C: CouplingInterface + ?Sized,
    {
        debug_assert_eq!(self.values.len(), handles.len() * self.dim);
        if handles.is_empty() {
            return Ok(());
        }
        coupling.read_block_vector_data(data, handles, &mut self.values)?;
        Ok(())
    }

    /// Components of read vertex `index`.
    pub fn vertex(&self, index: usize) -> Result<&[f64], ConsistencyError> {
        let len = self.n_vertices();
        if index >= len {
            return Err(ConsistencyError::ReadIndexOutOfRange { index, len });
        }
        let start = index * self.dim;
        Ok(&self.values[start..start + self.dim])
    }

    /// Number of vertices the buffer holds.
    pub fn n_vertices(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.values.len() / self.dim
        }
    }

    /// Components per vertex.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The flat buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::enumerate_interface;
    use coupler_core::MeshId;
    use coupler_test_utils::{BoundaryField, BoxBoundary, MockCoupling};
    use smallvec::smallvec;

    const MESH: &str = "Solid-Mesh";
    const WRITE_DATA: &str = "calculated-data";

    fn setup(
        boundary: &BoxBoundary,
        q: &FaceQuadrature,
    ) -> (MockCoupling, MeshId, DataId, InterfaceMesh) {
        let mut mock = MockCoupling::new(boundary.dim())
            .with_mesh(MESH)
            .with_data(MESH, WRITE_DATA);
        let mesh = mock.mesh_id(MESH).unwrap();
        let data = mock.data_id(WRITE_DATA, mesh).unwrap();
        let iface =
            enumerate_interface(&mut mock, mesh, boundary, BoxBoundary::TOP, q, None).unwrap();
        (mock, mesh, data, iface)
    }

    #[test]
    fn writes_one_vector_per_vertex_in_registration_order() {
        let boundary = BoxBoundary::rectangle([3, 1], [3.0, 1.0]);
        let q = FaceQuadrature::gauss(2, 1).unwrap();
        let (mut mock, mesh, data, iface) = setup(&boundary, &q);
        let field = BoundaryField::analytic(|x| smallvec![x[0], -x[0]]);

        let n = write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &boundary,
            &field,
            BoxBoundary::TOP,
            &q,
        )
        .unwrap();
        assert_eq!(n, 6);

        for &handle in iface.handles() {
            let written = mock.written(data, handle).unwrap();
            let pos = mock.vertex_position(mesh, handle).unwrap();
            assert_eq!(written.as_slice(), &[pos[0], -pos[0]]);
        }
    }

    #[test]
    fn repeated_writes_are_idempotent() {
        let boundary = BoxBoundary::rectangle([2, 2], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(3, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&boundary, &q);
        let field = BoundaryField::analytic(|x| smallvec![x[0] * x[1], 1.0]);

        let write = |mock: &mut MockCoupling| {
            write_all_quadrature_nodes(mock, data, &iface, &boundary, &field, BoxBoundary::TOP, &q)
                .unwrap();
            iface
                .handles()
                .iter()
                .map(|&h| mock.written(data, h).unwrap().to_vec())
                .collect::<Vec<_>>()
        };
        let first = write(&mut mock);
        let second = write(&mut mock);
        assert_eq!(first, second);
    }

    #[test]
    fn refined_mesh_overruns_the_write_set() {
        let coarse = BoxBoundary::rectangle([2, 1], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(1, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&coarse, &q);
        let fine = BoxBoundary::rectangle([4, 1], [1.0, 1.0]);
        let field = BoundaryField::analytic(|_| smallvec![0.0, 0.0]);

        match write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &fine,
            &field,
            BoxBoundary::TOP,
            &q,
        ) {
            Err(AdapterError::Consistency(ConsistencyError::WriteVertexOverrun {
                registered: 2,
            })) => {}
            other => panic!("expected WriteVertexOverrun, got {other:?}"),
        }
    }

    #[test]
    fn coarsened_mesh_underruns_the_write_set() {
        let fine = BoxBoundary::rectangle([4, 1], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(1, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&fine, &q);
        let coarse = BoxBoundary::rectangle([2, 1], [1.0, 1.0]);
        let field = BoundaryField::analytic(|_| smallvec![0.0, 0.0]);

        match write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &coarse,
            &field,
            BoxBoundary::TOP,
            &q,
        ) {
            Err(AdapterError::Consistency(ConsistencyError::WriteVertexUnderrun {
                registered: 4,
                written: 2,
            })) => {}
            other => panic!("expected WriteVertexUnderrun, got {other:?}"),
        }
    }

    #[test]
    fn short_field_evaluation_is_rejected() {
        let boundary = BoxBoundary::rectangle([1, 1], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(2, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&boundary, &q);
        // Three values cannot cover two points of two components.
        let field = BoundaryField::per_point(vec![1.0, 2.0, 3.0]);

        match write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &boundary,
            &field,
            BoxBoundary::TOP,
            &q,
        ) {
            Err(AdapterError::Consistency(ConsistencyError::FieldValueCount {
                expected: 4,
                got: 3,
                ..
            })) => {}
            other => panic!("expected FieldValueCount, got {other:?}"),
        }
    }

    #[test]
    fn failed_write_sends_nothing() {
        let boundary = BoxBoundary::rectangle([2, 1], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(2, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&boundary, &q);
        // The first face is complete, the second one is one value short.
        let field = BoundaryField::per_point(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        let result = write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &boundary,
            &field,
            BoxBoundary::TOP,
            &q,
        );
        assert!(matches!(
            result,
            Err(AdapterError::Consistency(
                ConsistencyError::FieldValueCount { got: 3, .. }
            ))
        ));
        assert!(iface
            .handles()
            .iter()
            .all(|&h| mock.written(data, h).is_none()));
    }

    #[test]
    fn overrun_sends_nothing() {
        let coarse = BoxBoundary::rectangle([2, 1], [1.0, 1.0]);
        let q = FaceQuadrature::gauss(1, 1).unwrap();
        let (mut mock, _, data, iface) = setup(&coarse, &q);
        let fine = BoxBoundary::rectangle([3, 1], [1.0, 1.0]);
        let field = BoundaryField::analytic(|_| smallvec![1.0, 1.0]);

        assert!(write_all_quadrature_nodes(
            &mut mock,
            data,
            &iface,
            &fine,
            &field,
            BoxBoundary::TOP,
            &q,
        )
        .is_err());
        assert!(iface
            .handles()
            .iter()
            .all(|&h| mock.written(data, h).is_none()));
    }

    #[test]
    fn read_buffer_bounds_are_checked() {
        let mut buf = ReadBuffer::new();
        buf.resize(3, 2);
        assert_eq!(buf.n_vertices(), 3);
        assert_eq!(buf.vertex(2).unwrap(), &[0.0, 0.0]);
        assert_eq!(
            buf.vertex(3),
            Err(ConsistencyError::ReadIndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn empty_read_buffer_rejects_every_index() {
        let buf = ReadBuffer::new();
        assert_eq!(buf.n_vertices(), 0);
        assert!(buf.vertex(0).is_err());
    }
}
