//! Integration tests: complete coupled runs against the loopback mock.
//!
//! Covers the explicit write/echo/read cycle on shared and split meshes,
//! write sampling, and implicit coupling with checkpoint rollback.

use coupler_adapter::{Adapter, AdapterConfig, AdapterError, ConsistencyError, MeshNames};
use coupler_core::{
    BoundaryDiscretization, CouplingAction, CouplingInterface, FaceQuadrature, SimulationClock,
    Time,
};
use coupler_test_utils::{BoundaryField, BoxBoundary, MockCoupling};
use smallvec::smallvec;

const MESH: &str = "Solid-Mesh";
const READ_MESH: &str = "Solid-Read-Mesh";
const WRITE_MESH: &str = "Solid-Write-Mesh";
const READ_DATA: &str = "received-data";
const WRITE_DATA: &str = "calculated-data";

fn shared_config() -> AdapterConfig {
    AdapterConfig {
        mesh_names: MeshNames::shared(MESH),
        ..AdapterConfig::default()
    }
}

fn shared_mock(dim: usize) -> MockCoupling {
    MockCoupling::new(dim)
        .with_mesh(MESH)
        .with_data(MESH, READ_DATA)
        .with_data(MESH, WRITE_DATA)
        .with_echo(WRITE_DATA, READ_DATA)
}

fn zero_field() -> BoundaryField {
    BoundaryField::analytic(|x| smallvec![0.0; x.len()])
}

// ── Explicit coupling ────────────────────────────────────────────────

#[test]
fn single_face_write_echo_read() {
    let boundary = BoxBoundary::rectangle([1, 1], [1.0, 1.0]);
    let q = FaceQuadrature::gauss(2, 1).unwrap();
    let mut adapter: Adapter<_> =
        Adapter::new(shared_config(), shared_mock(2), BoxBoundary::TOP).unwrap();

    adapter.initialize(&boundary, &q, &q, &zero_field()).unwrap();
    assert_eq!(adapter.write_mesh().unwrap().len(), 2);
    assert_eq!(adapter.read_mesh().unwrap().len(), 2);
    assert_eq!(adapter.face_map().unwrap().len(), 1);

    let field = BoundaryField::per_point(vec![1.0, 2.0, 3.0, 4.0]);
    adapter.advance(&field, &boundary, &q, 0.1).unwrap();

    assert_eq!(
        adapter.read_on_quadrature_point(0).unwrap().as_slice(),
        &[1.0, 2.0]
    );
    assert_eq!(
        adapter.read_on_quadrature_point(1).unwrap().as_slice(),
        &[3.0, 4.0]
    );
    assert_eq!(
        adapter.read_on_quadrature_point_with_id(0).unwrap(),
        &[1.0, 2.0]
    );
    assert_eq!(
        adapter.read_on_quadrature_point_with_id(1).unwrap(),
        &[3.0, 4.0]
    );
}

#[test]
fn both_read_modes_agree_on_every_point() {
    let boundary = BoxBoundary::rectangle([5, 2], [1.0, 0.5]);
    let q = FaceQuadrature::gauss(3, 1).unwrap();
    let mut adapter: Adapter<_> =
        Adapter::new(shared_config(), shared_mock(2), BoxBoundary::TOP).unwrap();
    adapter.initialize(&boundary, &q, &q, &zero_field()).unwrap();

    let field = BoundaryField::analytic(|x| smallvec![x[0].sin(), x[0] * x[1]]);
    adapter.advance(&field, &boundary, &q, 0.1).unwrap();

    let n = adapter.read_mesh().unwrap().len();
    assert_eq!(n, 15);
    for i in 0..n {
        let direct = adapter.read_on_quadrature_point(i).unwrap();
        let buffered = adapter.read_on_quadrature_point_with_id(i).unwrap();
        assert_eq!(direct.as_slice(), buffered);
    }
}

#[test]
fn split_meshes_round_trip_through_face_offsets() {
    let config = AdapterConfig {
        mesh_names: MeshNames::split(READ_MESH, WRITE_MESH),
        ..AdapterConfig::default()
    };
    let mock = MockCoupling::new(3)
        .with_mesh(READ_MESH)
        .with_mesh(WRITE_MESH)
        .with_data(READ_MESH, READ_DATA)
        .with_data(WRITE_MESH, WRITE_DATA)
        .with_echo(WRITE_DATA, READ_DATA);
    let boundary = BoxBoundary::cuboid([2, 3, 2], [2.0, 3.0, 1.0]);
    let q = FaceQuadrature::gauss(2, 2).unwrap();
    let mut adapter: Adapter<_> = Adapter::new(config, mock, BoxBoundary::FRONT).unwrap();
    adapter.initialize(&boundary, &q, &q, &zero_field()).unwrap();

    let ids = adapter.ids().unwrap();
    assert_ne!(ids.read_mesh, ids.write_mesh);

    let f = |x: &[f64]| -> coupler_core::Point { smallvec![x[0], x[1], x[0] + x[1]] };
    adapter
        .advance(&BoundaryField::analytic(f), &boundary, &q, 0.1)
        .unwrap();

    let mut points = Vec::new();
    for face in boundary.boundary_faces(BoxBoundary::FRONT) {
        let start = adapter.node_id(face).unwrap();
        boundary.quadrature_points(face, &q, &mut points);
        for (k, p) in points.iter().enumerate() {
            let value = adapter.read_on_quadrature_point_with_id(start + k).unwrap();
            assert_eq!(value, f(p.as_slice()).as_slice());
        }
    }
}

#[test]
fn write_sampling_densifies_only_the_write_set() {
    let config = AdapterConfig {
        write_sampling: Some(4),
        ..shared_config()
    };
    let boundary = BoxBoundary::rectangle([3, 3], [1.0, 1.0]);
    let solver_rule = FaceQuadrature::gauss(2, 1).unwrap();
    let mut adapter: Adapter<_> =
        Adapter::new(config, shared_mock(2), BoxBoundary::RIGHT).unwrap();
    let write_rule = adapter.write_quadrature(&solver_rule).unwrap();

    adapter
        .initialize(&boundary, &write_rule, &solver_rule, &zero_field())
        .unwrap();
    assert_eq!(adapter.write_mesh().unwrap().len(), 3 * 4);
    assert_eq!(adapter.read_mesh().unwrap().len(), 3 * 2);

    adapter
        .advance(&zero_field(), &boundary, &write_rule, 0.1)
        .unwrap();
    // The solver rule on the write path no longer matches the write set.
    assert!(matches!(
        adapter.advance(&zero_field(), &boundary, &solver_rule, 0.1),
        Err(AdapterError::Consistency(
            ConsistencyError::WriteVertexUnderrun { .. }
        ))
    ));
}

#[test]
fn explicit_run_reaches_the_end_time() {
    let boundary = BoxBoundary::rectangle([2, 2], [1.0, 1.0]);
    let q = FaceQuadrature::gauss(2, 1).unwrap();
    let mock = shared_mock(2).with_max_time(0.5).with_max_dt(0.1);
    let mut adapter: Adapter<_> = Adapter::new(shared_config(), mock, BoxBoundary::TOP).unwrap();
    let mut clock = Time::new(0.0, 0.5, 0.1).unwrap();
    let field = zero_field();

    let mut max_dt = adapter.initialize(&boundary, &q, &q, &field).unwrap();
    while adapter.is_coupling_ongoing() {
        clock.set_delta(clock.delta().min(max_dt)).unwrap();
        clock.increment();
        max_dt = adapter.advance(&field, &boundary, &q, clock.delta()).unwrap();
    }
    adapter.finalize().unwrap();

    assert_eq!(adapter.coupling().advance_count(), 5);
    assert_eq!(clock.step(), 5);
    assert!(clock.is_finished());
    assert_eq!(adapter.checkpoint().saves(), 0);
}

// ── Implicit coupling ────────────────────────────────────────────────

#[test]
fn rollback_restores_state_and_clock() {
    let boundary = BoxBoundary::rectangle([1, 1], [1.0, 1.0]);
    let q = FaceQuadrature::gauss(1, 1).unwrap();
    let mock = shared_mock(2).with_iterations_per_window(2);
    let mut adapter: Adapter<_> = Adapter::new(shared_config(), mock, BoxBoundary::TOP).unwrap();
    adapter.initialize(&boundary, &q, &q, &zero_field()).unwrap();

    let mut clock = Time::new(0.0, 1.0, 0.1).unwrap();
    let mut a = vec![1.0, 2.0, 3.0];
    let mut b = vec![4.0, 5.0];
    assert!(adapter
        .save_current_state_if_required(&[&a, &b], &clock)
        .unwrap());

    clock.increment();
    a.fill(9.0);
    b.fill(9.0);
    adapter.advance(&zero_field(), &boundary, &q, 0.1).unwrap();

    assert!(adapter
        .reload_old_state_if_required(&mut [&mut a, &mut b], &mut clock)
        .unwrap());
    assert_eq!(a, vec![1.0, 2.0, 3.0]);
    assert_eq!(b, vec![4.0, 5.0]);
    assert_eq!(clock.current(), 0.0);
    assert_eq!(clock.step(), 0);
}

#[test]
fn rollback_with_a_different_state_list_fails() {
    let boundary = BoxBoundary::rectangle([1, 1], [1.0, 1.0]);
    let q = FaceQuadrature::gauss(1, 1).unwrap();
    let mock = shared_mock(2).with_iterations_per_window(2);
    let mut adapter: Adapter<_> = Adapter::new(shared_config(), mock, BoxBoundary::TOP).unwrap();
    adapter.initialize(&boundary, &q, &q, &zero_field()).unwrap();

    let mut clock = Time::new(0.0, 1.0, 0.1).unwrap();
    let mut a = vec![1.0];
    let b = vec![2.0];
    adapter
        .save_current_state_if_required(&[&a, &b], &clock)
        .unwrap();
    adapter.advance(&zero_field(), &boundary, &q, 0.1).unwrap();

    assert_eq!(
        adapter.reload_old_state_if_required(&mut [&mut a], &mut clock),
        Err(AdapterError::Consistency(
            ConsistencyError::CheckpointLengthMismatch {
                stored: 2,
                supplied: 1
            }
        ))
    );
}

#[test]
fn implicit_loop_repeats_every_window() {
    let boundary = BoxBoundary::rectangle([2, 1], [1.0, 1.0]);
    let q = FaceQuadrature::gauss(2, 1).unwrap();
    let mock = shared_mock(2)
        .with_iterations_per_window(3)
        .with_max_time(0.3);
    let mut adapter: Adapter<_> = Adapter::new(shared_config(), mock, BoxBoundary::TOP).unwrap();
    let field = zero_field();
    adapter.initialize(&boundary, &q, &q, &field).unwrap();

    let mut clock = Time::new(0.0, 0.3, 0.1).unwrap();
    let mut u = vec![0.0; 4];
    while adapter.is_coupling_ongoing() {
        adapter
            .save_current_state_if_required(&[&u], &clock)
            .unwrap();
        clock.increment();
        u.iter_mut().for_each(|x| *x += 1.0);
        adapter.advance(&field, &boundary, &q, clock.delta()).unwrap();
        adapter
            .reload_old_state_if_required(&mut [&mut u], &mut clock)
            .unwrap();
    }

    assert_eq!(u, vec![3.0; 4]);
    assert_eq!(clock.step(), 3);
    assert_eq!(adapter.checkpoint().saves(), 3);
    assert_eq!(adapter.checkpoint().restores(), 6);
    assert_eq!(adapter.coupling().advance_count(), 9);

    let fulfilled = adapter.coupling().fulfilled();
    let reads = fulfilled
        .iter()
        .filter(|&&a| a == CouplingAction::ReadIterationCheckpoint)
        .count();
    assert_eq!(reads, 6);
    assert!(!adapter.coupling().is_coupling_ongoing());
}
