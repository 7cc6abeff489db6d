//! Coupled run against the loopback mock.
//!
//! Demonstrates: configure → initialize → { checkpoint → solve → advance →
//! rollback }* → finalize, with an implicit scheme that repeats every time
//! window twice. Run with `RUST_LOG=debug` to see the adapter's log.

use std::error::Error;

use coupler_adapter::{Adapter, AdapterConfig, MeshNames};
use coupler_core::{FaceQuadrature, SimulationClock, Time};
use coupler_test_utils::{BoundaryField, BoxBoundary, MockCoupling};
use smallvec::smallvec;

const MESH: &str = "Solid-Mesh";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AdapterConfig {
        mesh_names: MeshNames::shared(MESH),
        ..AdapterConfig::default()
    };
    let coupling = MockCoupling::new(2)
        .with_mesh(MESH)
        .with_data(MESH, &config.read_data_name)
        .with_data(MESH, &config.write_data_name)
        .with_echo(&config.write_data_name, &config.read_data_name)
        .with_initial_data()
        .with_iterations_per_window(2)
        .with_max_time(0.5);

    let boundary = BoxBoundary::rectangle([8, 4], [2.0, 1.0]);
    let quadrature = FaceQuadrature::gauss(2, 1)?;
    let mut adapter: Adapter<_> = Adapter::new(config, coupling, BoxBoundary::TOP)?;
    let mut time = Time::new(0.0, 0.5, 0.1)?;

    // Solver state: one amplitude scaling a fixed traction profile.
    let mut amplitude = vec![1.0];
    let traction = |a: f64| BoundaryField::analytic(move |x| smallvec![0.0, -a * x[0]]);

    let mut max_dt = adapter.initialize(
        &boundary,
        &quadrature,
        &quadrature,
        &traction(amplitude[0]),
    )?;
    println!(
        "interface: {} write / {} read vertices",
        adapter.write_mesh().map_or(0, |m| m.len()),
        adapter.read_mesh().map_or(0, |m| m.len())
    );

    while adapter.is_coupling_ongoing() {
        adapter.save_current_state_if_required(&[&amplitude], &time)?;

        time.set_delta(time.delta().min(max_dt))?;
        time.increment();
        let received = adapter.read_on_quadrature_point_with_id(0)?[1];
        amplitude[0] = 0.5 * (amplitude[0] - received);

        let field = traction(amplitude[0]);
        max_dt = adapter.advance(&field, &boundary, &quadrature, time.delta())?;

        if adapter.reload_old_state_if_required(&mut [&mut amplitude], &mut time)? {
            println!("  t = {:.2}: window repeated", time.current());
        } else {
            println!("  t = {:.2}: amplitude {:.4}", time.current(), amplitude[0]);
        }
    }

    adapter.finalize()?;
    println!(
        "done after {} steps, {} checkpoint restores",
        time.step(),
        adapter.checkpoint().restores()
    );
    Ok(())
}
