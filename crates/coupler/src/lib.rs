//! Couple finite-element boundary quadrature points to a multi-physics
//! coupling library.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the coupler sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use coupler::prelude::*;
//! use coupler_test_utils::{BoundaryField, BoxBoundary, MockCoupling};
//! use smallvec::smallvec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdapterConfig {
//!     mesh_names: MeshNames::shared("Solid-Mesh"),
//!     ..AdapterConfig::default()
//! };
//! // A loopback library that echoes the written traction back.
//! let library = MockCoupling::new(2)
//!     .with_mesh("Solid-Mesh")
//!     .with_data("Solid-Mesh", "received-data")
//!     .with_data("Solid-Mesh", "calculated-data")
//!     .with_echo("calculated-data", "received-data")
//!     .with_max_time(0.3);
//!
//! let mesh = BoxBoundary::rectangle([4, 2], [1.0, 1.0]);
//! let face_rule = FaceQuadrature::gauss(2, 1)?;
//! let traction = BoundaryField::analytic(|x| smallvec![0.0, -x[0]]);
//! let mut u = vec![0.0; 8];
//! let mut time = Time::new(0.0, 0.3, 0.1)?;
//!
//! let mut adapter: Adapter<_> =
//!     Adapter::connect(config, BoxBoundary::TOP, |p| Ok(library.connect(p)))?;
//! let mut max_dt = adapter.initialize(&mesh, &face_rule, &face_rule, &traction)?;
//! while adapter.is_coupling_ongoing() {
//!     adapter.save_current_state_if_required(&[&u], &time)?;
//!     time.set_delta(time.delta().min(max_dt))?;
//!     time.increment();
//!     u[0] = adapter.read_on_quadrature_point_with_id(0)?[1];
//!     max_dt = adapter.advance(&traction, &mesh, &face_rule, time.delta())?;
//!     adapter.reload_old_state_if_required(&mut [&mut u], &mut time)?;
//! }
//! adapter.finalize()?;
//! assert!(time.is_finished());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `coupler-core` | IDs, errors, coupling and discretization traits, quadrature, clock |
//! | [`adapter`] | `coupler-adapter` | Configuration, enumeration, transfer, checkpoints, `Adapter` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`coupler-core`).
///
/// Contains the [`types::CouplingInterface`] and
/// [`types::BoundaryDiscretization`] traits that connect the adapter to
/// the coupling library and the solver.
pub use coupler_core as types;

/// The adapter (`coupler-adapter`).
pub use coupler_adapter as adapter;

/// Common imports for typical coupler usage.
pub mod prelude {
    // Core types and traits
    pub use coupler_core::{
        BoundaryDiscretization, BoundaryId, CouplingAction, CouplingInterface, DataId, FaceId,
        FaceQuadrature, MeshId, Participant, Point, SimulationClock, Time, VertexHandle,
    };

    // Errors
    pub use coupler_adapter::{AdapterError, ConfigError, ConsistencyError};
    pub use coupler_core::CouplingError;

    // Adapter
    pub use coupler_adapter::{Adapter, AdapterConfig, MeshNames, ProcessLayout};
}
