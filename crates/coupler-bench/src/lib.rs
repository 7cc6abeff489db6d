//! Benchmark profiles for the coupler workspace.
//!
//! Provides pre-built interface setups for benchmarks:
//!
//! - [`edge_profile`]: 2D box, one coupled edge of 1000 faces, 3 Gauss points per face
//! - [`surface_profile`]: 3D box, one coupled side of 40x40 faces, 2x2 Gauss points per face
//! - [`profile_coupling`]: a loopback coupling library declaring the profile meshes

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use coupler_adapter::{AdapterConfig, MeshNames};
use coupler_core::FaceQuadrature;
use coupler_test_utils::{BoxBoundary, MockCoupling};

/// Name of the coupling mesh used by every profile.
pub const PROFILE_MESH: &str = "Solid-Mesh";

/// A boundary, its face rule, and the coupled side.
pub struct Profile {
    /// The discretized boundary.
    pub boundary: BoxBoundary,
    /// Quadrature rule on every face.
    pub quadrature: FaceQuadrature,
}

/// 2D profile: 1000×10 cells, top edge coupled, 3 points per face.
pub fn edge_profile() -> Profile {
    Profile {
        boundary: BoxBoundary::rectangle([1000, 10], [10.0, 0.1]),
        quadrature: FaceQuadrature::gauss(3, 1).expect("non-zero Gauss rule"),
    }
}

/// 3D profile: 40×40×10 cells, top side coupled, 2×2 points per face.
pub fn surface_profile() -> Profile {
    Profile {
        boundary: BoxBoundary::cuboid([40, 10, 40], [1.0, 0.25, 1.0]),
        quadrature: FaceQuadrature::gauss(2, 2).expect("non-zero Gauss rule"),
    }
}

/// Loopback coupling of dimension `dim` with both data fields on
/// [`PROFILE_MESH`] and no echo.
pub fn profile_coupling(dim: usize) -> MockCoupling {
    let config = profile_config();
    MockCoupling::new(dim)
        .with_mesh(PROFILE_MESH)
        .with_data(PROFILE_MESH, &config.read_data_name)
        .with_data(PROFILE_MESH, &config.write_data_name)
}

/// Adapter configuration matching [`profile_coupling`].
pub fn profile_config() -> AdapterConfig {
    AdapterConfig {
        mesh_names: MeshNames::shared(PROFILE_MESH),
        ..AdapterConfig::default()
    }
}
