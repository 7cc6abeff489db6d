//! Core types and traits for the coupler workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions the adapter is written against: typed handles,
//! the coupling-library boundary ([`CouplingInterface`]), the
//! discretization boundary ([`BoundaryDiscretization`]), the simulation
//! clock, and face quadrature rules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod quadrature;
pub mod time;
pub mod traits;

pub use error::{CouplingError, QuadratureError, TimeError};
pub use id::{BoundaryId, DataId, FaceId, MeshId, Point, VertexHandle};
pub use quadrature::FaceQuadrature;
pub use time::{SimulationClock, Time};
pub use traits::{BoundaryDiscretization, CouplingAction, CouplingInterface, Participant};
