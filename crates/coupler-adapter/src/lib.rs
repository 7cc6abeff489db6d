//! Quadrature-point coupling adapter.
//!
//! Couples the boundary of a finite-element discretization to a
//! multi-physics coupling library by registering every boundary quadrature
//! point as a coupling-mesh vertex. The crate provides:
//!
//! - [`interface`]: enumeration of the read and write vertex sets and the
//!   face-to-vertex map.
//! - [`transfer`]: the write traversal and the buffered read path.
//! - [`checkpoint`]: state snapshots for implicit coupling.
//! - [`Adapter`]: the lifecycle tying the above to one participant.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod adapter;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod interface;
pub mod transfer;

pub use adapter::{Adapter, CouplingIds};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::{AdapterConfig, ConfigError, MeshNames, ProcessLayout, ResolvedMeshNames};
pub use error::{AdapterError, ConsistencyError};
pub use interface::{enumerate_interface, FaceIndexMap, InterfaceMesh};
pub use transfer::{write_all_quadrature_nodes, ReadBuffer};
