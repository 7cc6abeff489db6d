//! Adapter configuration, validation, and configuration errors.
//!
//! [`AdapterConfig`] carries everything the adapter needs to know about
//! the coupling setup: participant, mesh and data names as they appear in
//! the coupling library's configuration file, the write sampling density,
//! and the process layout. [`validate()`](AdapterConfig::validate) checks
//! it before an [`Adapter`](crate::Adapter) is built.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use coupler_core::{FaceQuadrature, Participant, QuadratureError};

// ── ProcessLayout ──────────────────────────────────────────────────

/// Rank of this participant process and the total process count.
///
/// Handed to the coupling library when the connection is opened. A
/// serial solver uses the default `{ rank: 0, size: 1 }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessLayout {
    /// Zero-based rank of this process.
    pub rank: u32,
    /// Number of solver processes taking part as this participant.
    pub size: u32,
}

impl Default for ProcessLayout {
    fn default() -> Self {
        Self { rank: 0, size: 1 }
    }
}

// ── MeshNames ──────────────────────────────────────────────────────

/// Coupling mesh names as given by the user.
///
/// Either a single `shared` name is used for both directions, or distinct
/// `read` and `write` names place incoming and outgoing data on separate
/// meshes. Setting both forms, or neither, is invalid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshNames {
    /// Mesh used for read and write data alike.
    pub shared: Option<String>,
    /// Mesh carrying incoming data.
    pub read: Option<String>,
    /// Mesh carrying outgoing data.
    pub write: Option<String>,
}

impl MeshNames {
    /// One mesh for both directions.
    pub fn shared(name: impl Into<String>) -> Self {
        Self {
            shared: Some(name.into()),
            read: None,
            write: None,
        }
    }

    /// Separate read and write meshes.
    pub fn split(read: impl Into<String>, write: impl Into<String>) -> Self {
        Self {
            shared: None,
            read: Some(read.into()),
            write: Some(write.into()),
        }
    }

    /// Resolve to one name per direction.
    pub fn resolve(&self) -> Result<ResolvedMeshNames, ConfigError> {
        match (&self.shared, &self.read, &self.write) {
            (Some(shared), None, None) => Ok(ResolvedMeshNames {
                read: shared.clone(),
                write: shared.clone(),
            }),
            (Some(_), _, _) => Err(ConfigError::AmbiguousMeshNames),
            (None, Some(read), Some(write)) => Ok(ResolvedMeshNames {
                read: read.clone(),
                write: write.clone(),
            }),
            (None, _, _) => Err(ConfigError::MissingMeshNames),
        }
    }
}

/// Mesh names after resolving the shared/split choice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMeshNames {
    /// Mesh carrying incoming data.
    pub read: String,
    /// Mesh carrying outgoing data.
    pub write: String,
}

impl ResolvedMeshNames {
    /// `true` if both directions use the same mesh.
    pub fn is_shared(&self) -> bool {
        self.read == self.write
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating the configuration or while checking
/// it against the solver and coupling library at initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A shared mesh name was combined with per-direction names.
    AmbiguousMeshNames,
    /// Neither a shared name nor both per-direction names were given.
    MissingMeshNames,
    /// A required name is empty.
    EmptyName {
        /// Which option was empty.
        option: &'static str,
    },
    /// `rank` is not below `size`, or `size` is zero.
    InvalidProcessLayout {
        /// The configured rank.
        rank: u32,
        /// The configured size.
        size: u32,
    },
    /// `write_sampling` is `Some(0)`.
    ZeroWriteSampling,
    /// Solver and coupling configuration disagree on the dimension.
    DimensionMismatch {
        /// Dimension of the solver mesh.
        solver: usize,
        /// Dimension of the coupling configuration.
        coupling: usize,
    },
    /// Coupling is only supported in two and three dimensions.
    UnsupportedDimension {
        /// The rejected dimension.
        dim: usize,
    },
    /// A quadrature rule does not live on the faces of the solver mesh.
    QuadratureFaceDim {
        /// Face dimension of the supplied rule.
        face_dim: usize,
        /// Dimension of the solver mesh.
        dim: usize,
    },
    /// Building a quadrature rule failed.
    Quadrature(QuadratureError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousMeshNames => write!(
                f,
                "either specify a shared mesh name or separate read and write mesh names, not both"
            ),
            Self::MissingMeshNames => write!(
                f,
                "either a shared mesh name or both a read and a write mesh name are required"
            ),
            Self::EmptyName { option } => write!(f, "{option} must not be empty"),
            Self::InvalidProcessLayout { rank, size } => {
                write!(f, "process rank {rank} is invalid for {size} processes")
            }
            Self::ZeroWriteSampling => write!(f, "write sampling must be at least 1"),
            Self::DimensionMismatch { solver, coupling } => write!(
                f,
                "solver dimension {solver} does not match coupling configuration dimension {coupling}"
            ),
            Self::UnsupportedDimension { dim } => {
                write!(f, "coupling in {dim} dimensions is not supported")
            }
            Self::QuadratureFaceDim { face_dim, dim } => write!(
                f,
                "quadrature of face dimension {face_dim} does not fit a {dim}-dimensional mesh"
            ),
            Self::Quadrature(e) => write!(f, "quadrature: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Quadrature(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QuadratureError> for ConfigError {
    fn from(e: QuadratureError) -> Self {
        Self::Quadrature(e)
    }
}

// ── AdapterConfig ──────────────────────────────────────────────────

/// Complete configuration of one coupling participant.
#[derive(Clone, Debug, PartialEq)]
pub struct AdapterConfig {
    /// Participant name in the coupling configuration file.
    pub participant_name: String,
    /// Path of the coupling configuration file.
    pub config_file: PathBuf,
    /// Coupling mesh names.
    pub mesh_names: MeshNames,
    /// Name of the incoming data field.
    pub read_data_name: String,
    /// Name of the outgoing data field.
    pub write_data_name: String,
    /// Points per face direction on the write mesh. `None` uses the
    /// solver's own quadrature rule.
    pub write_sampling: Option<u32>,
    /// This process's place among the participant's processes.
    pub process: ProcessLayout,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            participant_name: "dealiisolver".to_string(),
            config_file: PathBuf::from("precice-config.xml"),
            mesh_names: MeshNames::default(),
            read_data_name: "received-data".to_string(),
            write_data_name: "calculated-data".to_string(),
            write_sampling: None,
            process: ProcessLayout::default(),
        }
    }
}

impl AdapterConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Exactly one mesh-name form.
        let names = self.mesh_names.resolve()?;
        // 2. No empty names.
        let required = [
            ("participant name", self.participant_name.as_str()),
            ("read mesh name", names.read.as_str()),
            ("write mesh name", names.write.as_str()),
            ("read data name", self.read_data_name.as_str()),
            ("write data name", self.write_data_name.as_str()),
        ];
        for (option, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyName { option });
            }
        }
        // 3. Sampling density, if given, is positive.
        if self.write_sampling == Some(0) {
            return Err(ConfigError::ZeroWriteSampling);
        }
        // 4. rank < size.
        let ProcessLayout { rank, size } = self.process;
        if size == 0 || rank >= size {
            return Err(ConfigError::InvalidProcessLayout { rank, size });
        }
        Ok(())
    }

    /// The identity the coupling library is opened with.
    pub fn participant(&self) -> Participant<'_> {
        Participant {
            name: &self.participant_name,
            config_file: &self.config_file,
            rank: self.process.rank,
            size: self.process.size,
        }
    }

    /// The quadrature rule for the write mesh.
    ///
    /// With `write_sampling = Some(n)` this is an equidistant rule with
    /// `n` points per face direction; otherwise `solver_rule` itself.
    pub fn write_quadrature(
        &self,
        solver_rule: &FaceQuadrature,
    ) -> Result<FaceQuadrature, ConfigError> {
        match self.write_sampling {
            Some(0) => Err(ConfigError::ZeroWriteSampling),
            Some(n) => Ok(FaceQuadrature::equidistant(
                n as usize,
                solver_rule.face_dim(),
            )?),
            None => Ok(solver_rule.clone()),
        }
    }
}
