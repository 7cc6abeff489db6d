//! The coupled-participant lifecycle.
//!
//! [`Adapter`] owns the coupling library handle and every piece of
//! bookkeeping that ties solver quadrature points to coupling vertices.
//! A run looks like:
//!
//! ```text
//! new -> initialize -> { save -> solve -> advance -> reload }* -> finalize
//! ```
//!
//! `initialize` enumerates the write set, then the read set, writes
//! initial data when the library asks for it, and performs the first bulk
//! read. `advance` writes, advances the library, and refreshes the read
//! buffer when new data arrived.
//!
//! # Correlation by position
//!
//! Vertices are matched to quadrature points only by traversal order. The
//! discretization and the quadrature rules must stay unchanged between
//! enumeration and every later call, or [`reenumerate`](Adapter::reenumerate)
//! must be called after the change.

use log::{debug, info, warn};
use smallvec::smallvec;

use coupler_core::{
    BoundaryDiscretization, BoundaryId, CouplingAction, CouplingError, CouplingInterface, DataId,
    FaceId, FaceQuadrature, MeshId, Participant, Point, SimulationClock, VertexHandle,
};

use crate::checkpoint::CheckpointStore;
use crate::config::{AdapterConfig, ConfigError, ResolvedMeshNames};
use crate::error::{AdapterError, ConsistencyError};
use crate::interface::{enumerate_interface, FaceIndexMap, InterfaceMesh};
use crate::transfer::{write_all_quadrature_nodes, ReadBuffer};

// ── CouplingIds ────────────────────────────────────────────────────

/// Library ids resolved at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CouplingIds {
    /// Mesh carrying incoming data.
    pub read_mesh: MeshId,
    /// Incoming data field.
    pub read_data: DataId,
    /// Mesh carrying outgoing data.
    pub write_mesh: MeshId,
    /// Outgoing data field.
    pub write_data: DataId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Configured,
    Initialized,
    Finalized,
}

/// Interface state that exists only between `initialize` and `finalize`.
#[derive(Debug)]
struct Session {
    ids: CouplingIds,
    dim: usize,
    write_mesh: InterfaceMesh,
    read_mesh: InterfaceMesh,
    face_map: FaceIndexMap,
    read_buffer: ReadBuffer,
}

// ── Adapter ────────────────────────────────────────────────────────

/// One coupled participant rank.
///
/// `C` is the coupling library, `V` the solver's state-vector type used
/// for iteration checkpoints.
pub struct Adapter<C, V = Vec<f64>> {
    coupling: C,
    boundary: BoundaryId,
    config: AdapterConfig,
    names: ResolvedMeshNames,
    phase: Phase,
    session: Option<Session>,
    checkpoint: CheckpointStore<V>,
}

impl<C: CouplingInterface, V> Adapter<C, V> {
    /// Validate `config` and wrap an already opened `coupling`.
    ///
    /// Faces tagged `boundary` form the coupling interface. No library
    /// call is made before [`initialize`](Self::initialize).
    pub fn new(
        config: AdapterConfig,
        coupling: C,
        boundary: BoundaryId,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let names = config.mesh_names.resolve()?;
        Ok(Self::assemble(config, names, coupling, boundary))
    }

    /// Validate `config`, then open the coupling library with its
    /// [`Participant`] identity.
    ///
    /// `open` receives the participant name, the coupling configuration
    /// file and the process layout. It is not called if the
    /// configuration is invalid.
    pub fn connect<F>(
        config: AdapterConfig,
        boundary: BoundaryId,
        open: F,
    ) -> Result<Self, AdapterError>
    where
        F: FnOnce(Participant<'_>) -> Result<C, CouplingError>,
    {
        config.validate()?;
        let names = config.mesh_names.resolve()?;
        let coupling = open(config.participant())?;
        Ok(Self::assemble(config, names, coupling, boundary))
    }

    fn assemble(
        config: AdapterConfig,
        names: ResolvedMeshNames,
        coupling: C,
        boundary: BoundaryId,
    ) -> Self {
        info!(
            "participant '{}' (rank {} of {}), coupling config {}",
            config.participant_name,
            config.process.rank,
            config.process.size,
            config.config_file.display()
        );
        Self {
            coupling,
            boundary,
            config,
            names,
            phase: Phase::Configured,
            session: None,
            checkpoint: CheckpointStore::default(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Register the interface, connect, and exchange initial data.
    ///
    /// The write set is enumerated with `write_quadrature` before the read
    /// set is enumerated with `read_quadrature`. If the library requires
    /// initial data, `field` is written and `initialize_data` is called.
    /// The read buffer is filled unconditionally afterwards.
    ///
    /// Returns the maximum length of the first time step.
    pub fn initialize<D>(
        &mut self,
        discretization: &D,
        write_quadrature: &FaceQuadrature,
        read_quadrature: &FaceQuadrature,
        field: &D::Field,
    ) -> Result<f64, AdapterError>
    where
        D: BoundaryDiscretization + ?Sized,
    {
        match self.phase {
            Phase::Configured => {}
            Phase::Initialized => return Err(ConsistencyError::AlreadyInitialized.into()),
            Phase::Finalized => return Err(ConsistencyError::Finalized.into()),
        }

        let dim = discretization.dim();
        let coupling_dim = self.coupling.dimensions();
        if dim != coupling_dim {
            return Err(ConfigError::DimensionMismatch {
                solver: dim,
                coupling: coupling_dim,
            }
            .into());
        }
        if dim < 2 {
            return Err(ConfigError::UnsupportedDimension { dim }.into());
        }
        for rule in [write_quadrature, read_quadrature] {
            if rule.face_dim() + 1 != dim {
                return Err(ConfigError::QuadratureFaceDim {
                    face_dim: rule.face_dim(),
                    dim,
                }
                .into());
            }
        }

        let read_mesh = self.coupling.mesh_id(&self.names.read)?;
        let read_data = self.coupling.data_id(&self.config.read_data_name, read_mesh)?;
        let write_mesh = self.coupling.mesh_id(&self.names.write)?;
        let write_data = self.coupling.data_id(&self.config.write_data_name, write_mesh)?;
        let ids = CouplingIds {
            read_mesh,
            read_data,
            write_mesh,
            write_data,
        };

        let session = self.enumerate(ids, discretization, write_quadrature, read_quadrature)?;
        self.session = Some(session);
        self.phase = Phase::Initialized;

        let max_dt = self.coupling.initialize()?;

        if self
            .coupling
            .is_action_required(CouplingAction::WriteInitialData)
        {
            let n = self.write_data(discretization, field, write_quadrature)?;
            self.coupling
                .mark_action_fulfilled(CouplingAction::WriteInitialData);
            debug!("initial data written on {n} vertices");
            self.coupling.initialize_data()?;
        }

        self.refresh_read_buffer()?;
        info!("coupling initialized, max dt = {max_dt}");
        Ok(max_dt)
    }

    /// Write coupling data if required, advance the library by `dt`, and
    /// refresh the read buffer if new data is available.
    ///
    /// Returns the maximum length of the next time step. Once the library
    /// reports the end of the coupled run, the call logs a warning and
    /// returns `0.0` without contacting the library.
    pub fn advance<D>(
        &mut self,
        field: &D::Field,
        discretization: &D,
        write_quadrature: &FaceQuadrature,
        dt: f64,
    ) -> Result<f64, AdapterError>
    where
        D: BoundaryDiscretization + ?Sized,
    {
        self.ensure_initialized()?;
        if !self.coupling.is_coupling_ongoing() {
            warn!("advance called after the coupled simulation has ended");
            return Ok(0.0);
        }

        if self.coupling.is_write_data_required(dt) {
            let n = self.write_data(discretization, field, write_quadrature)?;
            debug!("wrote {n} vertices before advancing by {dt}");
        }

        let max_dt = self.coupling.advance(dt)?;

        if self.coupling.is_read_data_available() {
            self.refresh_read_buffer()?;
            debug!("read buffer refreshed");
        }
        Ok(max_dt)
    }

    /// Rebuild both vertex sets, the face map and the read buffer after
    /// the solver mesh changed.
    ///
    /// The previous handles are dropped. The read buffer is refilled from
    /// the library for the new read set.
    pub fn reenumerate<D>(
        &mut self,
        discretization: &D,
        write_quadrature: &FaceQuadrature,
        read_quadrature: &FaceQuadrature,
    ) -> Result<(), AdapterError>
    where
        D: BoundaryDiscretization + ?Sized,
    {
        self.ensure_initialized()?;
        let ids = self
            .session
            .as_ref()
            .map(|s| s.ids)
            .ok_or(ConsistencyError::NotInitialized)?;
        let session = self.enumerate(ids, discretization, write_quadrature, read_quadrature)?;
        self.session = Some(session);
        self.refresh_read_buffer()
    }

    /// Tear down the connection. No coupling call is valid afterwards.
    pub fn finalize(&mut self) -> Result<(), AdapterError> {
        self.ensure_initialized()?;
        self.coupling.finalize()?;
        self.phase = Phase::Finalized;
        info!(
            "coupling finalized after {} checkpoint saves and {} restores",
            self.checkpoint.saves(),
            self.checkpoint.restores()
        );
        Ok(())
    }

    /// `true` while the adapter is initialized and the library has not
    /// reached the end of the coupled run.
    pub fn is_coupling_ongoing(&self) -> bool {
        self.phase == Phase::Initialized && self.coupling.is_coupling_ongoing()
    }

    // ── Read access ────────────────────────────────────────────────

    /// Data of read vertex `index`, queried from the library directly.
    ///
    /// `index` is the vertex's position in the read traversal; it is
    /// mapped through the stored read handles before the query.
    pub fn read_on_quadrature_point(&self, index: usize) -> Result<Point, AdapterError> {
        let session = self.session()?;
        let handles = session.read_mesh.handles();
        let &handle = handles
            .get(index)
            .ok_or(ConsistencyError::ReadIndexOutOfRange {
                index,
                len: handles.len(),
            })?;
        let mut value: Point = smallvec![0.0; session.dim];
        self.coupling
            .read_vector_data(session.ids.read_data, handle, &mut value)?;
        Ok(value)
    }

    /// Data of read vertex `index` from the read buffer.
    ///
    /// Reflects the library state as of the last refresh (initialization
    /// or an `advance` that reported new data).
    pub fn read_on_quadrature_point_with_id(&self, index: usize) -> Result<&[f64], AdapterError> {
        Ok(self.session()?.read_buffer.vertex(index)?)
    }

    /// Offset of `face`'s first vertex in the read set.
    ///
    /// Quadrature point `q` of that face is read vertex
    /// `node_id(face)? + q`.
    pub fn node_id(&self, face: FaceId) -> Result<usize, AdapterError> {
        let session = self.session()?;
        Ok(session
            .face_map
            .offset(face)
            .ok_or(ConsistencyError::UnknownFace { face })?)
    }

    /// Read vertex handles in traversal order. Empty before
    /// initialization.
    pub fn interface_ids(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.session
            .iter()
            .flat_map(|s| s.read_mesh.handles().iter().copied())
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The wrapped coupling library.
    pub fn coupling(&self) -> &C {
        &self.coupling
    }

    /// Mutable access to the wrapped coupling library.
    pub fn coupling_mut(&mut self) -> &mut C {
        &mut self.coupling
    }

    /// The validated configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Resolved mesh names.
    pub fn mesh_names(&self) -> &ResolvedMeshNames {
        &self.names
    }

    /// Boundary marker of the coupling interface.
    pub fn boundary(&self) -> BoundaryId {
        self.boundary
    }

    /// Library ids, once initialized.
    pub fn ids(&self) -> Option<CouplingIds> {
        self.session.as_ref().map(|s| s.ids)
    }

    /// Spatial dimension, once initialized.
    pub fn dim(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.dim)
    }

    /// The write vertex set, once initialized.
    pub fn write_mesh(&self) -> Option<&InterfaceMesh> {
        self.session.as_ref().map(|s| &s.write_mesh)
    }

    /// The read vertex set, once initialized.
    pub fn read_mesh(&self) -> Option<&InterfaceMesh> {
        self.session.as_ref().map(|s| &s.read_mesh)
    }

    /// The face-to-vertex map of the read set, once initialized.
    pub fn face_map(&self) -> Option<&FaceIndexMap> {
        self.session.as_ref().map(|s| &s.face_map)
    }

    /// The read buffer, once initialized.
    pub fn read_data(&self) -> Option<&ReadBuffer> {
        self.session.as_ref().map(|s| &s.read_buffer)
    }

    /// The checkpoint store.
    pub fn checkpoint(&self) -> &CheckpointStore<V> {
        &self.checkpoint
    }

    /// The write quadrature implied by the configured sampling, given the
    /// solver's own rule.
    pub fn write_quadrature(
        &self,
        solver_rule: &FaceQuadrature,
    ) -> Result<FaceQuadrature, ConfigError> {
        self.config.write_quadrature(solver_rule)
    }

    // ── Internals ──────────────────────────────────────────────────

    fn ensure_initialized(&self) -> Result<(), ConsistencyError> {
        match self.phase {
            Phase::Configured => Err(ConsistencyError::NotInitialized),
            Phase::Initialized => Ok(()),
            Phase::Finalized => Err(ConsistencyError::Finalized),
        }
    }

    fn session(&self) -> Result<&Session, ConsistencyError> {
        self.ensure_initialized()?;
        self.session.as_ref().ok_or(ConsistencyError::NotInitialized)
    }

    fn enumerate<D>(
        &mut self,
        ids: CouplingIds,
        discretization: &D,
        write_quadrature: &FaceQuadrature,
        read_quadrature: &FaceQuadrature,
    ) -> Result<Session, AdapterError>
    where
        D: BoundaryDiscretization + ?Sized,
    {
        let dim = discretization.dim();
        let write_mesh = enumerate_interface(
            &mut self.coupling,
            ids.write_mesh,
            discretization,
            self.boundary,
            write_quadrature,
            None,
        )?;
        let mut face_map = FaceIndexMap::new();
        let read_mesh = enumerate_interface(
            &mut self.coupling,
            ids.read_mesh,
            discretization,
            self.boundary,
            read_quadrature,
            Some(&mut face_map),
        )?;
        let mut read_buffer = ReadBuffer::new();
        read_buffer.resize(read_mesh.len(), dim);

        info!(
            "interface on boundary {}: {} write vertices on '{}', {} read vertices on '{}' over {} faces",
            self.boundary,
            write_mesh.len(),
            self.names.write,
            read_mesh.len(),
            self.names.read,
            face_map.len()
        );

        Ok(Session {
            ids,
            dim,
            write_mesh,
            read_mesh,
            face_map,
            read_buffer,
        })
    }

    fn write_data<D>(
        &mut self,
        discretization: &D,
        field: &D::Field,
        quadrature: &FaceQuadrature,
    ) -> Result<usize, AdapterError>
    where
        D: BoundaryDiscretization + ?Sized,
    {
        let session = self.session.as_ref().ok_or(ConsistencyError::NotInitialized)?;
        write_all_quadrature_nodes(
            &mut self.coupling,
            session.ids.write_data,
            &session.write_mesh,
            discretization,
            field,
            self.boundary,
            quadrature,
        )
    }

    fn refresh_read_buffer(&mut self) -> Result<(), AdapterError> {
        let session = self.session.as_mut().ok_or(ConsistencyError::NotInitialized)?;
        session.read_buffer.refresh(
            &self.coupling,
            session.ids.read_data,
            session.read_mesh.handles(),
        )
    }
}

// ── Checkpointing ──────────────────────────────────────────────────

impl<C: CouplingInterface, V: Clone> Adapter<C, V> {
    /// Store `states`, the current time and the step counter if the
    /// library requires a write-iteration checkpoint.
    ///
    /// Returns `true` if a checkpoint was taken.
    pub fn save_current_state_if_required<K>(
        &mut self,
        states: &[&V],
        clock: &K,
    ) -> Result<bool, AdapterError>
    where
        K: SimulationClock + ?Sized,
    {
        self.ensure_initialized()?;
        if !self
            .coupling
            .is_action_required(CouplingAction::WriteIterationCheckpoint)
        {
            return Ok(false);
        }
        self.checkpoint.save(states, clock.current(), clock.step());
        self.coupling
            .mark_action_fulfilled(CouplingAction::WriteIterationCheckpoint);
        Ok(true)
    }

    /// Restore `states` and the clock from the last checkpoint if the
    /// library requires a read-iteration checkpoint.
    ///
    /// `states` must list the same vectors, in the same order, as the
    /// save. Returns `true` if a rollback happened.
    pub fn reload_old_state_if_required<K>(
        &mut self,
        states: &mut [&mut V],
        clock: &mut K,
    ) -> Result<bool, AdapterError>
    where
        K: SimulationClock + ?Sized,
    {
        self.ensure_initialized()?;
        if !self
            .coupling
            .is_action_required(CouplingAction::ReadIterationCheckpoint)
        {
            return Ok(false);
        }
        let (time, step) = self.checkpoint.restore(states)?;
        clock.set_absolute_time(time);
        clock.set_step(step);
        self.coupling
            .mark_action_fulfilled(CouplingAction::ReadIterationCheckpoint);
        Ok(true)
    }
}
