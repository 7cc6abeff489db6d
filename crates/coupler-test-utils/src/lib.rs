//! Test utilities and mock types for coupler development.
//!
//! Provides [`MockCoupling`], an in-process stand-in for the coupling
//! library, and [`BoxBoundary`], a structured axis-aligned mesh boundary
//! implementing [`BoundaryDiscretization`](coupler_core::BoundaryDiscretization).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod boundary;

pub use boundary::{BoundaryField, BoxBoundary};

use std::path::PathBuf;

use indexmap::IndexMap;

use coupler_core::{
    CouplingAction, CouplingError, CouplingInterface, DataId, MeshId, Participant, Point,
    VertexHandle,
};

const TIME_EPSILON: f64 = 1e-9;

struct MockMesh {
    vertices: Vec<Point>,
}

struct MockData {
    name: String,
    mesh: MeshId,
    values: IndexMap<VertexHandle, Point>,
}

/// Owned copy of the [`Participant`] a [`MockCoupling`] was opened with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub participant: String,
    pub config_file: PathBuf,
    pub rank: u32,
    pub size: u32,
}

/// Loopback coupling library.
///
/// Meshes and data fields are declared with the builder methods; vertex
/// handles are handed out sequentially per mesh starting at 0. Data
/// written to a field is stored per handle.
///
/// With [`with_echo`](Self::with_echo), every exchange (`initialize_data`
/// and `advance`) copies the values of one field onto another: each vertex
/// of the target field's mesh receives the value of the nearest written
/// vertex of the source field. Vertices without data read as zero.
///
/// By default the mock behaves like an explicit scheme: no actions are
/// required and time advances with every `advance`.
/// [`with_iterations_per_window`](Self::with_iterations_per_window)
/// emulates an implicit scheme instead.
pub struct MockCoupling {
    dim: usize,
    meshes: IndexMap<String, MockMesh>,
    data: Vec<MockData>,
    echo: Vec<(String, String)>,
    required: Vec<CouplingAction>,
    fulfilled: Vec<CouplingAction>,
    initial_data: bool,
    iterations_per_window: Option<u32>,
    iteration: u32,
    max_dt: f64,
    max_time: f64,
    time: f64,
    read_data_available: bool,
    initialized: bool,
    finalized: bool,
    advances: u64,
    connection: Option<Connection>,
}

impl MockCoupling {
    /// A mock for a `dim`-dimensional coupling configuration without any
    /// meshes. Runs until `t = 1.0` with a maximum step of `0.1`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            meshes: IndexMap::new(),
            data: Vec::new(),
            echo: Vec::new(),
            required: Vec::new(),
            fulfilled: Vec::new(),
            initial_data: false,
            iterations_per_window: None,
            iteration: 0,
            max_dt: 0.1,
            max_time: 1.0,
            time: 0.0,
            read_data_available: false,
            initialized: false,
            finalized: false,
            advances: 0,
            connection: None,
        }
    }

    // ── Builder ──────────────────────────────────────────────────

    pub fn with_mesh(mut self, name: &str) -> Self {
        self.meshes
            .entry(name.to_string())
            .or_insert_with(|| MockMesh {
                vertices: Vec::new(),
            });
        self
    }

    /// Declare data field `data` on mesh `mesh`.
    ///
    /// # Panics
    ///
    /// Panics if `mesh` was not declared.
    pub fn with_data(mut self, mesh: &str, data: &str) -> Self {
        let index = self
            .meshes
            .get_index_of(mesh)
            .unwrap_or_else(|| panic!("mesh '{mesh}' must be declared before its data"));
        self.data.push(MockData {
            name: data.to_string(),
            mesh: MeshId(index as i32),
            values: IndexMap::new(),
        });
        self
    }

    /// Copy field `from` onto field `to` on every exchange.
    pub fn with_echo(mut self, from: &str, to: &str) -> Self {
        self.echo.push((from.to_string(), to.to_string()));
        self
    }

    /// Require `WriteInitialData` at `initialize`.
    pub fn with_initial_data(mut self) -> Self {
        self.initial_data = true;
        self
    }

    /// Emulate an implicit scheme converging after `k` iterations per
    /// time window.
    ///
    /// A write checkpoint is required at `initialize` and after every
    /// completed window. The first `k - 1` advances of a window require a
    /// read checkpoint and leave the time unchanged.
    pub fn with_iterations_per_window(mut self, k: u32) -> Self {
        self.iterations_per_window = Some(k.max(1));
        self
    }

    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = max_dt;
        self
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = max_time;
        self
    }

    /// Record the identity the library was opened with, as a real
    /// library constructor would receive it.
    pub fn connect(mut self, participant: Participant<'_>) -> Self {
        self.connection = Some(Connection {
            participant: participant.name.to_string(),
            config_file: participant.config_file.to_path_buf(),
            rank: participant.rank,
            size: participant.size,
        });
        self
    }

    // ── Scripting ────────────────────────────────────────────────

    /// Arm `action` as required.
    pub fn require_action(&mut self, action: CouplingAction) {
        if !self.required.contains(&action) {
            self.required.push(action);
        }
    }

    pub fn set_read_data_available(&mut self, available: bool) {
        self.read_data_available = available;
    }

    /// Store `value` for `vertex` under `data`, as if a peer had sent it.
    ///
    /// # Panics
    ///
    /// Panics if `data` was never handed out.
    pub fn inject(&mut self, data: DataId, vertex: VertexHandle, value: &[f64]) {
        let field = self
            .data
            .get_mut(data.0 as usize)
            .unwrap_or_else(|| panic!("data {data} was never declared"));
        field.values.insert(vertex, Point::from_slice(value));
    }

    // ── Inspection ───────────────────────────────────────────────

    /// The value currently stored for `vertex` under `data`.
    pub fn written(&self, data: DataId, vertex: VertexHandle) -> Option<&Point> {
        self.field(data).ok()?.values.get(&vertex)
    }

    pub fn vertex_position(&self, mesh: MeshId, vertex: VertexHandle) -> Option<&Point> {
        let index = usize::try_from(vertex.0).ok()?;
        self.mesh(mesh).ok()?.vertices.get(index)
    }

    /// All registered vertex positions of `mesh`, in handle order.
    pub fn vertex_positions(&self, mesh: MeshId) -> &[Point] {
        self.mesh(mesh).map(|m| m.vertices.as_slice()).unwrap_or(&[])
    }

    /// Actions acknowledged so far, in order.
    pub fn fulfilled(&self) -> &[CouplingAction] {
        &self.fulfilled
    }

    pub fn advance_count(&self) -> u64 {
        self.advances
    }

    /// Start of the current time window.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Iteration within the current window (implicit emulation).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The identity passed to [`connect`](Self::connect), if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    // ── Internals ────────────────────────────────────────────────

    fn mesh(&self, mesh: MeshId) -> Result<&MockMesh, CouplingError> {
        usize::try_from(mesh.0)
            .ok()
            .and_then(|i| self.meshes.get_index(i))
            .map(|(_, m)| m)
            .ok_or_else(|| CouplingError::UnknownMesh {
                name: format!("#{mesh}"),
            })
    }

    fn field(&self, data: DataId) -> Result<&MockData, CouplingError> {
        usize::try_from(data.0)
            .ok()
            .and_then(|i| self.data.get(i))
            .ok_or(CouplingError::InvalidData { data })
    }

    fn check_vertex(
        &self,
        data: DataId,
        vertex: VertexHandle,
    ) -> Result<&MockData, CouplingError> {
        let field = self.field(data)?;
        let registered = self.mesh(field.mesh)?.vertices.len();
        match usize::try_from(vertex.0) {
            Ok(i) if i < registered => Ok(field),
            _ => Err(CouplingError::UnknownVertex {
                vertex,
                mesh: field.mesh,
            }),
        }
    }

    fn check_components(&self, got: usize) -> Result<(), CouplingError> {
        if got != self.dim {
            return Err(CouplingError::ComponentCount {
                expected: self.dim,
                got,
            });
        }
        Ok(())
    }

    fn check_running(&self, call: &str) -> Result<(), CouplingError> {
        if !self.initialized {
            return Err(CouplingError::InvalidState {
                reason: format!("{call} before initialize"),
            });
        }
        if self.finalized {
            return Err(CouplingError::InvalidState {
                reason: format!("{call} after finalize"),
            });
        }
        Ok(())
    }

    fn exchange(&mut self) {
        for (from, to) in &self.echo {
            let Some(src) = self.data.iter().position(|d| &d.name == from) else {
                continue;
            };
            let Some(dst) = self.data.iter().position(|d| &d.name == to) else {
                continue;
            };
            let source = &self.data[src];
            if source.values.is_empty() {
                continue;
            }
            let Some((_, src_mesh)) = self.meshes.get_index(source.mesh.0 as usize) else {
                continue;
            };
            let Some((_, dst_mesh)) = self.meshes.get_index(self.data[dst].mesh.0 as usize) else {
                continue;
            };

            let mut received = Vec::with_capacity(dst_mesh.vertices.len());
            for (i, target) in dst_mesh.vertices.iter().enumerate() {
                let nearest = source
                    .values
                    .iter()
                    .filter_map(|(h, v)| {
                        let p = src_mesh.vertices.get(h.0 as usize)?;
                        Some((distance_squared(p, target), v))
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0));
                if let Some((_, value)) = nearest {
                    received.push((VertexHandle(i as i32), value.clone()));
                }
            }
            self.data[dst].values.extend(received);
        }
    }

    fn arm_if_ongoing(&mut self, action: CouplingAction) {
        if self.is_coupling_ongoing() {
            self.require_action(action);
        }
    }
}

fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl CouplingInterface for MockCoupling {
    fn dimensions(&self) -> usize {
        self.dim
    }

    fn mesh_id(&self, name: &str) -> Result<MeshId, CouplingError> {
        self.meshes
            .get_index_of(name)
            .map(|i| MeshId(i as i32))
            .ok_or_else(|| CouplingError::UnknownMesh {
                name: name.to_string(),
            })
    }

    fn data_id(&self, name: &str, mesh: MeshId) -> Result<DataId, CouplingError> {
        self.data
            .iter()
            .position(|d| d.name == name && d.mesh == mesh)
            .map(|i| DataId(i as i32))
            .ok_or_else(|| CouplingError::UnknownData {
                name: name.to_string(),
                mesh,
            })
    }

    fn set_mesh_vertex(
        &mut self,
        mesh: MeshId,
        position: &[f64],
    ) -> Result<VertexHandle, CouplingError> {
        if self.finalized {
            return Err(CouplingError::InvalidState {
                reason: "set_mesh_vertex after finalize".to_string(),
            });
        }
        self.check_components(position.len())?;
        let (_, m) = self
            .meshes
            .get_index_mut(mesh.0 as usize)
            .ok_or_else(|| CouplingError::UnknownMesh {
                name: format!("#{mesh}"),
            })?;
        m.vertices.push(Point::from_slice(position));
        Ok(VertexHandle(m.vertices.len() as i32 - 1))
    }

    fn initialize(&mut self) -> Result<f64, CouplingError> {
        if self.initialized {
            return Err(CouplingError::InvalidState {
                reason: "initialize called twice".to_string(),
            });
        }
        self.initialized = true;
        if self.initial_data {
            self.require_action(CouplingAction::WriteInitialData);
        }
        if self.iterations_per_window.is_some() {
            self.arm_if_ongoing(CouplingAction::WriteIterationCheckpoint);
        }
        Ok(self.max_dt)
    }

    fn initialize_data(&mut self) -> Result<(), CouplingError> {
        self.check_running("initialize_data")?;
        self.exchange();
        self.read_data_available = true;
        Ok(())
    }

    fn advance(&mut self, dt: f64) -> Result<f64, CouplingError> {
        self.check_running("advance")?;
        if !self.is_coupling_ongoing() {
            return Err(CouplingError::InvalidState {
                reason: "advance after the end of the coupled run".to_string(),
            });
        }
        self.advances += 1;
        self.exchange();
        self.read_data_available = true;

        match self.iterations_per_window {
            Some(k) if self.iteration + 1 < k => {
                self.iteration += 1;
                self.require_action(CouplingAction::ReadIterationCheckpoint);
            }
            Some(_) => {
                self.iteration = 0;
                self.time += dt;
                self.arm_if_ongoing(CouplingAction::WriteIterationCheckpoint);
            }
            None => self.time += dt,
        }
        Ok(self.max_dt)
    }

    fn is_coupling_ongoing(&self) -> bool {
        !self.finalized && self.time + TIME_EPSILON < self.max_time
    }

    fn is_action_required(&self, action: CouplingAction) -> bool {
        self.required.contains(&action)
    }

    fn mark_action_fulfilled(&mut self, action: CouplingAction) {
        self.required.retain(|&a| a != action);
        self.fulfilled.push(action);
    }

    fn is_write_data_required(&self, _dt: f64) -> bool {
        true
    }

    fn is_read_data_available(&self) -> bool {
        self.read_data_available
    }

    fn write_vector_data(
        &mut self,
        data: DataId,
        vertex: VertexHandle,
        value: &[f64],
    ) -> Result<(), CouplingError> {
        self.check_components(value.len())?;
        self.check_vertex(data, vertex)?;
        let field = &mut self.data[data.0 as usize];
        field.values.insert(vertex, Point::from_slice(value));
        Ok(())
    }

    fn read_vector_data(
        &self,
        data: DataId,
        vertex: VertexHandle,
        out: &mut [f64],
    ) -> Result<(), CouplingError> {
        self.check_components(out.len())?;
        let field = self.check_vertex(data, vertex)?;
        match field.values.get(&vertex) {
            Some(value) => out.copy_from_slice(value),
            None => out.fill(0.0),
        }
        Ok(())
    }

    fn read_block_vector_data(
        &self,
        data: DataId,
        vertices: &[VertexHandle],
        out: &mut [f64],
    ) -> Result<(), CouplingError> {
        if out.len() != vertices.len() * self.dim {
            return Err(CouplingError::ComponentCount {
                expected: vertices.len() * self.dim,
                got: out.len(),
            });
        }
        for (&vertex, chunk) in vertices.iter().zip(out.chunks_exact_mut(self.dim)) {
            self.read_vector_data(data, vertex, chunk)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), CouplingError> {
        if self.finalized {
            return Err(CouplingError::InvalidState {
                reason: "finalize called twice".to_string(),
            });
        }
        self.finalized = true;
        Ok(())
    }
}
