//! Backend that records frames instead of drawing them
//!
//! Used for tests, tooling and runs without a display. It enforces the same
//! call order a device backend needs, so misuse shows up as errors here too.

use std::any::Any;
use std::collections::{HashMap, VecDeque};

use crate::render::backend::{BackendResult, FrameStats, FrameUniforms, RenderBackend};
use crate::render::mesh::{Mesh, MeshHandle};
use crate::render::render_queue::DrawBatch;
use crate::render::shader::{CompiledProgram, ShaderId};
use crate::render::RenderError;

/// Frames kept for inspection
const FRAME_HISTORY: usize = 8;

/// One recorded frame
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    /// Uniforms passed to `begin_frame`
    pub uniforms: FrameUniforms,
    /// Batches in submission order
    pub batches: Vec<DrawBatch>,
    /// Counters returned by `end_frame`
    pub stats: FrameStats,
}

#[derive(Debug, Clone, Copy)]
struct UploadedMesh {
    triangles: usize,
}

/// Recording backend
#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    programs: HashMap<ShaderId, CompiledProgram>,
    meshes: HashMap<MeshHandle, UploadedMesh>,
    current: Option<RecordedFrame>,
    frames: VecDeque<RecordedFrame>,
    frame_counter: u64,
    mesh_uploads: usize,
}

impl HeadlessBackend {
    /// Create a backend with the given surface size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            current: None,
            frames: VecDeque::with_capacity(FRAME_HISTORY),
            frame_counter: 0,
            mesh_uploads: 0,
        }
    }

    /// Most recent submitted frame
    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.back()
    }

    /// Recent frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &RecordedFrame> {
        self.frames.iter()
    }

    /// Frames submitted since creation
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Total `upload_mesh` calls
    pub fn mesh_uploads(&self) -> usize {
        self.mesh_uploads
    }

    /// Meshes currently resident
    pub fn resident_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Programs created
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_program(&mut self, program: &CompiledProgram) -> BackendResult<()> {
        log::debug!("Headless backend: program '{}' ({:?})", program.name, program.id);
        self.programs.insert(program.id, program.clone());
        Ok(())
    }

    fn upload_mesh(&mut self, handle: MeshHandle, mesh: &Mesh) -> BackendResult<()> {
        mesh.validate()?;
        self.meshes.insert(
            handle,
            UploadedMesh {
                triangles: mesh.triangle_count(),
            },
        );
        self.mesh_uploads += 1;
        log::trace!("Headless backend: uploaded {handle:?} ({} vertices)", mesh.vertices.len());
        Ok(())
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        self.meshes.remove(&handle);
    }

    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> BackendResult<()> {
        if self.current.is_some() {
            return Err(RenderError::RenderingFailed("begin_frame called twice".to_string()));
        }
        self.current = Some(RecordedFrame {
            uniforms: *uniforms,
            batches: Vec::new(),
            stats: FrameStats::default(),
        });
        Ok(())
    }

    fn draw(&mut self, batch: &DrawBatch) -> BackendResult<()> {
        let mesh = *self
            .meshes
            .get(&batch.mesh)
            .ok_or_else(|| RenderError::ResourceNotFound(format!("mesh {:?} was never uploaded", batch.mesh)))?;
        if !self.programs.contains_key(&batch.shader) {
            return Err(RenderError::ResourceNotFound(format!("program {:?}", batch.shader)));
        }
        let frame = self
            .current
            .as_mut()
            .ok_or_else(|| RenderError::RenderingFailed("draw outside begin_frame/end_frame".to_string()))?;

        frame.stats.draw_calls += 1;
        frame.stats.instances += batch.instance_count();
        frame.stats.triangles += mesh.triangles * batch.instance_count();
        frame.batches.push(batch.clone());
        Ok(())
    }

    fn end_frame(&mut self) -> BackendResult<FrameStats> {
        let mut frame = self
            .current
            .take()
            .ok_or_else(|| RenderError::RenderingFailed("end_frame without begin_frame".to_string()))?;
        self.frame_counter += 1;
        frame.stats.frame = self.frame_counter;
        let stats = frame.stats;

        if self.frames.len() == FRAME_HISTORY {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        Ok(stats)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::HandleMap;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::lighting::MultiLightEnvironment;
    use crate::render::material::MaterialId;

    fn uniforms() -> FrameUniforms {
        FrameUniforms {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_projection: Mat4::identity(),
            camera_position: Vec3::zeros(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            lighting: MultiLightEnvironment::new(),
        }
    }

    fn program() -> CompiledProgram {
        CompiledProgram {
            id: ShaderId(0),
            name: "test".to_string(),
            vertex: String::new(),
            fragment: String::new(),
        }
    }

    fn batch(mesh: MeshHandle, instances: usize) -> DrawBatch {
        DrawBatch {
            mesh,
            material: MaterialId(0),
            shader: ShaderId(0),
            instances: vec![Mat4::identity(); instances],
            transparent: false,
        }
    }

    #[test]
    fn test_records_frame_stats() {
        let mut keys = HandleMap::new();
        let cube = MeshHandle::new(keys.insert(()));
        let mut backend = HeadlessBackend::new(800, 600);
        backend.create_program(&program()).unwrap();
        backend.upload_mesh(cube, &Mesh::cube()).unwrap();

        backend.begin_frame(&uniforms()).unwrap();
        backend.draw(&batch(cube, 3)).unwrap();
        let stats = backend.end_frame().unwrap();

        assert_eq!(stats.frame, 1);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.instances, 3);
        assert_eq!(stats.triangles, 36);
        assert_eq!(backend.last_frame().unwrap().batches.len(), 1);
    }

    #[test]
    fn test_call_order_is_enforced() {
        let mut keys = HandleMap::new();
        let cube = MeshHandle::new(keys.insert(()));
        let missing = MeshHandle::new(keys.insert(()));
        let mut backend = HeadlessBackend::new(1, 1);
        backend.create_program(&program()).unwrap();
        backend.upload_mesh(cube, &Mesh::cube()).unwrap();

        assert!(backend.draw(&batch(cube, 1)).is_err());
        assert!(backend.end_frame().is_err());

        backend.begin_frame(&uniforms()).unwrap();
        assert!(backend.begin_frame(&uniforms()).is_err());
        assert!(matches!(backend.draw(&batch(missing, 1)), Err(RenderError::ResourceNotFound(_))));
        backend.end_frame().unwrap();
    }

    #[test]
    fn test_history_is_bounded() {
        let mut backend = HeadlessBackend::new(1, 1);
        for _ in 0..FRAME_HISTORY + 3 {
            backend.begin_frame(&uniforms()).unwrap();
            backend.end_frame().unwrap();
        }
        assert_eq!(backend.frames().count(), FRAME_HISTORY);
        assert_eq!(backend.frame_count(), (FRAME_HISTORY + 3) as u64);
    }

    #[test]
    fn test_invalid_mesh_is_rejected() {
        let mut keys = HandleMap::new();
        let handle = MeshHandle::new(keys.insert(()));
        let mut backend = HeadlessBackend::new(1, 1);
        let broken = Mesh::new(Mesh::cube().vertices, vec![0, 1]);
        assert!(matches!(backend.upload_mesh(handle, &broken), Err(RenderError::InvalidMesh(_))));
        assert_eq!(backend.resident_meshes(), 0);
    }
}
