//! Backend abstraction for the renderer
//!
//! The renderer decides what to draw; a backend owns the device resources
//! and turns batches into draw calls.

use std::any::Any;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};
use crate::render::lighting::MultiLightEnvironment;
use crate::render::mesh::{Mesh, MeshHandle};
use crate::render::render_queue::DrawBatch;
use crate::render::shader::CompiledProgram;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Camera block in uniform-buffer layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// World-to-view matrix
    pub view: [[f32; 4]; 4],
    /// View-to-clip matrix
    pub projection: [[f32; 4]; 4],
    /// World-to-clip matrix (`P * X * V`)
    pub view_projection: [[f32; 4]; 4],
    /// Camera position, w unused
    pub camera_position: [f32; 4],
}

/// Per-frame constants handed to the backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip matrix
    pub projection: Mat4,
    /// World-to-clip matrix
    pub view_projection: Mat4,
    /// Camera position in world space
    pub camera_position: Vec3,
    /// Clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Packed scene lights
    pub lighting: MultiLightEnvironment,
}

impl FrameUniforms {
    /// Camera block for upload
    pub fn camera_uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view.into(),
            projection: self.projection.into(),
            view_projection: self.view_projection.into(),
            camera_position: [self.camera_position.x, self.camera_position.y, self.camera_position.z, 1.0],
        }
    }
}

/// Counters for one submitted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Draw calls issued (one per batch)
    pub draw_calls: usize,
    /// Instances drawn across all batches
    pub instances: usize,
    /// Triangles drawn
    pub triangles: usize,
    /// Renderables rejected by frustum culling
    pub culled: usize,
}

/// Rendering backend
pub trait RenderBackend {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Create the device-side program for a compiled shader
    fn create_program(&mut self, program: &CompiledProgram) -> BackendResult<()>;

    /// Upload a mesh; uploading an existing handle replaces it
    fn upload_mesh(&mut self, handle: MeshHandle, mesh: &Mesh) -> BackendResult<()>;

    /// Free an uploaded mesh
    fn release_mesh(&mut self, handle: MeshHandle);

    /// Start recording a frame
    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> BackendResult<()>;

    /// Record one instanced draw
    fn draw(&mut self, batch: &DrawBatch) -> BackendResult<()>;

    /// Submit the frame
    fn end_frame(&mut self) -> BackendResult<FrameStats>;

    /// Resize the output surface
    fn resize(&mut self, width: u32, height: u32);

    /// Current output surface size
    fn surface_size(&self) -> (u32, u32);

    /// Downcast to the concrete backend
    fn as_any(&self) -> &dyn Any;
}
