//! Render queue
//!
//! Collects one command per visible renderable, sorts them into submission
//! order and groups runs that share mesh and material into instanced batches.

use std::cmp::Ordering;

use crate::ecs::Entity;
use crate::foundation::math::Mat4;
use crate::render::material::MaterialId;
use crate::render::mesh::MeshHandle;
use crate::render::shader::ShaderId;

/// Single draw request
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    /// Entity that produced the command
    pub entity: Entity,

    /// Mesh to draw
    pub mesh: MeshHandle,

    /// Material to draw with
    pub material: MaterialId,

    /// Shader program of the material
    pub shader: ShaderId,

    /// Model (world) matrix
    pub model: Mat4,

    /// Distance along the camera view direction
    pub depth: f32,

    /// Alpha blended
    pub transparent: bool,
}

/// Consecutive commands drawn with one instanced call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    /// Shared mesh
    pub mesh: MeshHandle,
    /// Shared material
    pub material: MaterialId,
    /// Shader program
    pub shader: ShaderId,
    /// One model matrix per instance
    pub instances: Vec<Mat4>,
    /// Whether the batch is blended
    pub transparent: bool,
}

impl DrawBatch {
    fn from_command(command: &RenderCommand) -> Self {
        Self {
            mesh: command.mesh,
            material: command.material,
            shader: command.shader,
            instances: vec![command.model],
            transparent: command.transparent,
        }
    }

    /// Number of instances
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Frame's render commands
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    commands: Vec<RenderCommand>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Sort into submission order
    ///
    /// Opaque commands come first, grouped by shader, material and mesh and
    /// front-to-back within a group. Transparent commands follow back-to-front.
    pub fn sort(&mut self) {
        self.commands.sort_by(|a, b| match (a.transparent, b.transparent) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => a
                .shader
                .cmp(&b.shader)
                .then(a.material.cmp(&b.material))
                .then(a.mesh.key().cmp(&b.mesh.key()))
                .then(a.depth.total_cmp(&b.depth)),
            (true, true) => b.depth.total_cmp(&a.depth),
        });
    }

    /// Group consecutive opaque commands sharing mesh and material
    ///
    /// Transparent commands are never merged so their depth order survives.
    /// Batches hold at most `max_instances` instances (0 means unlimited).
    pub fn batches(&self, max_instances: usize) -> Vec<DrawBatch> {
        let limit = if max_instances == 0 { usize::MAX } else { max_instances };
        let mut batches: Vec<DrawBatch> = Vec::new();
        for command in &self.commands {
            if let Some(last) = batches.last_mut() {
                if !command.transparent
                    && !last.transparent
                    && last.mesh == command.mesh
                    && last.material == command.material
                    && last.instances.len() < limit
                {
                    last.instances.push(command.model);
                    continue;
                }
            }
            batches.push(DrawBatch::from_command(command));
        }
        batches
    }

    /// Commands in current order
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every command
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
