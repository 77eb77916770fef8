//! # Rendering System
//!
//! High-level renderer over a pluggable [`RenderBackend`].
//!
//! ## Frame flow
//!
//! 1. Pick the active camera (highest-priority active `CameraComponent`)
//! 2. Pack the scene lights into a `MultiLightEnvironment`
//! 3. Collect visible renderables into a [`RenderQueue`], frustum culled
//! 4. Sort the queue and group it into instanced [`DrawBatch`]es
//! 5. Upload meshes the backend has not seen, then submit the batches

pub mod backend;
pub mod backends;
pub mod camera;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod render_queue;
pub mod shader;

use std::collections::HashSet;

use thiserror::Error;

use crate::assets::AssetManager;
use crate::config::RendererConfig;
use crate::ecs::components::CameraComponent;
use crate::ecs::systems::{LightingSystem, RenderableCollector};
use crate::ecs::World;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

pub use backend::{BackendResult, CameraUniform, FrameStats, FrameUniforms, RenderBackend};
pub use backends::{HeadlessBackend, RecordedFrame};
pub use camera::{Camera, Projection};
pub use lighting::{Light, LightType, LightingEnvironment, MultiLightEnvironment};
pub use material::{Material, MaterialFlags, MaterialId, MaterialLibrary};
pub use mesh::{Mesh, MeshError, MeshHandle, Vertex};
pub use render_queue::{DrawBatch, RenderCommand, RenderQueue};
pub use shader::{CompiledProgram, ShaderError, ShaderId, ShaderLibrary, ShaderProgram, ShaderSource, ShaderStage};

/// High-level rendering error types
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Device resource creation failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    BackendError(String),

    /// A mesh or program was used before it was created
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No active camera in the world
    #[error("No active camera in the world")]
    NoActiveCamera,

    /// Shader preprocessing or validation failed
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Mesh data is malformed
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Renderer coordinating the backend, shaders, materials and per-frame data
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    config: RendererConfig,
    shaders: ShaderLibrary,
    materials: MaterialLibrary,
    lighting: LightingSystem,
    collector: RenderableCollector,
    queue: RenderQueue,
    uploaded: HashSet<MeshHandle>,
    last_stats: FrameStats,
}

impl Renderer {
    /// Create a renderer over `backend`
    ///
    /// Compiles the built-in shader programs and creates them on the backend.
    /// The material library starts with a default material at id 0, used for
    /// renderables whose material is unknown.
    pub fn new(mut backend: Box<dyn RenderBackend>, config: RendererConfig) -> RenderResult<Self> {
        log::info!("Initializing renderer on the '{}' backend", backend.name());

        let shaders = ShaderLibrary::with_builtins();
        for (_, program) in shaders.iter() {
            let compiled = shaders.compile(&program.name)?;
            backend.create_program(&compiled)?;
        }

        let mut materials = MaterialLibrary::new();
        materials.add(Material::default());

        Ok(Self {
            backend,
            collector: RenderableCollector::new(config.frustum_culling),
            config,
            shaders,
            materials,
            lighting: LightingSystem::new(),
            queue: RenderQueue::new(),
            uploaded: HashSet::new(),
            last_stats: FrameStats::default(),
        })
    }

    /// Shader library
    pub fn shaders(&self) -> &ShaderLibrary {
        &self.shaders
    }

    /// Material library
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Material library, mutably
    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    /// Active backend
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Counters from the most recent frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Add an include source for later programs
    pub fn register_shader_include(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.shaders.register_include(name, source);
    }

    /// Register, compile and create a shader program
    ///
    /// On error the library is left unchanged.
    pub fn register_shader(&mut self, program: ShaderProgram) -> RenderResult<ShaderId> {
        let mut staged = self.shaders.clone();
        let name = program.name.clone();
        staged.register(program);
        let compiled = staged.compile(&name)?;
        self.backend.create_program(&compiled)?;
        self.shaders = staged;
        log::debug!("Registered shader program '{name}' as {:?}", compiled.id);
        Ok(compiled.id)
    }

    /// Drop the backend copy of a mesh so the next frame uploads it again
    ///
    /// Call after replacing or reloading mesh data in the asset manager.
    pub fn invalidate_mesh(&mut self, mesh: MeshHandle) {
        if self.uploaded.remove(&mesh) {
            self.backend.release_mesh(mesh);
        }
    }

    /// Drop every backend mesh; each is uploaded again when next drawn
    pub fn invalidate_all_meshes(&mut self) {
        for mesh in self.uploaded.drain() {
            self.backend.release_mesh(mesh);
        }
    }

    /// Render one frame of `world`
    ///
    /// A zero-sized surface (minimized window) skips the frame and returns
    /// empty stats.
    pub fn render_world(&mut self, world: &World, assets: &AssetManager) -> RenderResult<FrameStats> {
        let (width, height) = self.backend.surface_size();
        if width == 0 || height == 0 {
            log::trace!("Skipping frame for zero-sized surface");
            return Ok(FrameStats::default());
        }

        let (camera_entity, camera) = CameraComponent::find_active(world).ok_or(RenderError::NoActiveCamera)?;
        log::trace!("Rendering from camera on {camera_entity:?}");

        let ambient = Vec3::from(self.config.ambient_color);
        let lighting = self.lighting.build_environment(world, ambient, self.config.ambient_intensity);

        self.queue.clear();
        let collected = self.collector.collect(
            world,
            camera,
            assets,
            &self.materials,
            &self.shaders,
            &mut self.queue,
        );
        self.queue.sort();
        let batches = self.queue.batches(self.config.max_instances_per_batch);

        for batch in &batches {
            if self.uploaded.contains(&batch.mesh) {
                continue;
            }
            let mesh = assets
                .get::<Mesh>(batch.mesh)
                .ok_or_else(|| RenderError::ResourceNotFound(format!("mesh {:?}", batch.mesh)))?;
            self.backend.upload_mesh(batch.mesh, mesh)?;
            self.uploaded.insert(batch.mesh);
        }

        let view = camera.camera.view_matrix();
        let projection = camera.camera.projection_matrix() * Mat4::clip_correction();
        let uniforms = FrameUniforms {
            view,
            projection,
            view_projection: projection * view,
            camera_position: camera.camera.position,
            clear_color: self.config.clear_color,
            lighting,
        };

        self.backend.begin_frame(&uniforms)?;
        for batch in &batches {
            if let Err(err) = self.backend.draw(batch) {
                // Close the frame so the backend is usable next time
                let _ = self.backend.end_frame();
                return Err(err);
            }
        }
        let mut stats = self.backend.end_frame()?;
        stats.culled = collected.culled;
        self.last_stats = stats;

        log::trace!(
            "Frame {}: {} draw calls, {} instances, {} culled",
            stats.frame,
            stats.draw_calls,
            stats.instances,
            stats.culled
        );
        Ok(stats)
    }

    /// Resize the output surface and update every camera's aspect ratio
    pub fn resize(&mut self, world: &mut World, width: u32, height: u32) {
        log::debug!("Renderer resize to {width}x{height}");
        self.backend.resize(width, height);
        if width == 0 || height == 0 {
            return;
        }
        let aspect = width as f32 / height as f32;
        world.for_each_mut::<CameraComponent>(|_, camera| camera.camera.set_aspect_ratio(aspect));
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.invalidate_all_meshes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use crate::ecs::components::{LightFactory, RenderableComponent, TransformComponent};

    fn renderer() -> Renderer {
        Renderer::new(Box::new(HeadlessBackend::new(800, 600)), RendererConfig::default()).unwrap()
    }

    fn headless(renderer: &Renderer) -> &HeadlessBackend {
        renderer.backend().as_any().downcast_ref::<HeadlessBackend>().unwrap()
    }

    fn scene() -> (World, AssetManager, MeshHandle) {
        let mut world = World::new();
        let mut assets = AssetManager::new(&AssetConfig::default());
        let cube = assets.insert(Mesh::cube());

        let camera = world.spawn();
        world
            .add_component(
                camera,
                CameraComponent::new(Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 4.0 / 3.0, 0.1, 100.0)),
            )
            .unwrap();
        let sun = world.spawn();
        world
            .add_component(sun, LightFactory::directional(-Vec3::y(), Vec3::new(1.0, 1.0, 1.0), 1.0))
            .unwrap();
        (world, assets, cube)
    }

    fn spawn_cube(world: &mut World, mesh: MeshHandle, position: Vec3) {
        let entity = world.spawn();
        world
            .add_component(entity, RenderableComponent::new(mesh, MaterialId(0)))
            .unwrap();
        world
            .add_component(entity, TransformComponent::from_position(position))
            .unwrap();
    }

    #[test]
    fn test_builtin_programs_are_created() {
        let renderer = renderer();
        assert_eq!(headless(&renderer).program_count(), renderer.shaders().len());
        assert_eq!(renderer.materials().len(), 1);
    }

    #[test]
    fn test_render_world_batches_and_culls() {
        let mut renderer = renderer();
        let (mut world, assets, cube) = scene();
        for x in [-2.0, 0.0, 2.0] {
            spawn_cube(&mut world, cube, Vec3::new(x, 0.0, 0.0));
        }
        spawn_cube(&mut world, cube, Vec3::new(0.0, 0.0, 50.0));

        let stats = renderer.render_world(&world, &assets).unwrap();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.instances, 3);
        assert_eq!(stats.culled, 1);

        let frame = headless(&renderer).last_frame().unwrap();
        assert_eq!(frame.uniforms.lighting.light_count(), 1);
        assert_eq!(frame.uniforms.camera_position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_meshes_upload_once() {
        let mut renderer = renderer();
        let (mut world, assets, cube) = scene();
        spawn_cube(&mut world, cube, Vec3::zeros());

        renderer.render_world(&world, &assets).unwrap();
        renderer.render_world(&world, &assets).unwrap();
        assert_eq!(headless(&renderer).mesh_uploads(), 1);

        renderer.invalidate_mesh(cube);
        renderer.render_world(&world, &assets).unwrap();
        assert_eq!(headless(&renderer).mesh_uploads(), 2);
    }

    #[test]
    fn test_missing_camera_is_an_error() {
        let mut renderer = renderer();
        let world = World::new();
        let assets = AssetManager::new(&AssetConfig::default());
        assert!(matches!(
            renderer.render_world(&world, &assets),
            Err(RenderError::NoActiveCamera)
        ));
    }

    #[test]
    fn test_zero_surface_skips_frame() {
        let mut renderer = renderer();
        let (mut world, assets, cube) = scene();
        spawn_cube(&mut world, cube, Vec3::zeros());

        renderer.resize(&mut world, 0, 0);
        let stats = renderer.render_world(&world, &assets).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert_eq!(headless(&renderer).frame_count(), 0);

        renderer.resize(&mut world, 1000, 500);
        let (_, camera) = CameraComponent::find_active(&world).unwrap();
        assert_eq!(camera.camera.aspect_ratio(), 2.0);
        assert_eq!(renderer.render_world(&world, &assets).unwrap().frame, 1);
    }

    #[test]
    fn test_bad_shader_leaves_library_unchanged() {
        let mut renderer = renderer();
        let before = renderer.shaders().len();
        let broken = ShaderProgram::new("broken", "void main() {}", "#version 450\nvoid main() {}");
        assert!(matches!(
            renderer.register_shader(broken),
            Err(RenderError::Shader(ShaderError::MissingVersion(_)))
        ));
        assert_eq!(renderer.shaders().len(), before);
        assert!(renderer.shaders().get("broken").is_none());
    }
}
