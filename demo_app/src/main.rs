//! Asteroid field demo
//!
//! Spawns a field of tumbling asteroids, a camera steered with the `move_x`
//! and `move_z` axes, and two lights. Runs headless for a fixed number of
//! frames unless built with the `glfw` feature.

use game_engine::ecs::SystemError;
use game_engine::render::MeshHandle;
use game_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ASTEROID_COUNT: usize = 200;
const FIELD_HALF_EXTENT: f32 = 30.0;
const CAMERA_SPEED: f32 = 8.0;
#[cfg(not(feature = "glfw"))]
const DEFAULT_FRAMES: u64 = 600;

/// Keeps drifting asteroids inside the field by wrapping them around
struct WrapSystem {
    half_extent: f32,
}

impl System for WrapSystem {
    fn name(&self) -> &str {
        "wrap"
    }

    fn phase(&self) -> SystemPhase {
        SystemPhase::PostUpdate
    }

    fn run(&mut self, world: &mut World, _delta_time: f32) -> Result<(), SystemError> {
        let extent = self.half_extent;
        world.for_each_mut::<TransformComponent>(|_, transform| {
            for axis in 0..3 {
                let value = transform.position[axis];
                if value > extent {
                    transform.position[axis] -= 2.0 * extent;
                } else if value < -extent {
                    transform.position[axis] += 2.0 * extent;
                }
            }
        });
        Ok(())
    }
}

struct AsteroidField {
    rng: StdRng,
    camera: Option<Entity>,
    frames: u64,
}

impl AsteroidField {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            camera: None,
            frames: 0,
        }
    }

    fn random_vec(&mut self, range: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-range..range),
            self.rng.gen_range(-range..range),
            self.rng.gen_range(-range..range),
        )
    }

    fn spawn_asteroid(&mut self, world: &mut World, mesh: MeshHandle, material: MaterialId, index: usize) -> Result<(), AppError> {
        let position = self.random_vec(FIELD_HALF_EXTENT);
        let scale = self.rng.gen_range(0.3..2.0);
        let movement = MovementComponent {
            velocity: self.random_vec(1.5),
            angular_velocity: self.random_vec(1.0),
            ..MovementComponent::new()
        };

        let entity = world.spawn();
        world
            .add_component(entity, TransformComponent::from_position(position).with_uniform_scale(scale))
            .and_then(|_| world.add_component(entity, RenderableComponent::new(mesh, material)))
            .and_then(|_| world.add_component(entity, movement))
            .and_then(|_| world.add_component(entity, NameComponent::new(format!("asteroid-{index}"))))
            .map_err(|e| AppError::Custom(e.to_string()))?;
        Ok(())
    }
}

impl Application for AsteroidField {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Building asteroid field with {ASTEROID_COUNT} asteroids");

        let mesh = engine.assets_mut().insert(Mesh::cube());
        let materials = engine.renderer_mut().materials_mut();
        let rock = materials.add(Material::new("rock").with_color(0.55, 0.5, 0.45));
        let ice = materials.add(Material::new("ice").with_color(0.7, 0.85, 1.0).with_opacity(0.6));

        let mut view = engine.create_camera(Vec3::new(0.0, 5.0, 45.0), 60.0);
        let world = engine.world_mut();

        let camera = world.spawn();
        view.look_at(Vec3::zeros(), Vec3::y());
        world
            .add_component(camera, CameraComponent::new(view))
            .map_err(|e| AppError::Custom(e.to_string()))?;
        self.camera = Some(camera);

        let sun = world.spawn();
        world
            .add_component(sun, LightFactory::directional(Vec3::new(-0.3, -1.0, -0.5), Vec3::new(1.0, 0.95, 0.9), 1.0))
            .map_err(|e| AppError::Custom(e.to_string()))?;
        let beacon = world.spawn();
        world
            .add_component(beacon, LightFactory::point(Vec3::zeros(), Vec3::new(1.0, 0.4, 0.2), 2.0, 25.0))
            .map_err(|e| AppError::Custom(e.to_string()))?;

        for index in 0..ASTEROID_COUNT {
            let material = if index % 5 == 0 { ice } else { rock };
            self.spawn_asteroid(world, mesh, material, index)?;
        }

        engine.add_system(Box::new(WrapSystem {
            half_extent: FIELD_HALF_EXTENT,
        }))?;
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        if engine.action_active("quit") {
            engine.quit();
        }

        let step = Vec3::new(engine.axis_value("move_x"), 0.0, engine.axis_value("move_z")) * CAMERA_SPEED * delta_time;
        if let Some(camera) = self.camera.and_then(|e| engine.world_mut().get_component_mut::<CameraComponent>(e)) {
            camera.camera.position += step;
            camera.camera.target += step;
        }

        self.frames += 1;
        if self.frames % 120 == 0 {
            let stats = engine.renderer().last_stats();
            log::info!(
                "Frame {}: {} draw calls, {} instances, {} culled, {:.1} fps",
                self.frames,
                stats.draw_calls,
                stats.instances,
                stats.culled,
                engine.timer().average_fps()
            );
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!(
            "Asteroid field closed after {} frames with {} entities",
            self.frames,
            engine.world().entity_count()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load_or_default("asteroid_field.toml")?;
    let mut app = AsteroidField::new(0x5eed);

    #[cfg(feature = "glfw")]
    {
        let mut platform = game_engine::platform::GlfwPlatform::new(&config.window)?;
        Engine::run(config, &mut app, &mut platform)?;
    }

    #[cfg(not(feature = "glfw"))]
    {
        let frames = std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse().ok())
            .unwrap_or(DEFAULT_FRAMES);
        let mut platform =
            HeadlessPlatform::new(config.window.width, config.window.height).with_frame_limit(frames);
        Engine::run(config, &mut app, &mut platform)?;
    }

    Ok(())
}
