//! Full main-loop runs on the headless platform

use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use game_engine::platform::AppEventKind;
use game_engine::prelude::*;
use game_engine::render::HeadlessBackend;

#[derive(Default)]
struct TestApp {
    initialized: bool,
    cleaned_up: bool,
    frames: u32,
    fixed_steps: u32,
    fail_on_frame: Option<u32>,
    cube: Option<Entity>,
    space_pressed_on: Vec<u32>,
    space_held_on: Vec<u32>,
    key_events: Rc<Cell<u32>>,
}

impl Application for TestApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let mesh = engine.assets_mut().insert(Mesh::cube());

        let world = engine.world_mut();
        let camera = world.spawn();
        let camera_component = CameraComponent::new(Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0));
        world
            .add_component(camera, camera_component)
            .map_err(|e| AppError::Custom(e.to_string()))?;

        let cube = world.spawn();
        world
            .add_component(cube, TransformComponent::identity())
            .map_err(|e| AppError::Custom(e.to_string()))?;
        world
            .add_component(cube, RenderableComponent::new(mesh, MaterialId(0)))
            .map_err(|e| AppError::Custom(e.to_string()))?;
        world
            .add_component(cube, MovementFactory::create_linear(Vec3::new(1.0, 0.0, 0.0)))
            .map_err(|e| AppError::Custom(e.to_string()))?;
        self.cube = Some(cube);

        let key_events = Rc::clone(&self.key_events);
        engine.events_mut().register_handler(
            AppEventKind::KeyInput,
            Box::new(move |_: &AppEvent| {
                key_events.set(key_events.get() + 1);
                false
            }),
        );

        self.initialized = true;
        Ok(())
    }

    fn fixed_update(&mut self, _engine: &mut Engine, _step: f32) -> Result<(), AppError> {
        self.fixed_steps += 1;
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        if self.fail_on_frame == Some(self.frames) {
            return Err(AppError::GameLogic("scripted failure".to_string()));
        }
        if engine.input().was_key_pressed(KeyCode::Space) {
            self.space_pressed_on.push(self.frames);
        }
        if engine.input().is_key_down(KeyCode::Space) {
            self.space_held_on.push(self.frames);
        }
        self.frames += 1;
        Ok(())
    }

    fn cleanup(&mut self, _engine: &mut Engine) {
        self.cleaned_up = true;
    }
}

fn engine() -> Engine {
    let mut config = EngineConfig::default();
    config.timing.fixed_update_hz = 2;
    config.timing.max_fixed_steps = 4;
    config.audio.enabled = false;
    Engine::new(config, Box::new(HeadlessBackend::new(640, 640))).unwrap()
}

fn headless(engine: &Engine) -> &HeadlessBackend {
    engine
        .renderer()
        .backend()
        .as_any()
        .downcast_ref::<HeadlessBackend>()
        .unwrap()
}

#[test]
fn test_loop_runs_until_frame_limit() {
    let mut engine = engine();
    let mut platform = HeadlessPlatform::new(640, 640).with_frame_limit(8).with_frame_time(0.25);
    let mut app = TestApp::default();

    engine.run_app(&mut app, &mut platform).unwrap();

    assert!(app.initialized && app.cleaned_up);
    assert_eq!(app.frames, 8);
    assert_eq!(app.fixed_steps, 4);
    assert_eq!(engine.timer().frame_count(), 8);
    assert_eq!(platform.title(), engine.config().window.title);

    let cube = app.cube.unwrap();
    let transform = engine.world().get_component::<TransformComponent>(cube).unwrap();
    assert_relative_eq!(transform.position.x, 2.0, epsilon = 1e-5);

    let backend = headless(&engine);
    assert_eq!(backend.frame_count(), 8);
    assert_eq!(backend.mesh_uploads(), 1);
    assert_eq!(engine.renderer().last_stats().instances, 1);
}

#[test]
fn test_close_request_ends_loop() {
    let mut engine = engine();
    let mut platform = HeadlessPlatform::new(640, 640).with_frame_limit(100);
    platform.script(2, AppEvent::WindowCloseRequested);
    let mut app = TestApp::default();

    engine.run_app(&mut app, &mut platform).unwrap();

    assert_eq!(app.frames, 3);
    assert!(platform.should_close());
    assert!(app.cleaned_up);
}

#[test]
fn test_cleanup_runs_after_error() {
    let mut engine = engine();
    let mut platform = HeadlessPlatform::new(640, 640).with_frame_limit(100);
    let mut app = TestApp {
        fail_on_frame: Some(3),
        ..TestApp::default()
    };

    let result = engine.run_app(&mut app, &mut platform);

    assert!(matches!(result, Err(EngineError::Application(_))));
    assert_eq!(app.frames, 3);
    assert!(app.cleaned_up);
}

#[test]
fn test_input_edges_last_one_frame() {
    let mut engine = engine();
    let mut platform = HeadlessPlatform::new(640, 640).with_frame_limit(4);
    platform.script(
        1,
        AppEvent::KeyInput {
            key: KeyCode::Space,
            pressed: true,
        },
    );
    platform.script(
        3,
        AppEvent::KeyInput {
            key: KeyCode::Space,
            pressed: false,
        },
    );
    let mut app = TestApp::default();

    engine.run_app(&mut app, &mut platform).unwrap();

    assert_eq!(app.space_pressed_on, vec![1]);
    assert_eq!(app.space_held_on, vec![1, 2]);
    assert_eq!(app.key_events.get(), 2);
}

#[test]
fn test_resize_event_reaches_renderer() {
    let mut engine = engine();
    let mut platform = HeadlessPlatform::new(640, 640).with_frame_limit(2);
    platform.script(0, AppEvent::WindowResized { width: 1280, height: 640 });
    let mut app = TestApp::default();

    engine.run_app(&mut app, &mut platform).unwrap();

    assert_eq!(engine.renderer().backend().surface_size(), (1280, 640));
    let (_, camera) = CameraComponent::find_active(engine.world()).unwrap();
    assert_relative_eq!(camera.camera.aspect_ratio(), 2.0);
}

#[test]
fn test_run_builds_engine_from_config() {
    let mut config = EngineConfig::default();
    config.audio.enabled = false;
    let mut platform = HeadlessPlatform::new(320, 240).with_frame_limit(3);
    let mut app = TestApp::default();

    Engine::run(config, &mut app, &mut platform).unwrap();

    assert_eq!(app.frames, 3);
    assert!(app.cleaned_up);
}
