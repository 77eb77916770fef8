//! Core engine implementation

use thiserror::Error;

use crate::application::{AppError, AppEvent, Application};
use crate::assets::{AssetError, AssetManager};
use crate::audio::{AudioError, AudioSystem};
use crate::config::{ConfigError, EngineConfig};
use crate::ecs::components::CameraComponent;
use crate::ecs::systems::MovementSystem;
use crate::ecs::{ScheduleError, ScheduleRunError, System, SystemPhase, SystemScheduler, World};
use crate::events::EventSystem;
use crate::foundation::logging;
use crate::foundation::time::{FixedTimestep, Timer};
use crate::input::{ActionMap, InputManager};
use crate::platform::Platform;
use crate::foundation::math::Vec3;
use crate::render::{Camera, HeadlessBackend, RenderBackend, RenderError, Renderer};

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    config: EngineConfig,
    world: World,
    assets: AssetManager,
    renderer: Renderer,
    input: InputManager,
    actions: ActionMap,
    audio: AudioSystem,
    events: EventSystem<AppEvent>,
    scheduler: SystemScheduler,
    timer: Timer,
    fixed: FixedTimestep,
    running: bool,
}

impl Engine {
    /// Create a new engine rendering through `backend`
    ///
    /// The configuration is validated first. The built-in movement system is
    /// registered in the `Update` phase.
    pub fn new(config: EngineConfig, backend: Box<dyn RenderBackend>) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing engine...");

        let renderer = Renderer::new(backend, config.renderer.clone())
            .map_err(|e| EngineError::InitializationFailed(format!("Renderer: {e}")))?;
        let assets = AssetManager::new(&config.assets);
        let audio = AudioSystem::from_config(&config.audio);
        let actions = ActionMap::from_config(&config.input);
        let fixed = FixedTimestep::new(config.timing.fixed_update_hz, config.timing.max_fixed_steps);

        let mut scheduler = SystemScheduler::new();
        scheduler.add_system(Box::new(MovementSystem::new()))?;

        Ok(Self {
            config,
            world: World::new(),
            assets,
            renderer,
            input: InputManager::new(),
            actions,
            audio,
            events: EventSystem::new(),
            scheduler,
            timer: Timer::new(),
            fixed,
            running: true,
        })
    }

    /// Run `app` on `platform` until either asks to close
    ///
    /// Initializes logging from the configuration and renders through a
    /// recording backend sized to the platform framebuffer.
    pub fn run<A: Application, P: Platform>(config: EngineConfig, app: &mut A, platform: &mut P) -> Result<(), EngineError> {
        logging::init(&config.logging);
        let (width, height) = platform.framebuffer_size();
        let mut engine = Self::new(config, Box::new(HeadlessBackend::new(width, height)))?;
        engine.run_app(app, platform)
    }

    /// Drive the main loop with an already constructed engine
    ///
    /// `cleanup` runs whenever `initialize` succeeded, even if the loop
    /// fails afterwards.
    pub fn run_app<A: Application, P: Platform>(&mut self, app: &mut A, platform: &mut P) -> Result<(), EngineError> {
        platform.set_title(&self.config.window.title);
        self.running = true;

        app.initialize(self).map_err(app_error("initialize"))?;

        log::info!("Starting main loop...");
        let mut last_time = platform.time();
        let mut result = Ok(());
        while self.running && !platform.should_close() {
            if let Err(err) = self.frame(app, platform, &mut last_time) {
                log::error!("Main loop stopped: {err}");
                result = Err(err);
                break;
            }
        }

        app.cleanup(self);
        self.audio.shutdown();

        log::info!("Engine shutdown complete after {} frames", self.timer.frame_count());
        result
    }

    fn frame<A: Application, P: Platform>(&mut self, app: &mut A, platform: &mut P, last_time: &mut f64) -> Result<(), EngineError> {
        let events = platform.poll_events();
        let now = platform.time();
        let delta_time = (now - *last_time).max(0.0) as f32;
        *last_time = now;
        self.timer.advance(delta_time);

        for event in events {
            self.events.send(event);
            app.handle_event(self, event).map_err(app_error("handle_event"))?;
        }
        self.events.update_time(now);
        self.events.dispatch();
        if !self.running {
            platform.request_close();
        }

        self.scheduler.run_phase(SystemPhase::PreUpdate, &mut self.world, delta_time)?;

        let steps = self.fixed.accumulate(delta_time);
        let step = self.fixed.step();
        for _ in 0..steps {
            app.fixed_update(self, step).map_err(app_error("fixed_update"))?;
            self.scheduler.run_phase(SystemPhase::Update, &mut self.world, step)?;
        }

        app.update(self, delta_time).map_err(app_error("update"))?;
        self.scheduler.run_phase(SystemPhase::PostUpdate, &mut self.world, delta_time)?;

        let reloaded = self.assets.update();
        if reloaded > 0 {
            log::debug!("Hot-reloaded {reloaded} assets");
            self.renderer.invalidate_all_meshes();
        }

        self.audio.sync_sources(&mut self.world)?;
        if let Some((_, camera)) = CameraComponent::find_active(&self.world) {
            let camera = &camera.camera;
            self.audio.set_listener(camera.position, camera.forward(), camera.up);
        }
        self.audio.update()?;

        self.scheduler.run_phase(SystemPhase::Render, &mut self.world, delta_time)?;
        app.render(self).map_err(app_error("render"))?;

        self.input.update();
        Ok(())
    }

    /// Render the current frame with the engine renderer
    ///
    /// A world without an active camera renders nothing.
    pub fn render(&mut self) -> Result<(), AppError> {
        match self.renderer.render_world(&self.world, &self.assets) {
            Ok(_) => Ok(()),
            Err(RenderError::NoActiveCamera) => {
                log::trace!("No active camera, skipping render");
                Ok(())
            }
            Err(err) => Err(EngineError::Render(err).into()),
        }
    }

    /// Handle an application event
    pub fn handle_event(&mut self, event: AppEvent) -> Result<(), AppError> {
        match event {
            AppEvent::WindowResized { width, height } => {
                self.renderer.resize(&mut self.world, width, height);
            }
            AppEvent::WindowCloseRequested => {
                log::info!("Window close requested");
                self.running = false;
            }
            AppEvent::WindowFocused => {}
            AppEvent::WindowUnfocused => {
                self.input.reset();
            }
            AppEvent::KeyInput { key, pressed } => {
                self.input.handle_key_input(key, pressed);
            }
            AppEvent::MouseButton { button, pressed } => {
                self.input.handle_mouse_button(button, pressed);
            }
            AppEvent::MouseMoved { x, y } => {
                self.input.handle_mouse_move(x, y);
            }
            AppEvent::MouseWheel { delta_x, delta_y } => {
                self.input.handle_mouse_wheel(delta_x, delta_y);
            }
        }
        Ok(())
    }

    /// Register a system with the scheduler
    pub fn add_system(&mut self, system: Box<dyn System>) -> Result<(), EngineError> {
        self.scheduler.add_system(system)?;
        Ok(())
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get the asset manager
    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    /// Get mutable access to the asset manager
    pub fn assets_mut(&mut self) -> &mut AssetManager {
        &mut self.assets
    }

    /// Get the renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Get mutable access to the renderer
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Get the input manager
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Action bindings loaded from the `input` config section
    pub fn actions(&self) -> &ActionMap {
        &self.actions
    }

    /// Mutable action bindings
    pub fn actions_mut(&mut self) -> &mut ActionMap {
        &mut self.actions
    }

    /// Whether a bound action is held this frame
    pub fn action_active(&self, action: &str) -> bool {
        self.actions.action_active(&self.input, action)
    }

    /// Value of a bound axis in `[-1, 1]`
    pub fn axis_value(&self, axis: &str) -> f32 {
        self.actions.axis_value(&self.input, axis)
    }

    /// Get the audio system
    pub fn audio(&self) -> &AudioSystem {
        &self.audio
    }

    /// Get mutable access to the audio system
    pub fn audio_mut(&mut self) -> &mut AudioSystem {
        &mut self.audio
    }

    /// Event system carrying every platform event of the frame
    pub fn events_mut(&mut self) -> &mut EventSystem<AppEvent> {
        &mut self.events
    }

    /// Frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Perspective camera using the configured clip planes
    ///
    /// The aspect ratio follows the current render surface.
    pub fn create_camera(&self, position: Vec3, fov_degrees: f32) -> Camera {
        let (width, height) = self.renderer.backend().surface_size();
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        let renderer = &self.config.renderer;
        Camera::perspective(position, fov_degrees, aspect, renderer.near_plane, renderer.far_plane)
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }

    /// Interpolation factor between the last two fixed steps
    pub fn fixed_alpha(&self) -> f32 {
        self.fixed.alpha()
    }
}

fn app_error(stage: &'static str) -> impl FnOnce(AppError) -> EngineError {
    move |e| EngineError::Application(format!("App {stage}: {e}"))
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Asset system error
    #[error("Asset system error: {0}")]
    Asset(#[from] AssetError),

    /// Audio system error
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// System registration failed
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// A scheduled system failed
    #[error("System error: {0}")]
    SystemRun(#[from] ScheduleRunError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    fn engine() -> Engine {
        let mut config = EngineConfig::default();
        config.audio.enabled = false;
        Engine::new(config, Box::new(HeadlessBackend::new(800, 600))).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.window.width = 0;
        let result = Engine::new(config, Box::new(HeadlessBackend::new(1, 1)));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_events_feed_input_and_close() {
        let mut engine = engine();
        engine
            .handle_event(AppEvent::KeyInput {
                key: KeyCode::Escape,
                pressed: true,
            })
            .unwrap();
        assert!(engine.input().is_key_down(KeyCode::Escape));
        assert!(engine.action_active("quit"));

        engine.handle_event(AppEvent::WindowUnfocused).unwrap();
        assert!(!engine.input().is_key_down(KeyCode::Escape));

        engine.handle_event(AppEvent::WindowCloseRequested).unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_resize_updates_backend_and_cameras() {
        let mut engine = engine();
        let camera = engine.world_mut().spawn();
        engine
            .world_mut()
            .add_component(camera, CameraComponent::default())
            .unwrap();

        engine
            .handle_event(AppEvent::WindowResized { width: 400, height: 200 })
            .unwrap();

        assert_eq!(engine.renderer().backend().surface_size(), (400, 200));
        let aspect = engine
            .world()
            .get_component::<CameraComponent>(camera)
            .unwrap()
            .camera
            .aspect_ratio();
        assert_eq!(aspect, 2.0);
    }

    #[test]
    fn test_create_camera_uses_configured_clip_planes() {
        let mut config = EngineConfig::default();
        config.audio.enabled = false;
        config.renderer.near_plane = 0.5;
        config.renderer.far_plane = 250.0;
        let engine = Engine::new(config, Box::new(HeadlessBackend::new(800, 400))).unwrap();

        let camera = engine.create_camera(Vec3::new(0.0, 0.0, 10.0), 60.0);
        assert_eq!(camera.projection.clip_planes(), (0.5, 250.0));
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_render_without_camera_is_skipped() {
        let mut engine = engine();
        assert!(engine.render().is_ok());
        assert_eq!(engine.renderer().last_stats().frame, 0);
    }
}
