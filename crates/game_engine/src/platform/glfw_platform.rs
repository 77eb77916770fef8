//! GLFW window platform

use glfw::{Action, Glfw, GlfwReceiver, Key, PWindow, WindowEvent, WindowHint, WindowMode};

use super::{AppEvent, KeySide, ModifierSides, Platform, PlatformError};
use crate::config::WindowConfig;
use crate::foundation::time::FramePacer;
use crate::input::{KeyCode, MouseButton};

/// Desktop window backed by GLFW
pub struct GlfwPlatform {
    glfw: Glfw,
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
    pacer: FramePacer,
    modifiers: ModifierSides,
}

impl GlfwPlatform {
    /// Open a window
    ///
    /// No client API context is created; the render backend owns the surface.
    /// Without a context there is no swap interval, so `vsync` paces
    /// `poll_events` to the primary monitor's refresh rate instead.
    pub fn new(config: &WindowConfig) -> Result<Self, PlatformError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| PlatformError::InitializationFailed(format!("GLFW: {e:?}")))?;

        glfw.window_hint(WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(WindowHint::Resizable(config.resizable));

        let created = if config.fullscreen {
            glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(WindowMode::Windowed, |m| WindowMode::FullScreen(m));
                glfw.create_window(config.width, config.height, &config.title, mode)
            })
        } else {
            glfw.create_window(config.width, config.height, &config.title, WindowMode::Windowed)
        };
        let (mut window, events) = created.ok_or_else(|| {
            PlatformError::WindowCreationFailed(format!("{}x{} '{}'", config.width, config.height, config.title))
        })?;

        window.set_key_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_scroll_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_focus_polling(true);

        let refresh_hz = glfw.with_primary_monitor(|_, monitor| {
            monitor
                .and_then(|m| m.get_video_mode())
                .map_or(DEFAULT_REFRESH_HZ, |mode| mode.refresh_rate)
        });
        let pacer = FramePacer::new(config.vsync, refresh_hz);

        log::info!(
            "Opened {}x{} window '{}' (vsync: {}, {refresh_hz} Hz)",
            config.width,
            config.height,
            config.title,
            config.vsync
        );
        Ok(Self {
            glfw,
            window,
            events,
            pacer,
            modifiers: ModifierSides::new(),
        })
    }

    fn translate(&mut self, event: WindowEvent) -> Option<AppEvent> {
        match event {
            WindowEvent::Key(key, _, action, _) => {
                let pressed = match action {
                    Action::Press => true,
                    Action::Release => false,
                    Action::Repeat => return None,
                };
                let code = map_key(key)?;
                match key_side(key) {
                    Some(side) => self.modifiers.track(code, side, pressed),
                    None => Some(AppEvent::KeyInput { key: code, pressed }),
                }
            }
            WindowEvent::MouseButton(button, action, _) => {
                let button = match button {
                    glfw::MouseButton::Button1 => MouseButton::Left,
                    glfw::MouseButton::Button2 => MouseButton::Right,
                    glfw::MouseButton::Button3 => MouseButton::Middle,
                    _ => return None,
                };
                Some(AppEvent::MouseButton {
                    button,
                    pressed: action != Action::Release,
                })
            }
            WindowEvent::CursorPos(x, y) => Some(AppEvent::MouseMoved { x, y }),
            WindowEvent::Scroll(delta_x, delta_y) => Some(AppEvent::MouseWheel { delta_x, delta_y }),
            WindowEvent::FramebufferSize(width, height) => Some(AppEvent::WindowResized {
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            }),
            WindowEvent::Close => Some(AppEvent::WindowCloseRequested),
            WindowEvent::Focus(true) => Some(AppEvent::WindowFocused),
            WindowEvent::Focus(false) => {
                self.modifiers.clear();
                Some(AppEvent::WindowUnfocused)
            }
            _ => None,
        }
    }
}

impl Platform for GlfwPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        self.pacer.wait();
        self.glfw.poll_events();
        let native: Vec<WindowEvent> = glfw::flush_messages(&self.events).map(|(_, event)| event).collect();
        native
            .into_iter()
            .filter_map(|event| self.translate(event))
            .collect()
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn time(&self) -> f64 {
        self.glfw.get_time()
    }
}

const DEFAULT_REFRESH_HZ: u32 = 60;

fn key_side(key: Key) -> Option<KeySide> {
    match key {
        Key::LeftShift | Key::LeftControl | Key::LeftAlt => Some(KeySide::Left),
        Key::RightShift | Key::RightControl | Key::RightAlt => Some(KeySide::Right),
        _ => None,
    }
}

fn map_key(key: Key) -> Option<KeyCode> {
    let code = match key {
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::Num0 => KeyCode::Num0,
        Key::Num1 => KeyCode::Num1,
        Key::Num2 => KeyCode::Num2,
        Key::Num3 => KeyCode::Num3,
        Key::Num4 => KeyCode::Num4,
        Key::Num5 => KeyCode::Num5,
        Key::Num6 => KeyCode::Num6,
        Key::Num7 => KeyCode::Num7,
        Key::Num8 => KeyCode::Num8,
        Key::Num9 => KeyCode::Num9,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Escape => KeyCode::Escape,
        Key::Tab => KeyCode::Tab,
        Key::Backspace => KeyCode::Backspace,
        Key::LeftShift | Key::RightShift => KeyCode::Shift,
        Key::LeftControl | Key::RightControl => KeyCode::Control,
        Key::LeftAlt | Key::RightAlt => KeyCode::Alt,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::F1 => KeyCode::F1,
        Key::F2 => KeyCode::F2,
        Key::F3 => KeyCode::F3,
        Key::F4 => KeyCode::F4,
        Key::F5 => KeyCode::F5,
        Key::F6 => KeyCode::F6,
        Key::F7 => KeyCode::F7,
        Key::F8 => KeyCode::F8,
        Key::F9 => KeyCode::F9,
        Key::F10 => KeyCode::F10,
        Key::F11 => KeyCode::F11,
        Key::F12 => KeyCode::F12,
        _ => return None,
    };
    Some(code)
}
