//! Platform abstraction
//!
//! A [`Platform`] owns the window (if any) and turns native events into
//! platform-neutral [`AppEvent`]s for the engine.

pub mod headless;
#[cfg(feature = "glfw")]
pub mod glfw_platform;

pub use headless::HeadlessPlatform;
#[cfg(feature = "glfw")]
pub use glfw_platform::GlfwPlatform;

use std::collections::HashSet;

use thiserror::Error;

use crate::events::EventKind;
use crate::input::{KeyCode, MouseButton};

/// Platform errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Windowing library failed to start
    #[error("Platform initialization failed: {0}")]
    InitializationFailed(String),

    /// Window could not be created
    #[error("Window creation failed: {0}")]
    WindowCreationFailed(String),
}

/// Platform-neutral application events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Framebuffer resized, in pixels
    WindowResized {
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
    /// User asked to close the window
    WindowCloseRequested,
    /// Window gained focus
    WindowFocused,
    /// Window lost focus
    WindowUnfocused,
    /// Key pressed or released
    KeyInput {
        /// Key
        key: KeyCode,
        /// True on press
        pressed: bool,
    },
    /// Mouse button pressed or released
    MouseButton {
        /// Button
        button: MouseButton,
        /// True on press
        pressed: bool,
    },
    /// Cursor moved, in window coordinates
    MouseMoved {
        /// Cursor x
        x: f64,
        /// Cursor y
        y: f64,
    },
    /// Scroll wheel moved
    MouseWheel {
        /// Horizontal scroll
        delta_x: f64,
        /// Vertical scroll
        delta_y: f64,
    },
}

/// Discriminant of [`AppEvent`] for handler routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEventKind {
    /// Resize events
    WindowResized,
    /// Close requests
    WindowCloseRequested,
    /// Focus changes, both directions
    WindowFocus,
    /// Keyboard events
    KeyInput,
    /// Mouse button events
    MouseButton,
    /// Cursor motion
    MouseMoved,
    /// Scroll wheel
    MouseWheel,
}

impl EventKind for AppEvent {
    type Kind = AppEventKind;

    fn kind(&self) -> AppEventKind {
        match self {
            Self::WindowResized { .. } => AppEventKind::WindowResized,
            Self::WindowCloseRequested => AppEventKind::WindowCloseRequested,
            Self::WindowFocused | Self::WindowUnfocused => AppEventKind::WindowFocus,
            Self::KeyInput { .. } => AppEventKind::KeyInput,
            Self::MouseButton { .. } => AppEventKind::MouseButton,
            Self::MouseMoved { .. } => AppEventKind::MouseMoved,
            Self::MouseWheel { .. } => AppEventKind::MouseWheel,
        }
    }
}

/// Window and event source
pub trait Platform {
    /// Pump native events and return them in arrival order
    fn poll_events(&mut self) -> Vec<AppEvent>;

    /// Whether the platform wants the loop to end
    fn should_close(&self) -> bool;

    /// Ask the platform to close
    fn request_close(&mut self);

    /// Framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    /// Set the window title
    fn set_title(&mut self, title: &str);

    /// Seconds since the platform started
    fn time(&self) -> f64;
}

/// Which physical copy of a doubled key (Shift, Control, Alt) an event is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySide {
    /// Left-hand key
    Left,
    /// Right-hand key
    Right,
}

/// Folds left and right modifier keys into one logical key
///
/// The logical key is down while either side is held, so releasing one side
/// does not release the key while the other is still pressed.
#[derive(Debug, Default)]
pub struct ModifierSides {
    held: HashSet<(KeyCode, KeySide)>,
}

impl ModifierSides {
    /// Create with nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release of one side
    ///
    /// Returns the event to forward, or `None` when the logical key does not
    /// change state.
    pub fn track(&mut self, key: KeyCode, side: KeySide, pressed: bool) -> Option<AppEvent> {
        let other = match side {
            KeySide::Left => KeySide::Right,
            KeySide::Right => KeySide::Left,
        };
        let other_held = self.held.contains(&(key, other));
        let changed = if pressed {
            self.held.insert((key, side))
        } else {
            self.held.remove(&(key, side))
        };
        (changed && !other_held).then_some(AppEvent::KeyInput { key, pressed })
    }

    /// Forget held keys, for focus loss
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_held_until_both_sides_release() {
        let mut sides = ModifierSides::new();
        let press = Some(AppEvent::KeyInput {
            key: KeyCode::Shift,
            pressed: true,
        });
        let release = Some(AppEvent::KeyInput {
            key: KeyCode::Shift,
            pressed: false,
        });

        assert_eq!(sides.track(KeyCode::Shift, KeySide::Left, true), press);
        assert_eq!(sides.track(KeyCode::Shift, KeySide::Right, true), None);
        assert_eq!(sides.track(KeyCode::Shift, KeySide::Left, false), None);
        assert_eq!(sides.track(KeyCode::Shift, KeySide::Right, false), release);
    }

    #[test]
    fn test_modifier_sides_ignore_unmatched_release() {
        let mut sides = ModifierSides::new();
        assert_eq!(sides.track(KeyCode::Alt, KeySide::Right, false), None);

        sides.track(KeyCode::Control, KeySide::Left, true);
        sides.clear();
        assert_eq!(
            sides.track(KeyCode::Control, KeySide::Right, true),
            Some(AppEvent::KeyInput {
                key: KeyCode::Control,
                pressed: true,
            })
        );
    }
}
