//! Input management system
//!
//! [`InputManager`] keeps per-frame keyboard and mouse state fed by platform
//! events. Edges (pressed/released this frame) are cleared by
//! [`InputManager::update`], which the engine calls once per frame after the
//! application has seen them.

mod actions;
mod keys;

pub use actions::{ActionMap, AxisBinding, InputBinding, InputConfig};
pub use keys::{KeyCode, Modifiers, MouseButton};

use std::collections::HashSet;

/// Input manager
#[derive(Debug, Default)]
pub struct InputManager {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
    mouse_position: (f64, f64),
    mouse_delta: (f64, f64),
    scroll_delta: (f64, f64),
    has_mouse_position: bool,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame: clear edges and accumulated deltas
    pub fn update(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = (0.0, 0.0);
    }

    /// Handle key input
    ///
    /// Key repeat (a press for a key already held) does not produce a new
    /// pressed edge.
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if self.keys_down.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.buttons_down.insert(button) {
                self.buttons_pressed.insert(button);
            }
        } else if self.buttons_down.remove(&button) {
            self.buttons_released.insert(button);
        }
    }

    /// Handle mouse movement
    ///
    /// The first position ever reported sets the cursor without producing a
    /// delta, so the camera does not jump on the first frame.
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if self.has_mouse_position {
            self.mouse_delta.0 += x - self.mouse_position.0;
            self.mouse_delta.1 += y - self.mouse_position.1;
        }
        self.mouse_position = (x, y);
        self.has_mouse_position = true;
    }

    /// Handle scroll wheel input
    pub fn handle_mouse_wheel(&mut self, dx: f64, dy: f64) {
        self.scroll_delta.0 += dx;
        self.scroll_delta.1 += dy;
    }

    /// Whether a key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Whether a key went down this frame
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether a key went up this frame
    pub fn was_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Whether a mouse button is held
    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Whether a mouse button went down this frame
    pub fn was_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Whether a mouse button went up this frame
    pub fn was_mouse_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Cursor position in window pixels
    pub fn mouse_position(&self) -> (f64, f64) {
        self.mouse_position
    }

    /// Cursor movement accumulated this frame
    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    /// Scroll accumulated this frame
    pub fn scroll_delta(&self) -> (f64, f64) {
        self.scroll_delta
    }

    /// Modifier keys currently held
    pub fn modifiers(&self) -> Modifiers {
        self.keys_down
            .iter()
            .filter_map(|key| key.modifier())
            .fold(Modifiers::empty(), |acc, m| acc | m)
    }

    /// Release everything, e.g. when the window loses focus
    pub fn reset(&mut self) {
        let has_position = self.has_mouse_position;
        let position = self.mouse_position;
        *self = Self::default();
        self.has_mouse_position = has_position;
        self.mouse_position = position;
    }
}
