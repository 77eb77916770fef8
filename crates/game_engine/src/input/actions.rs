//! Named actions and axes bound to physical inputs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{InputManager, KeyCode, MouseButton};

/// One physical input that can drive an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputBinding {
    /// Keyboard key
    Key(KeyCode),
    /// Mouse button
    Mouse(MouseButton),
}

impl InputBinding {
    fn is_down(self, input: &InputManager) -> bool {
        match self {
            Self::Key(key) => input.is_key_down(key),
            Self::Mouse(button) => input.is_mouse_button_down(button),
        }
    }

    fn was_pressed(self, input: &InputManager) -> bool {
        match self {
            Self::Key(key) => input.was_key_pressed(key),
            Self::Mouse(button) => input.was_mouse_button_pressed(button),
        }
    }
}

/// Axis driven by a pair of keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBinding {
    /// Keys pushing the axis towards -1
    pub negative: Vec<KeyCode>,
    /// Keys pushing the axis towards +1
    pub positive: Vec<KeyCode>,
}

/// Input bindings as stored in the engine config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Digital actions
    pub actions: BTreeMap<String, Vec<InputBinding>>,
    /// Analog axes built from keys
    pub axes: BTreeMap<String, AxisBinding>,
}

impl Default for InputConfig {
    fn default() -> Self {
        let mut actions = BTreeMap::new();
        actions.insert("quit".to_string(), vec![InputBinding::Key(KeyCode::Escape)]);

        let mut axes = BTreeMap::new();
        axes.insert(
            "move_x".to_string(),
            AxisBinding {
                negative: vec![KeyCode::A, KeyCode::Left],
                positive: vec![KeyCode::D, KeyCode::Right],
            },
        );
        axes.insert(
            "move_z".to_string(),
            AxisBinding {
                negative: vec![KeyCode::S, KeyCode::Down],
                positive: vec![KeyCode::W, KeyCode::Up],
            },
        );

        Self { actions, axes }
    }
}

/// Lookup table from action names to bindings
#[derive(Debug, Clone, Default)]
pub struct ActionMap {
    actions: BTreeMap<String, Vec<InputBinding>>,
    axes: BTreeMap<String, AxisBinding>,
}

impl ActionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the config section
    pub fn from_config(config: &InputConfig) -> Self {
        Self {
            actions: config.actions.clone(),
            axes: config.axes.clone(),
        }
    }

    /// Add a binding to an action, creating it if needed
    pub fn bind(&mut self, action: &str, binding: InputBinding) {
        let bindings = self.actions.entry(action.to_string()).or_default();
        if !bindings.contains(&binding) {
            bindings.push(binding);
        }
    }

    /// Replace an axis definition
    pub fn bind_axis(&mut self, axis: &str, negative: Vec<KeyCode>, positive: Vec<KeyCode>) {
        self.axes.insert(axis.to_string(), AxisBinding { negative, positive });
    }

    /// Remove an action; returns whether it existed
    pub fn unbind(&mut self, action: &str) -> bool {
        self.actions.remove(action).is_some()
    }

    /// Whether any binding of the action is held
    pub fn action_active(&self, input: &InputManager, action: &str) -> bool {
        self.actions
            .get(action)
            .is_some_and(|bindings| bindings.iter().any(|b| b.is_down(input)))
    }

    /// Whether any binding of the action went down this frame
    pub fn action_triggered(&self, input: &InputManager, action: &str) -> bool {
        self.actions
            .get(action)
            .is_some_and(|bindings| bindings.iter().any(|b| b.was_pressed(input)))
    }

    /// Axis value in `[-1, 1]`; opposing keys cancel out, unknown axes read 0
    pub fn axis_value(&self, input: &InputManager, axis: &str) -> f32 {
        let Some(binding) = self.axes.get(axis) else {
            return 0.0;
        };
        let negative = binding.negative.iter().any(|k| input.is_key_down(*k));
        let positive = binding.positive.iter().any(|k| input.is_key_down(*k));
        match (negative, positive) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Names of all actions
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_active_and_triggered() {
        let mut map = ActionMap::new();
        map.bind("fire", InputBinding::Key(KeyCode::Space));
        map.bind("fire", InputBinding::Mouse(MouseButton::Left));

        let mut input = InputManager::new();
        input.handle_mouse_button(MouseButton::Left, true);

        assert!(map.action_active(&input, "fire"));
        assert!(map.action_triggered(&input, "fire"));

        input.update();
        assert!(map.action_active(&input, "fire"));
        assert!(!map.action_triggered(&input, "fire"));
        assert!(!map.action_active(&input, "unknown"));
    }

    #[test]
    fn test_axis_cancels_opposing_keys() {
        let map = ActionMap::from_config(&InputConfig::default());
        let mut input = InputManager::new();

        input.handle_key_input(KeyCode::D, true);
        assert_eq!(map.axis_value(&input, "move_x"), 1.0);

        input.handle_key_input(KeyCode::Left, true);
        assert_eq!(map.axis_value(&input, "move_x"), 0.0);

        input.handle_key_input(KeyCode::D, false);
        assert_eq!(map.axis_value(&input, "move_x"), -1.0);
        assert_eq!(map.axis_value(&input, "missing"), 0.0);
    }

    #[test]
    fn test_bind_is_idempotent_and_unbind() {
        let mut map = ActionMap::new();
        map.bind("jump", InputBinding::Key(KeyCode::Space));
        map.bind("jump", InputBinding::Key(KeyCode::Space));
        assert_eq!(map.action_names().count(), 1);
        assert!(map.unbind("jump"));
        assert!(!map.unbind("jump"));
    }
}
