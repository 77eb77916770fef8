//! Configuration system
//!
//! Every section of [`EngineConfig`] has serde defaults, so a config file
//! only needs the values it wants to change. Files are TOML or RON, picked
//! by extension.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::input::InputConfig;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Load configuration, falling back to defaults when the file is missing
    fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::warn!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but make no sense
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window configuration
    pub window: WindowConfig,

    /// Renderer configuration
    pub renderer: RendererConfig,

    /// Asset system configuration
    pub assets: AssetConfig,

    /// Audio configuration
    pub audio: AudioConfig,

    /// Input bindings
    pub input: InputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Simulation timing
    pub timing: TimingConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.timing.fixed_update_hz == 0 {
            return Err(ConfigError::Invalid("fixed_update_hz must be non-zero".to_string()));
        }
        if !(self.renderer.near_plane > 0.0 && self.renderer.near_plane < self.renderer.far_plane) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.renderer.near_plane, self.renderer.far_plane
            )));
        }
        for (name, volume) in [
            ("master_volume", self.audio.master_volume),
            ("music_volume", self.audio.music_volume),
            ("sfx_volume", self.audio.sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {volume}")));
            }
        }
        Ok(())
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,

    /// Window width
    pub width: u32,

    /// Window height
    pub height: u32,

    /// Whether window is resizable
    pub resizable: bool,

    /// Whether to start in fullscreen
    pub fullscreen: bool,

    /// VSync setting
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Game Engine Application".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Clear color (RGBA)
    pub clear_color: [f32; 4],

    /// Cull renderables outside the camera frustum
    pub frustum_culling: bool,

    /// Largest instance count submitted in one batch
    pub max_instances_per_batch: usize,

    /// Near clip plane for cameras created by the engine
    pub near_plane: f32,

    /// Far clip plane for cameras created by the engine
    pub far_plane: f32,

    /// Ambient light color
    pub ambient_color: [f32; 3],

    /// Ambient light intensity
    pub ambient_intensity: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.05, 0.05, 0.08, 1.0],
            frustum_culling: true,
            max_instances_per_batch: 1024,
            near_plane: 0.1,
            far_plane: 1000.0,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.1,
        }
    }
}

/// Asset system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Asset search paths, tried in order
    pub search_paths: Vec<String>,

    /// Reload assets whose files change on disk
    pub hot_reload: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            search_paths: vec!["resources".to_string()],
            hot_reload: cfg!(debug_assertions),
        }
    }
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Enable audio system
    pub enabled: bool,

    /// Master volume (0.0 to 1.0)
    pub master_volume: f32,

    /// Music volume (0.0 to 1.0)
    pub music_volume: f32,

    /// Sound effect volume (0.0 to 1.0)
    pub sfx_volume: f32,

    /// Output sample rate
    pub sample_rate: u32,

    /// Output channel count
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 1.0,
            music_volume: 0.8,
            sfx_volume: 1.0,
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. `info,game_engine::render=debug`
    pub filter: String,

    /// Prefix log lines with timestamps
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: if cfg!(debug_assertions) { "debug" } else { "info" }.to_string(),
            timestamps: true,
        }
    }
}

/// Simulation timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed update rate in Hz
    pub fixed_update_hz: u32,

    /// Most fixed updates run in a single frame
    pub max_fixed_steps: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixed_update_hz: 60,
            max_fixed_steps: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputBinding, KeyCode};

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[window]\ntitle = \"Demo\"\nwidth = 640\n\n[timing]\nfixed_update_hz = 30\n").unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();

        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.timing.fixed_update_hz, 30);
        assert_eq!(config.timing.max_fixed_steps, 5);
        config.validate().unwrap();
    }

    #[test]
    fn test_save_and_load_ron_keeps_bindings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");

        let mut config = EngineConfig::default();
        config
            .input
            .actions
            .insert("jump".to_string(), vec![InputBinding::Key(KeyCode::Space)]);
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.input.actions["jump"], vec![InputBinding::Key(KeyCode::Space)]);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.renderer.near_plane = 10.0;
        config.renderer.far_plane = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.audio.sfx_volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());
    }
}
