//! Sound asset management
//!
//! Sounds are grouped into named banks that load and unload together. Sound
//! ids are global: loading a bank that reuses an id replaces the earlier
//! sound and moves it to the new bank.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetError, AssetManager};
use crate::audio::AudioError;

/// Unique identifier for a sound
pub type SoundId = String;

/// Encoded sound file contents (WAV, OGG, MP3, FLAC)
///
/// Decoding happens in the backend; cloning shares the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundData {
    bytes: Arc<[u8]>,
}

impl SoundData {
    /// Wrap encoded bytes
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Encoded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded size
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether there is no data
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Asset for SoundData {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::InvalidData("empty sound file".to_string()));
        }
        Ok(Self::new(bytes))
    }

    fn extensions() -> &'static [&'static str] {
        &["wav", "ogg", "mp3", "flac"]
    }
}

/// Bank description stored as RON
///
/// ```ron
/// (name: "ui", sounds: {"click": "audio/click.wav"})
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundBankManifest {
    /// Bank name
    pub name: String,
    /// Sound id to asset path
    pub sounds: BTreeMap<SoundId, String>,
}

struct LoadedSound {
    data: SoundData,
    bank: String,
}

/// Sound bank registry
#[derive(Default)]
pub struct SoundManager {
    sounds: HashMap<SoundId, LoadedSound>,
}

impl SoundManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `(id, path)` pair into `bank`
    ///
    /// Files go through the asset manager, so search paths and caching
    /// apply. Nothing is added when any file fails.
    pub fn load_bank<'a>(
        &mut self,
        assets: &mut AssetManager,
        bank: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<usize, AudioError> {
        let mut loaded = Vec::new();
        for (id, path) in entries {
            let handle = assets.load::<SoundData>(path)?;
            let data = assets.get(handle).cloned().ok_or(AssetError::InvalidHandle)?;
            loaded.push((id.to_string(), data));
        }
        let count = loaded.len();
        for (id, data) in loaded {
            self.insert(bank, id, data);
        }
        log::info!("Loaded sound bank '{bank}' ({count} sounds)");
        Ok(count)
    }

    /// Load a bank described by a RON manifest
    pub fn load_bank_manifest(&mut self, assets: &mut AssetManager, path: impl AsRef<Path>) -> Result<usize, AudioError> {
        let resolved = assets.resolve(path)?;
        let text = std::fs::read_to_string(&resolved).map_err(AssetError::from)?;
        let manifest: SoundBankManifest =
            ron::from_str(&text).map_err(|e| AudioError::InvalidManifest(format!("{}: {e}", resolved.display())))?;
        self.load_bank(
            assets,
            &manifest.name,
            manifest.sounds.iter().map(|(id, path)| (id.as_str(), path.as_str())),
        )
    }

    /// Add one sound to a bank, replacing any sound with the same id
    pub fn insert(&mut self, bank: &str, id: impl Into<SoundId>, data: SoundData) {
        let id = id.into();
        if let Some(previous) = self.sounds.get(&id) {
            log::debug!("Sound '{id}' moves from bank '{}' to '{bank}'", previous.bank);
        }
        self.sounds.insert(
            id,
            LoadedSound {
                data,
                bank: bank.to_string(),
            },
        );
    }

    /// Drop every sound of a bank; returns how many were removed
    pub fn unload_bank(&mut self, bank: &str) -> usize {
        let before = self.sounds.len();
        self.sounds.retain(|_, sound| sound.bank != bank);
        let removed = before - self.sounds.len();
        if removed > 0 {
            log::info!("Unloaded sound bank '{bank}' ({removed} sounds)");
        }
        removed
    }

    /// Sound data by id
    pub fn get(&self, id: &str) -> Option<&SoundData> {
        self.sounds.get(id).map(|sound| &sound.data)
    }

    /// Check if a sound is loaded
    pub fn is_loaded(&self, id: &str) -> bool {
        self.sounds.contains_key(id)
    }

    /// Bank a sound belongs to
    pub fn bank_of(&self, id: &str) -> Option<&str> {
        self.sounds.get(id).map(|sound| sound.bank.as_str())
    }

    /// Number of loaded sounds
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether no sound is loaded
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetConfig;
    use std::fs;

    fn assets_in(dir: &Path) -> AssetManager {
        AssetManager::new(&AssetConfig {
            search_paths: vec![dir.display().to_string()],
            hot_reload: false,
        })
    }

    #[test]
    fn test_load_and_unload_bank() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("click.wav"), b"RIFF-click").unwrap();
        fs::write(dir.path().join("beep.wav"), b"RIFF-beep").unwrap();
        let mut assets = assets_in(dir.path());
        let mut sounds = SoundManager::new();

        let count = sounds
            .load_bank(&mut assets, "ui", [("click", "click.wav"), ("beep", "beep.wav")])
            .unwrap();
        assert_eq!(count, 2);
        assert!(sounds.is_loaded("click"));
        assert_eq!(sounds.get("beep").unwrap().bytes(), b"RIFF-beep");

        assert_eq!(sounds.unload_bank("ui"), 2);
        assert!(sounds.is_empty());
    }

    #[test]
    fn test_failed_bank_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.wav"), b"RIFF").unwrap();
        let mut assets = assets_in(dir.path());
        let mut sounds = SoundManager::new();

        let result = sounds.load_bank(&mut assets, "sfx", [("ok", "ok.wav"), ("missing", "missing.wav")]);
        assert!(matches!(result, Err(AudioError::Asset(AssetError::NotFound(_)))));
        assert!(!sounds.is_loaded("ok"));
    }

    #[test]
    fn test_manifest_loading() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("boom.ogg"), b"OggS").unwrap();
        fs::write(
            dir.path().join("sfx.ron"),
            r#"(name: "sfx", sounds: {"boom": "boom.ogg"})"#,
        )
        .unwrap();
        let mut assets = assets_in(dir.path());
        let mut sounds = SoundManager::new();

        assert_eq!(sounds.load_bank_manifest(&mut assets, "sfx.ron").unwrap(), 1);
        assert_eq!(sounds.bank_of("boom"), Some("sfx"));
    }

    #[test]
    fn test_mp3_and_flac_banks_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("theme.mp3"), b"ID3").unwrap();
        fs::write(dir.path().join("wind.flac"), b"fLaC").unwrap();
        let mut assets = assets_in(dir.path());
        let mut sounds = SoundManager::new();

        let count = sounds
            .load_bank(&mut assets, "music", [("theme", "theme.mp3"), ("wind", "wind.flac")])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(sounds.get("wind").unwrap().bytes(), b"fLaC");
    }

    #[test]
    fn test_reused_id_moves_bank() {
        let mut sounds = SoundManager::new();
        sounds.insert("a", "shared", SoundData::new(vec![1u8]));
        sounds.insert("b", "shared", SoundData::new(vec![2u8]));
        assert_eq!(sounds.unload_bank("a"), 0);
        assert_eq!(sounds.get("shared").unwrap().bytes(), &[2u8]);
    }
}
