//! Asset management system
//!
//! Assets are stored per type in slot maps and addressed by typed handles.
//! Loading the same file twice returns the handle of the first load. With
//! hot reload enabled, [`AssetManager::update`] re-reads files whose
//! modification time moved forward.

pub mod image_loader;
pub mod mtl_parser;
pub mod obj_loader;

pub use image_loader::ImageData;
pub use mtl_parser::{MtlData, MtlError, MtlParser};
pub use obj_loader::{ObjError, ObjGroup, ObjLoader, ObjModel};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

use crate::config::AssetConfig;
use crate::foundation::collections::{Handle, HandleMap, TypedHandle};

/// Asset handle type
pub type AssetHandle<T> = TypedHandle<T>;

/// Handle to a loaded texture
pub type TextureHandle = AssetHandle<ImageData>;

/// Asset trait for loadable resources
pub trait Asset: Send + Sync + Sized + 'static {
    /// Load asset from raw bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError>;

    /// File extensions this asset loads from (lowercase, no dot)
    ///
    /// An empty list accepts any extension.
    fn extensions() -> &'static [&'static str] {
        &[]
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Handle does not refer to a live asset
    #[error("Invalid asset handle")]
    InvalidHandle,

    /// Asset has no backing file
    #[error("Asset was not loaded from a file")]
    NoSourceFile,

    /// OBJ parse error
    #[error("OBJ error: {0}")]
    Obj(#[from] ObjError),

    /// MTL parse error
    #[error("MTL error: {0}")]
    Mtl(#[from] MtlError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

struct AssetEntry<T> {
    asset: T,
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

struct AssetStorage<T> {
    entries: HandleMap<AssetEntry<T>>,
    by_path: HashMap<PathBuf, Handle>,
}

impl<T> Default for AssetStorage<T> {
    fn default() -> Self {
        Self {
            entries: HandleMap::new(),
            by_path: HashMap::new(),
        }
    }
}

trait ErasedAssetStorage: Send + Sync {
    fn reload_changed(&mut self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Asset> ErasedAssetStorage for AssetStorage<T> {
    fn reload_changed(&mut self) -> usize {
        let mut reloaded = 0;
        for entry in self.entries.values_mut() {
            let Some(path) = entry.path.as_ref() else {
                continue;
            };
            let current = modified_time(path);
            let changed = match (entry.modified, current) {
                (Some(old), Some(new)) => new > old,
                (None, Some(_)) => true,
                _ => false,
            };
            if !changed {
                continue;
            }
            // The timestamp advances even on failure so a broken file is not retried every frame
            entry.modified = current;
            match read_asset::<T>(path) {
                Ok(asset) => {
                    entry.asset = asset;
                    reloaded += 1;
                    log::info!("Hot-reloaded {}", path.display());
                }
                Err(e) => log::warn!("Hot reload of {} failed, keeping previous version: {e}", path.display()),
            }
        }
        reloaded
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_asset<T: Asset>(path: &Path) -> Result<T, AssetError> {
    let bytes = std::fs::read(path)?;
    T::from_bytes(&bytes)
}

/// Asset management system
pub struct AssetManager {
    storages: HashMap<TypeId, Box<dyn ErasedAssetStorage>>,
    search_paths: Vec<PathBuf>,
    hot_reload: bool,
}

impl AssetManager {
    /// Create a new asset manager
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            storages: HashMap::new(),
            search_paths: config.search_paths.iter().map(PathBuf::from).collect(),
            hot_reload: config.hot_reload,
        }
    }

    /// Directories searched by [`AssetManager::resolve`], in order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Append a search directory
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Enable or disable hot reload
    pub fn set_hot_reload(&mut self, enabled: bool) {
        self.hot_reload = enabled;
    }

    /// Find the file for an asset path
    ///
    /// Each search path is tried in order, then the path as given.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, AssetError> {
        let path = path.as_ref();
        self.search_paths
            .iter()
            .map(|dir| dir.join(path))
            .chain(std::iter::once(path.to_path_buf()))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| AssetError::NotFound(path.display().to_string()))
    }

    fn storage<T: Asset>(&self) -> Option<&AssetStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<AssetStorage<T>>()
    }

    fn storage_mut<T: Asset>(&mut self) -> &mut AssetStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(AssetStorage::<T>::default()));
        match storage.as_any_mut().downcast_mut::<AssetStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("asset storage registered under the TypeId of another type"),
        }
    }

    /// Load an asset from disk
    ///
    /// ```ignore
    /// let mesh = assets.load::<Mesh>("models/teapot.obj")?;
    /// ```
    pub fn load<T: Asset>(&mut self, path: impl AsRef<Path>) -> Result<AssetHandle<T>, AssetError> {
        let path = path.as_ref();
        check_extension::<T>(path)?;

        let resolved = self.resolve(path)?;
        let key = std::fs::canonicalize(&resolved).unwrap_or_else(|_| resolved.clone());

        if let Some(&handle) = self.storage::<T>().and_then(|s| s.by_path.get(&key)) {
            log::trace!("Asset cache hit for {}", key.display());
            return Ok(AssetHandle::new(handle));
        }

        let modified = modified_time(&resolved);
        let asset = read_asset::<T>(&resolved)?;
        log::debug!("Loaded asset {}", resolved.display());

        let storage = self.storage_mut::<T>();
        let handle = storage.entries.insert(AssetEntry {
            asset,
            path: Some(key.clone()),
            modified,
        });
        storage.by_path.insert(key, handle);
        Ok(AssetHandle::new(handle))
    }

    /// Store an asset created at runtime
    pub fn insert<T: Asset>(&mut self, asset: T) -> AssetHandle<T> {
        let handle = self.storage_mut::<T>().entries.insert(AssetEntry {
            asset,
            path: None,
            modified: None,
        });
        AssetHandle::new(handle)
    }

    /// Get an asset by handle
    pub fn get<T: Asset>(&self, handle: AssetHandle<T>) -> Option<&T> {
        self.storage::<T>()?.entries.get(handle.key()).map(|e| &e.asset)
    }

    /// Get an asset mutably
    pub fn get_mut<T: Asset>(&mut self, handle: AssetHandle<T>) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<AssetStorage<T>>()?
            .entries
            .get_mut(handle.key())
            .map(|e| &mut e.asset)
    }

    /// Whether the handle refers to a live asset
    pub fn contains<T: Asset>(&self, handle: AssetHandle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// File an asset was loaded from
    pub fn path_of<T: Asset>(&self, handle: AssetHandle<T>) -> Option<&Path> {
        self.storage::<T>()?.entries.get(handle.key())?.path.as_deref()
    }

    /// Remove an asset; later loads of the same file read it again
    pub fn unload<T: Asset>(&mut self, handle: AssetHandle<T>) -> Option<T> {
        let storage = self.storage_mut::<T>();
        let entry = storage.entries.remove(handle.key())?;
        if let Some(path) = &entry.path {
            storage.by_path.remove(path);
        }
        Some(entry.asset)
    }

    /// Re-read an asset from its file
    ///
    /// On failure the previous version stays in place.
    pub fn reload<T: Asset>(&mut self, handle: AssetHandle<T>) -> Result<(), AssetError> {
        let storage = self.storage_mut::<T>();
        let entry = storage.entries.get_mut(handle.key()).ok_or(AssetError::InvalidHandle)?;
        let path = entry.path.clone().ok_or(AssetError::NoSourceFile)?;
        entry.asset = read_asset::<T>(&path)?;
        entry.modified = modified_time(&path);
        Ok(())
    }

    /// Per-frame maintenance; returns how many assets were hot-reloaded
    pub fn update(&mut self) -> usize {
        if !self.hot_reload {
            return 0;
        }
        self.storages.values_mut().map(|s| s.reload_changed()).sum()
    }

    /// Number of live assets of type `T`
    pub fn len<T: Asset>(&self) -> usize {
        self.storage::<T>().map_or(0, |s| s.entries.len())
    }
}

fn check_extension<T: Asset>(path: &Path) -> Result<(), AssetError> {
    let accepted = T::extensions();
    if accepted.is_empty() {
        return Ok(());
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if accepted.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AssetError::UnsupportedFormat(path.display().to_string()))
    }
}

/// Raw text asset (shaders, scripts, data files)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAsset(pub String);

impl Asset for TextAsset {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        String::from_utf8(bytes.to_vec())
            .map(TextAsset)
            .map_err(|e| AssetError::InvalidData(e.to_string()))
    }
}
