//! # Persistence
//!
//! Saves and restores a world through a small key/value store: the generation
//! parameters under one key and the player's edit overlay under another, both
//! as JSON. Procedural content is never stored; it is regenerated from the
//! parameters and the overlay is replayed on top.
//!
//! The backing store depends on the platform:
//!
//! - **Web**: the browser's `window.localStorage`
//! - **Native**: one file per key in a save directory
//!
//! Loading parses both entries before touching the world, so a damaged save
//! leaves the running world exactly as it was.

use std::collections::HashMap;
#[cfg(not(target_family = "wasm"))]
use std::path::PathBuf;

use log::info;
use thiserror::Error;

use super::voxels::{
    data_store::DataStore,
    params::{GenerationParams, ParamsError},
    world::World,
};

/// Storage key of the serialized generation parameters.
pub const PARAMS_KEY: &str = "minecraft_params";
/// Storage key of the serialized edit overlay.
pub const DATA_KEY: &str = "minecraft_data";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("no saved entry for \"{0}\"")]
    Missing(&'static str),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("saved parameters are invalid: {0}")]
    Params(#[from] ParamsError),
}

/// String key/value storage in the shape of the browser's `Storage` API.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Volatile storage, used by tests and as a fallback.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stores every key as `<directory>/<key>.json`.
#[cfg(not(target_family = "wasm"))]
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
}

#[cfg(not(target_family = "wasm"))]
impl FileStorage {
    /// The directory is created on the first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

#[cfg(not(target_family = "wasm"))]
impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistenceError::Storage(err.to_string())),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.directory)
            .and_then(|_| std::fs::write(self.path(key), value))
            .map_err(|err| PersistenceError::Storage(err.to_string()))
    }
}

/// The browser's `window.localStorage`.
#[cfg(target_family = "wasm")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_family = "wasm")]
impl LocalStorage {
    pub fn new() -> Result<Self, PersistenceError> {
        let storage = web_sys::window()
            .ok_or_else(|| PersistenceError::Storage("no window".to_owned()))?
            .local_storage()
            .map_err(|err| PersistenceError::Storage(format!("{err:?}")))?
            .ok_or_else(|| PersistenceError::Storage("localStorage is disabled".to_owned()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_family = "wasm")]
impl KeyValueStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.storage
            .get_item(key)
            .map_err(|err| PersistenceError::Storage(format!("{err:?}")))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| PersistenceError::Storage(format!("{err:?}")))
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        /// The platform's save slot.
        pub fn default_storage() -> Result<Box<dyn KeyValueStorage>, PersistenceError> {
            Ok(Box::new(LocalStorage::new()?))
        }
    } else {
        /// Directory the native build saves into, relative to the working directory.
        pub const SAVE_DIRECTORY: &str = "saves";

        /// The platform's save slot.
        pub fn default_storage() -> Result<Box<dyn KeyValueStorage>, PersistenceError> {
            Ok(Box::new(FileStorage::new(SAVE_DIRECTORY)))
        }
    }
}

/// Writes the world's parameters and edit overlay to `storage`.
pub fn save(world: &World, storage: &mut dyn KeyValueStorage) -> Result<(), PersistenceError> {
    let params = serde_json::to_string(&*world.params())?;
    let data = serde_json::to_string(&*world.data_store())?;

    storage.set_item(PARAMS_KEY, &params)?;
    storage.set_item(DATA_KEY, &data)?;

    info!("Saved world with {} player edits", world.data_store().len());
    Ok(())
}

/// Replaces the world's parameters and edit overlay with the saved ones and
/// regenerates it.
///
/// # Returns
/// Any storage, parse or validation error. The world is only touched once
/// both entries have been read and parsed.
pub fn load(world: &mut World, storage: &dyn KeyValueStorage) -> Result<(), PersistenceError> {
    let params = storage
        .get_item(PARAMS_KEY)?
        .ok_or(PersistenceError::Missing(PARAMS_KEY))?;
    let data = storage
        .get_item(DATA_KEY)?
        .ok_or(PersistenceError::Missing(DATA_KEY))?;

    let params: GenerationParams = serde_json::from_str(&params)?;
    let data_store: DataStore = serde_json::from_str(&data)?;
    let edits = data_store.len();

    world.restore(params, data_store)?;

    info!("Loaded world with {} player edits", edits);
    Ok(())
}
