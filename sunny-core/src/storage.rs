//! Local key-value persistence and the single saved-place slot on top of it.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    error::{Outcome, WeatherError},
    model::Place,
};

/// Name of the preference file, without extension.
pub const PREFERENCES_NAME: &str = "sunny_weather";

/// Slot holding the saved place.
pub const PLACE_KEY: &str = "place";

/// String-to-string store. Implementations serialize their own writes.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get_string(&self, key: &str) -> Outcome<Option<String>>;
    fn put_string(&self, key: &str, value: String) -> Outcome<()>;
    fn contains(&self, key: &str) -> Outcome<bool>;
    fn remove(&self, key: &str) -> Outcome<()>;
}

/// Preferences kept in memory only.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Outcome<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put_string(&self, key: &str, value: String) -> Outcome<()> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn contains(&self, key: &str) -> Outcome<bool> {
        Ok(self.entries().contains_key(key))
    }

    fn remove(&self, key: &str) -> Outcome<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat TOML table, rewritten whole on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open `<dir>/<name>.toml`, starting empty if the file doesn't exist yet.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Outcome<Self> {
        let path = dir.as_ref().join(format!("{name}.toml"));

        let entries: BTreeMap<String, String> = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                WeatherError::storage(format!("failed to read {}: {e}", path.display()))
            })?;
            toml::from_str(&contents).map_err(|e| {
                WeatherError::storage(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened preferences");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Outcome<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WeatherError::storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let contents = toml::to_string(entries)
            .map_err(|e| WeatherError::storage(format!("failed to serialize preferences: {e}")))?;

        fs::write(&self.path, contents).map_err(|e| {
            WeatherError::storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for FilePreferences {
    fn get_string(&self, key: &str) -> Outcome<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put_string(&self, key: &str, value: String) -> Outcome<()> {
        let mut entries = self.entries();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn contains(&self, key: &str) -> Outcome<bool> {
        Ok(self.entries().contains_key(key))
    }

    fn remove(&self, key: &str) -> Outcome<()> {
        let mut entries = self.entries();
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut updated = entries.clone();
        updated.remove(key);
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }
}

/// Persistence adapter for the one saved place.
#[derive(Debug)]
pub struct PlaceDao<S> {
    store: S,
}

impl<S: KeyValueStore> PlaceDao<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Store `place` as JSON, replacing whatever was saved before.
    pub fn save_place(&self, place: &Place) -> Outcome<()> {
        let json = serde_json::to_string(place)
            .map_err(|e| WeatherError::storage(format!("failed to serialize place: {e}")))?;
        self.store.put_string(PLACE_KEY, json)
    }

    pub fn get_saved_place(&self) -> Outcome<Place> {
        let json = self.store.get_string(PLACE_KEY)?.ok_or(WeatherError::NotSaved)?;
        serde_json::from_str(&json)
            .map_err(|e| WeatherError::storage(format!("saved place is corrupt: {e}")))
    }

    pub fn is_place_saved(&self) -> Outcome<bool> {
        self.store.contains(PLACE_KEY)
    }

    pub fn clear_place(&self) -> Outcome<()> {
        self.store.remove(PLACE_KEY)
    }
}
