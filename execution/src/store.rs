//! Local key-value persistence for the profile and daily limits.
//!
//! Values are JSON strings. [`FileStore`] keeps one `<key>.json` file per key
//! under the platform data directory.

use arcade_types::{GameLimits, Profile, LIMITS_KEY, PROFILE_KEY};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no data directory available")]
    NoDataDir,
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory of JSON files, one per key.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory.
    pub fn default_location() -> Result<Self, StoreError> {
        ProjectDirs::from("dev", "arcade", "arcade")
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key)(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_error(key))?;
        fs::write(self.path(key), value).map_err(io_error(key))?;
        debug!(key, dir = %self.dir.display(), "stored");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(io_error(key)(err)),
            _ => Ok(()),
        }
    }
}

pub fn load_json<T: DeserializeOwned, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Json {
            key: key.to_string(),
            source,
        })
}

pub fn save_json<T: Serialize, S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Json {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Load the profile; `None` until onboarding has saved one.
pub fn load_profile<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<Profile>, StoreError> {
    let profile: Option<Profile> = load_json(store, PROFILE_KEY)?;
    if let Some(profile) = &profile {
        if let Err(err) = profile.validate_invariants() {
            warn!(%err, "stored profile violates invariants");
        }
    }
    Ok(profile)
}

pub fn save_profile<S: KeyValueStore + ?Sized>(
    store: &mut S,
    profile: &Profile,
) -> Result<(), StoreError> {
    save_json(store, PROFILE_KEY, profile)
}

/// Load today's limits. Missing or stale blobs yield fresh counters.
pub fn load_limits<S: KeyValueStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<GameLimits, StoreError> {
    let mut limits = load_json(store, LIMITS_KEY)?.unwrap_or_else(|| GameLimits::fresh(today));
    limits.roll_over(today);
    Ok(limits)
}

pub fn save_limits<S: KeyValueStore + ?Sized>(
    store: &mut S,
    limits: &GameLimits,
) -> Result<(), StoreError> {
    save_json(store, LIMITS_KEY, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::GameId;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).expect("valid date")
    }

    #[test]
    fn test_memory_store_profile() {
        let mut store = MemoryStore::new();
        assert_eq!(load_profile(&store).expect("load"), None);

        let mut profile = Profile::new("Awa".to_string()).expect("valid name");
        profile.balance = 42;
        save_profile(&mut store, &profile).expect("save");
        assert_eq!(
            store.get(PROFILE_KEY).expect("get").as_deref(),
            Some(r#"{"name":"Awa","balance":42,"setupComplete":true}"#)
        );
        assert_eq!(load_profile(&store).expect("load"), Some(profile));

        store.remove(PROFILE_KEY).expect("remove");
        assert_eq!(load_profile(&store).expect("load"), None);
    }

    #[test]
    fn test_limits_reset_on_new_day() {
        let mut store = MemoryStore::new();
        let mut limits = GameLimits::fresh(day(15));
        limits.increment_rounds(GameId::Balloon);
        save_limits(&mut store, &limits).expect("save");

        assert_eq!(load_limits(&store, day(15)).expect("load"), limits);
        assert_eq!(
            load_limits(&store, day(16)).expect("load"),
            GameLimits::fresh(day(16))
        );
    }

    #[test]
    fn test_malformed_value() {
        let mut store = MemoryStore::new();
        store.set(LIMITS_KEY, "{not json").expect("set");
        assert!(matches!(
            load_limits(&store, day(16)),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get(PROFILE_KEY).expect("get"), None);
        store.remove(PROFILE_KEY).expect("remove missing");

        let profile = Profile::new("Ngaio".to_string()).expect("valid name");
        save_profile(&mut store, &profile).expect("save");
        assert!(store.dir().join("user_data.json").exists());

        let reopened = FileStore::new(store.dir());
        assert_eq!(load_profile(&reopened).expect("load"), Some(profile));
    }
}
