//! Snapshot persistence for configuration units.

use crate::error::{CollaboratorError, CollaboratorResult};
use crate::fs::{json_path, write_atomic};
use parking_lot::{Mutex, RwLock};
use rulesync_model::UnitId;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Stores each unit's serialized snapshot.
///
/// A unit id is driven by a single caller, so there are no concurrent
/// writers to the same id; last writer wins.
pub trait SnapshotStore: Send + Sync {
    /// Loads the stored state of `unit`. `None` if nothing was ever saved.
    fn load(&self, unit: &UnitId) -> CollaboratorResult<Option<String>>;

    /// Saves the state of `unit`.
    fn save(&self, unit: &UnitId, state: &str) -> CollaboratorResult<()>;

    /// Clears the state of `unit`. A cleared unit loads as empty state.
    fn clear(&self, unit: &UnitId) -> CollaboratorResult<()>;
}

/// An in-memory snapshot store for testing.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    states: RwLock<HashMap<UnitId, String>>,
    fail_load: Mutex<Option<CollaboratorError>>,
    fail_save: Mutex<Option<CollaboratorError>>,
    fail_clear: Mutex<Option<CollaboratorError>>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw stored state of `unit`.
    pub fn state(&self, unit: &UnitId) -> Option<String> {
        self.states.read().get(unit).cloned()
    }

    /// Overwrites the raw stored state of `unit`.
    pub fn set_state(&self, unit: &UnitId, state: impl Into<String>) {
        self.states.write().insert(unit.clone(), state.into());
    }

    /// Makes the next `load` fail with `error`.
    pub fn fail_next_load(&self, error: CollaboratorError) {
        *self.fail_load.lock() = Some(error);
    }

    /// Makes the next `save` fail with `error`.
    pub fn fail_next_save(&self, error: CollaboratorError) {
        *self.fail_save.lock() = Some(error);
    }

    /// Makes the next `clear` fail with `error`.
    pub fn fail_next_clear(&self, error: CollaboratorError) {
        *self.fail_clear.lock() = Some(error);
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, unit: &UnitId) -> CollaboratorResult<Option<String>> {
        if let Some(error) = self.fail_load.lock().take() {
            return Err(error);
        }
        Ok(self.state(unit))
    }

    fn save(&self, unit: &UnitId, state: &str) -> CollaboratorResult<()> {
        if let Some(error) = self.fail_save.lock().take() {
            return Err(error);
        }
        self.set_state(unit, state);
        Ok(())
    }

    fn clear(&self, unit: &UnitId) -> CollaboratorResult<()> {
        if let Some(error) = self.fail_clear.lock().take() {
            return Err(error);
        }
        self.set_state(unit, String::new());
        Ok(())
    }
}

/// A snapshot store keeping one JSON file per unit in a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    /// Opens (and creates if needed) a snapshot directory.
    pub fn open(dir: impl AsRef<Path>) -> CollaboratorResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the directory snapshots are kept in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, unit: &UnitId) -> CollaboratorResult<PathBuf> {
        json_path(&self.dir, unit.as_str()).ok_or_else(|| {
            CollaboratorError::fatal(format!("unit id {unit:?} is not a valid file name"))
        })
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, unit: &UnitId) -> CollaboratorResult<Option<String>> {
        match std::fs::read_to_string(self.path(unit)?) {
            Ok(state) => Ok(Some(state)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, unit: &UnitId, state: &str) -> CollaboratorResult<()> {
        write_atomic(&self.path(unit)?, state.as_bytes())?;
        Ok(())
    }

    fn clear(&self, unit: &UnitId) -> CollaboratorResult<()> {
        write_atomic(&self.path(unit)?, b"")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit() -> UnitId {
        UnitId::new("unit-a").unwrap()
    }

    #[test]
    fn memory_store_lifecycle() {
        let store = MemorySnapshotStore::new();
        assert_eq!(store.load(&unit()).unwrap(), None);

        store.save(&unit(), "{}").unwrap();
        assert_eq!(store.load(&unit()).unwrap().as_deref(), Some("{}"));

        store.clear(&unit()).unwrap();
        assert_eq!(store.load(&unit()).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn memory_store_injected_failure() {
        let store = MemorySnapshotStore::new();
        store.fail_next_save(CollaboratorError::fatal("disk full"));
        assert!(store.save(&unit(), "{}").is_err());
        assert!(store.save(&unit(), "{}").is_ok());
    }

    #[test]
    fn file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path().join("snapshots")).unwrap();
        assert_eq!(store.load(&unit()).unwrap(), None);

        store.save(&unit(), r#"{"parentKey":"tag-1","rules":[]}"#).unwrap();
        assert!(store.load(&unit()).unwrap().unwrap().contains("tag-1"));

        store.clear(&unit()).unwrap();
        assert_eq!(store.load(&unit()).unwrap().as_deref(), Some(""));
        assert!(store.dir().join("unit-a.json").exists());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn every_valid_unit_id_is_storable(id in "[A-Za-z0-9_-][A-Za-z0-9_.-]{0,24}") {
            let dir = tempfile::tempdir().unwrap();
            let store = FileSnapshotStore::open(dir.path()).unwrap();
            let unit = UnitId::new(id).unwrap();
            store.save(&unit, "{}").unwrap();
            let loaded = store.load(&unit).unwrap();
            prop_assert_eq!(loaded.as_deref(), Some("{}"));
        }
    }

    #[test]
    fn generated_unit_ids_are_storable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).unwrap();
        let unit = UnitId::generate();
        store.save(&unit, "{}").unwrap();
        assert!(store.load(&unit).unwrap().is_some());
    }
}
