//! Test fixtures and reconciler helpers.

use rulesync_engine::{
    ConfigurationUnit, Credentials, DirRemoteCollection, FileSnapshotStore, LockRetention,
    MemoryRemoteCollection, MemorySnapshotStore, Reconciler, ReconcilerConfig, RemoteCollection,
    StaticCredentials,
};
use rulesync_model::{ParentKey, Rule, UnitId};
use std::sync::Arc;
use tempfile::TempDir;

/// Shorthand for a parent key in tests.
pub fn parent(key: &str) -> ParentKey {
    ParentKey::new(key).expect("invalid parent key")
}

/// Shorthand for a unit id in tests.
pub fn unit_id(id: &str) -> UnitId {
    UnitId::new(id).expect("invalid unit id")
}

/// Shorthand for a configuration unit in tests.
pub fn unit(parent_key: &str, id: &str) -> ConfigurationUnit {
    ConfigurationUnit::with_id(parent(parent_key), unit_id(id))
}

/// Shorthand for a rule with no optional attributes.
pub fn rule(kind: &str, enabled: bool) -> Rule {
    Rule::new(kind, enabled)
}

/// Credentials used by every fixture.
pub fn test_credentials() -> Arc<StaticCredentials> {
    Arc::new(StaticCredentials::new(Credentials::new("test-token")))
}

/// A reconciler over any remote, with an in-memory snapshot store.
pub fn reconciler_over<R: RemoteCollection>(
    remote: Arc<R>,
) -> Reconciler<R, MemorySnapshotStore> {
    Reconciler::new(
        ReconcilerConfig::new().with_lock_retention(LockRetention::EvictIdle),
        remote,
        Arc::new(MemorySnapshotStore::new()),
        test_credentials(),
    )
}

/// A reconciler wired to in-memory collaborators.
pub struct MemorySetup {
    /// The reconciler under test.
    pub reconciler: Reconciler<MemoryRemoteCollection, MemorySnapshotStore>,
}

impl MemorySetup {
    /// Creates a setup whose remote holds the given parents, all empty.
    pub fn with_parents(parents: &[&str]) -> Self {
        let remote = Arc::new(MemoryRemoteCollection::new());
        for key in parents {
            remote.insert_parent(parent(key), Vec::new());
        }
        Self {
            reconciler: reconciler_over(remote),
        }
    }

    /// Shorthand for a unit on one of this setup's parents.
    pub fn unit(&self, parent_key: &str, id: &str) -> ConfigurationUnit {
        unit(parent_key, id)
    }

    /// Returns the remote rules of `parent_key`.
    pub fn remote_rules(&self, parent_key: &str) -> Vec<Rule> {
        self.reconciler
            .remote()
            .rules(&parent(parent_key))
            .unwrap_or_default()
    }

    /// Returns the in-memory remote.
    pub fn remote(&self) -> &MemoryRemoteCollection {
        self.reconciler.remote()
    }

    /// Returns the in-memory snapshot store.
    pub fn store(&self) -> &MemorySnapshotStore {
        self.reconciler.store()
    }
}

/// A reconciler wired to directory-backed collaborators in a temp dir.
pub struct DirSetup {
    /// The reconciler under test.
    pub reconciler: Reconciler<DirRemoteCollection, FileSnapshotStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl DirSetup {
    /// Creates a setup whose remote directory holds the given parents.
    pub fn with_parents(parents: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let remote = DirRemoteCollection::open(temp_dir.path().join("remote"))
            .expect("Failed to open remote directory");
        for key in parents {
            remote
                .create_parent(&parent(key))
                .expect("Failed to create parent");
        }
        let store = FileSnapshotStore::open(temp_dir.path().join("snapshots"))
            .expect("Failed to open snapshot directory");

        Self {
            reconciler: Reconciler::new(
                ReconcilerConfig::default(),
                Arc::new(remote),
                Arc::new(store),
                test_credentials(),
            ),
            _temp_dir: temp_dir,
        }
    }
}
