//! Remote collection abstraction for shared rule lists.

use crate::credentials::RequestContext;
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::fs::{json_path, write_atomic};
use parking_lot::{Mutex, RwLock};
use rulesync_model::{ParentKey, Rule};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Client for the full element list of a shared parent object.
///
/// The remote side offers no incremental append/remove: `fetch` returns the
/// whole current list and `replace` overwrites it. `replace` is expected to
/// be failure-atomic. Implementations should honor `ctx.deadline`.
pub trait RemoteCollection: Send + Sync {
    /// Fetches the current rule list of `parent`.
    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> CollaboratorResult<Vec<Rule>>;

    /// Replaces the rule list of `parent`.
    fn replace(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
    ) -> CollaboratorResult<()>;
}

/// An in-memory remote collection for testing.
#[derive(Debug, Default)]
pub struct MemoryRemoteCollection {
    parents: RwLock<HashMap<ParentKey, Vec<Rule>>>,
    fail_fetch: Mutex<Option<CollaboratorError>>,
    fail_replace: Mutex<Option<CollaboratorError>>,
    fetches: AtomicU64,
    replaces: AtomicU64,
}

impl MemoryRemoteCollection {
    /// Creates an empty remote with no parents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or overwrites) a parent with the given rules.
    pub fn insert_parent(&self, parent: ParentKey, rules: Vec<Rule>) {
        self.parents.write().insert(parent, rules);
    }

    /// Returns the current rules of `parent`, bypassing failure injection.
    pub fn rules(&self, parent: &ParentKey) -> Option<Vec<Rule>> {
        self.parents.read().get(parent).cloned()
    }

    /// Edits a parent's rules directly, as an external actor would.
    pub fn modify_externally(&self, parent: &ParentKey, edit: impl FnOnce(&mut Vec<Rule>)) {
        if let Some(rules) = self.parents.write().get_mut(parent) {
            edit(rules);
        }
    }

    /// Makes the next `fetch` fail with `error`.
    pub fn fail_next_fetch(&self, error: CollaboratorError) {
        *self.fail_fetch.lock() = Some(error);
    }

    /// Makes the next `replace` fail with `error`.
    pub fn fail_next_replace(&self, error: CollaboratorError) {
        *self.fail_replace.lock() = Some(error);
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `replace` calls so far.
    pub fn replace_count(&self) -> u64 {
        self.replaces.load(Ordering::SeqCst)
    }
}

impl RemoteCollection for MemoryRemoteCollection {
    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> CollaboratorResult<Vec<Rule>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        ctx.check_deadline()?;
        if let Some(error) = self.fail_fetch.lock().take() {
            return Err(error);
        }
        self.rules(parent)
            .ok_or_else(|| CollaboratorError::fatal(format!("auto-tag {parent} not found")))
    }

    fn replace(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
    ) -> CollaboratorResult<()> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        ctx.check_deadline()?;
        if let Some(error) = self.fail_replace.lock().take() {
            return Err(error);
        }
        let mut parents = self.parents.write();
        let slot = parents
            .get_mut(parent)
            .ok_or_else(|| CollaboratorError::fatal(format!("auto-tag {parent} not found")))?;
        *slot = rules.to_vec();
        Ok(())
    }
}

/// A remote collection stored as one JSON file per parent in a directory.
///
/// Used by the command-line tool to stand in for the remote API.
#[derive(Debug, Clone)]
pub struct DirRemoteCollection {
    dir: PathBuf,
}

impl DirRemoteCollection {
    /// Opens (and creates if needed) a directory-backed remote.
    pub fn open(dir: impl AsRef<Path>) -> CollaboratorResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Creates a parent with an empty rule list if it does not exist.
    pub fn create_parent(&self, parent: &ParentKey) -> CollaboratorResult<()> {
        let path = self.path(parent)?;
        if !path.exists() {
            write_atomic(&path, b"[]")?;
        }
        Ok(())
    }

    fn path(&self, parent: &ParentKey) -> CollaboratorResult<PathBuf> {
        json_path(&self.dir, parent.as_str()).ok_or_else(|| {
            CollaboratorError::fatal(format!("parent key {parent:?} is not a valid file name"))
        })
    }
}

impl RemoteCollection for DirRemoteCollection {
    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> CollaboratorResult<Vec<Rule>> {
        ctx.check_deadline()?;
        let path = self.path(parent)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CollaboratorError::fatal(format!("auto-tag {parent} not found")));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|e| {
            CollaboratorError::fatal(format!("malformed rule list for {parent}: {e}"))
        })
    }

    fn replace(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
    ) -> CollaboratorResult<()> {
        ctx.check_deadline()?;
        let path = self.path(parent)?;
        if !path.exists() {
            return Err(CollaboratorError::fatal(format!("auto-tag {parent} not found")));
        }
        let json = serde_json::to_vec_pretty(rules)
            .map_err(|e| CollaboratorError::fatal(format!("cannot encode rules: {e}")))?;
        write_atomic(&path, &json)?;
        Ok(())
    }
}
