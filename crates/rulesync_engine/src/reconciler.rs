//! The reconciler: materialize, reconcile, observe and retract a unit's
//! rules inside a shared remote rule list.

use crate::config::ReconcilerConfig;
use crate::credentials::{CredentialSource, Credentials, RequestContext};
use crate::error::{ReconcileError, ReconcileResult};
use crate::keyed_mutex::{KeyGuard, KeyedMutex};
use crate::remote::RemoteCollection;
use crate::store::SnapshotStore;
use parking_lot::RwLock;
use rulesync_model::multiset;
use rulesync_model::{ParentKey, Rule, Snapshot, UnitId};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One independently-managed subset of rules in a shared parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationUnit {
    /// Shared parent the unit contributes to.
    pub parent_key: ParentKey,
    /// Id addressing the unit's snapshot.
    pub unit_id: UnitId,
}

impl ConfigurationUnit {
    /// Creates a unit with a freshly generated id.
    pub fn new(parent_key: ParentKey) -> Self {
        Self {
            parent_key,
            unit_id: UnitId::generate(),
        }
    }

    /// Creates a unit with a caller-assigned id.
    pub fn with_id(parent_key: ParentKey, unit_id: UnitId) -> Self {
        Self {
            parent_key,
            unit_id,
        }
    }
}

/// The four lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// First application of a unit.
    Materialize,
    /// Update of a previously materialized unit.
    Reconcile,
    /// Read-only drift check.
    Observe,
    /// Removal of a unit's contribution.
    Retract,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Materialize => "materialize",
            Operation::Reconcile => "reconcile",
            Operation::Observe => "observe",
            Operation::Retract => "retract",
        };
        f.write_str(name)
    }
}

/// Result of a mutating operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Rules added to the remote list.
    pub added: usize,
    /// Rules removed from the remote list.
    pub removed: usize,
    /// Whether the remote list was written back.
    pub written: bool,
    /// Wall time of the operation, including lock wait.
    pub duration: Duration,
}

impl Outcome {
    /// Returns true if the remote list was left untouched.
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Result of [`Reconciler::observe`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Parent the unit's snapshot points at, if it has one.
    pub parent_key: Option<ParentKey>,
    /// Snapshot rules still present remotely.
    pub owned: Vec<Rule>,
    /// Snapshot rules no longer present remotely (removed by someone else).
    pub missing: Vec<Rule>,
}

impl Observation {
    /// Returns true if some snapshot rules disappeared remotely.
    pub fn has_drift(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Counters over the reconciler's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ReconcilerStats {
    /// Successful materialize calls.
    pub materialized: u64,
    /// Successful reconcile calls.
    pub reconciled: u64,
    /// Successful observe calls.
    pub observed: u64,
    /// Successful retract calls.
    pub retracted: u64,
    /// Total rules added remotely.
    pub rules_added: u64,
    /// Total rules removed remotely.
    pub rules_removed: u64,
    /// Write-backs skipped because nothing changed.
    pub writes_skipped: u64,
    /// Failed operations of any kind.
    pub failures: u64,
    /// Last error message.
    pub last_error: Option<String>,
    /// Time of the last completed operation.
    pub last_operation_time: Option<Instant>,
}

/// Reconciles configuration units against shared remote rule lists.
///
/// Every operation on a parent key runs its fetch → merge → write-back
/// sequence while holding that key's lock. Operations on different keys
/// run fully in parallel. Locks are process-local.
pub struct Reconciler<R: RemoteCollection, S: SnapshotStore> {
    config: ReconcilerConfig,
    remote: Arc<R>,
    store: Arc<S>,
    credentials: Arc<dyn CredentialSource>,
    locks: Arc<KeyedMutex<ParentKey>>,
    stats: RwLock<ReconcilerStats>,
}

impl<R: RemoteCollection, S: SnapshotStore> Reconciler<R, S> {
    /// Creates a reconciler with its own lock registry.
    pub fn new(
        config: ReconcilerConfig,
        remote: Arc<R>,
        store: Arc<S>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let locks = Arc::new(KeyedMutex::new(config.lock_retention));
        Self {
            config,
            remote,
            store,
            credentials,
            locks,
            stats: RwLock::new(ReconcilerStats::default()),
        }
    }

    /// Shares a lock registry with other reconcilers in this process.
    pub fn with_lock_registry(mut self, locks: Arc<KeyedMutex<ParentKey>>) -> Self {
        self.locks = locks;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Returns the remote collaborator.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Returns the snapshot store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the lock registry.
    pub fn lock_registry(&self) -> &Arc<KeyedMutex<ParentKey>> {
        &self.locks
    }

    /// Gets the current stats.
    pub fn stats(&self) -> ReconcilerStats {
        self.stats.read().clone()
    }

    /// Applies `desired` to the unit's parent for the first time.
    ///
    /// Adds every desired rule the remote list does not already hold, then
    /// records `desired` as the unit's snapshot. If the write-back fails
    /// nothing is recorded. A unit whose snapshot still owns rules is
    /// rejected with [`ReconcileError::InvalidRequest`].
    pub fn materialize(
        &self,
        unit: &ConfigurationUnit,
        desired: &[Rule],
    ) -> ReconcileResult<Outcome> {
        self.track(Operation::Materialize, || {
            let start = Instant::now();
            let desired = multiset::dedup(desired);
            debug!(parent_key = %unit.parent_key, unit_id = %unit.unit_id, rules = desired.len(), "materializing unit");

            let credentials = self.resolve_credentials()?;
            let state = encode(&unit.unit_id, &unit.parent_key, &desired)?;

            let _guard = self.lock(&unit.parent_key);
            if let Some(prior) = self.load_snapshot(&unit.unit_id)? {
                if !prior.rules.is_empty() {
                    return Err(ReconcileError::InvalidRequest(format!(
                        "unit {} already owns {} rule(s) in {}; reconcile or retract it instead",
                        unit.unit_id,
                        prior.rules.len(),
                        prior.parent_key
                    )));
                }
            }
            let ctx = self.request_context(credentials);
            let mut rules = self.fetch(&ctx, &unit.parent_key)?;
            let added = multiset::union_into(&mut rules, &desired);
            let written = self.write_back(&ctx, &unit.parent_key, &rules, added > 0)?;
            self.save_snapshot(&unit.unit_id, &state)?;

            info!(parent_key = %unit.parent_key, unit_id = %unit.unit_id, added, written, "materialized unit");
            Ok(Outcome {
                added,
                removed: 0,
                written,
                duration: start.elapsed(),
            })
        })
    }

    /// Moves the unit from its previous snapshot to `desired`.
    ///
    /// Rules the unit used to own but no longer wants are removed (one
    /// remote occurrence each); desired rules missing remotely are added.
    /// A unit with no snapshot behaves like [`Reconciler::materialize`].
    pub fn reconcile(
        &self,
        unit: &ConfigurationUnit,
        desired: &[Rule],
    ) -> ReconcileResult<Outcome> {
        self.track(Operation::Reconcile, || {
            let start = Instant::now();
            let desired = multiset::dedup(desired);
            debug!(parent_key = %unit.parent_key, unit_id = %unit.unit_id, rules = desired.len(), "reconciling unit");

            let credentials = self.resolve_credentials()?;
            let state = encode(&unit.unit_id, &unit.parent_key, &desired)?;

            let _guard = self.lock(&unit.parent_key);
            let prior = match self.load_snapshot(&unit.unit_id)? {
                Some(snapshot) if snapshot.parent_key != unit.parent_key => {
                    return Err(ReconcileError::InvalidRequest(format!(
                        "unit {} belongs to {}, not {}",
                        unit.unit_id, snapshot.parent_key, unit.parent_key
                    )));
                }
                Some(snapshot) => snapshot.rules,
                None => Vec::new(),
            };
            let to_remove = multiset::difference(&prior, &desired);

            let ctx = self.request_context(credentials);
            let mut rules = self.fetch(&ctx, &unit.parent_key)?;
            let removed = multiset::remove_each(&mut rules, &to_remove);
            let added = multiset::union_into(&mut rules, &desired);
            let written =
                self.write_back(&ctx, &unit.parent_key, &rules, added > 0 || removed > 0)?;
            self.save_snapshot(&unit.unit_id, &state)?;

            info!(parent_key = %unit.parent_key, unit_id = %unit.unit_id, added, removed, written, "reconciled unit");
            Ok(Outcome {
                added,
                removed,
                written,
                duration: start.elapsed(),
            })
        })
    }

    /// Reports which of the unit's snapshot rules are still present
    /// remotely. Never writes anything.
    ///
    /// Rules removed by someone else drop out of `owned` and show up in
    /// `missing`; that is drift, not an error.
    pub fn observe(&self, unit_id: &UnitId) -> ReconcileResult<Observation> {
        self.track(Operation::Observe, || {
            debug!(unit_id = %unit_id, "observing unit");
            let credentials = self.resolve_credentials()?;
            let Some(snapshot) = self.load_snapshot(unit_id)? else {
                debug!(unit_id = %unit_id, "unit has no snapshot");
                return Ok(Observation::default());
            };

            let rules = {
                let _guard = self.lock(&snapshot.parent_key);
                let ctx = self.request_context(credentials);
                self.fetch(&ctx, &snapshot.parent_key)?
            };
            let owned = multiset::intersection(&snapshot.rules, &rules);
            let missing = multiset::difference(&snapshot.rules, &rules);
            if !missing.is_empty() {
                info!(parent_key = %snapshot.parent_key, unit_id = %unit_id, missing = missing.len(), "unit rules missing remotely");
            }
            Ok(Observation {
                parent_key: Some(snapshot.parent_key),
                owned,
                missing,
            })
        })
    }

    /// Removes every rule of the unit's snapshot from its parent (one
    /// remote occurrence each) and clears the snapshot. A unit without a
    /// snapshot is left untouched.
    pub fn retract(&self, unit_id: &UnitId) -> ReconcileResult<Outcome> {
        self.track(Operation::Retract, || {
            let start = Instant::now();
            debug!(unit_id = %unit_id, "retracting unit");
            let credentials = self.resolve_credentials()?;
            let Some(snapshot) = self.load_snapshot(unit_id)? else {
                debug!(unit_id = %unit_id, "unit has no snapshot; nothing to retract");
                return Ok(Outcome {
                    duration: start.elapsed(),
                    ..Outcome::default()
                });
            };

            let _guard = self.lock(&snapshot.parent_key);
            let ctx = self.request_context(credentials);
            let mut rules = self.fetch(&ctx, &snapshot.parent_key)?;
            let removed = multiset::remove_each(&mut rules, &snapshot.rules);
            let written = self.write_back(&ctx, &snapshot.parent_key, &rules, removed > 0)?;
            self.clear_snapshot(unit_id)?;

            info!(parent_key = %snapshot.parent_key, unit_id = %unit_id, removed, written, "retracted unit");
            Ok(Outcome {
                added: 0,
                removed,
                written,
                duration: start.elapsed(),
            })
        })
    }

    /// Runs an operation, recording stats and logging failures.
    fn track<T: Tally>(
        &self,
        operation: Operation,
        run: impl FnOnce() -> ReconcileResult<T>,
    ) -> ReconcileResult<T> {
        let result = run();
        let mut stats = self.stats.write();
        stats.last_operation_time = Some(Instant::now());
        match &result {
            Ok(value) => {
                match operation {
                    Operation::Materialize => stats.materialized += 1,
                    Operation::Reconcile => stats.reconciled += 1,
                    Operation::Observe => stats.observed += 1,
                    Operation::Retract => stats.retracted += 1,
                }
                value.tally(&mut stats, self.config.skip_unchanged_writes);
            }
            Err(e) => {
                warn!(%operation, phase = %e.phase(), error = %e, "operation failed");
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
            }
        }
        result
    }

    fn resolve_credentials(&self) -> ReconcileResult<Credentials> {
        self.credentials
            .resolve()
            .map_err(ReconcileError::Credential)
    }

    /// Starts the collaborator deadline. Called once the parent's lock is
    /// held, so time spent queued on the lock does not count against it.
    fn request_context(&self, credentials: Credentials) -> RequestContext {
        RequestContext::new(credentials).with_timeout(self.config.request_timeout)
    }

    fn lock(&self, parent: &ParentKey) -> KeyGuard<'_, ParentKey> {
        self.locks.acquire(parent)
    }

    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> ReconcileResult<Vec<Rule>> {
        self.remote
            .fetch(ctx, parent)
            .map_err(|source| ReconcileError::Retrieval {
                parent_key: parent.clone(),
                source,
            })
    }

    fn write_back(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
        changed: bool,
    ) -> ReconcileResult<bool> {
        if !changed && self.config.skip_unchanged_writes {
            debug!(parent_key = %parent, "no delta; skipping write-back");
            return Ok(false);
        }
        self.remote
            .replace(ctx, parent, rules)
            .map_err(|source| ReconcileError::Write {
                parent_key: parent.clone(),
                source,
            })?;
        Ok(true)
    }

    fn load_snapshot(&self, unit_id: &UnitId) -> ReconcileResult<Option<Snapshot>> {
        let state = self
            .store
            .load(unit_id)
            .map_err(|source| ReconcileError::SnapshotLoad {
                unit_id: unit_id.clone(),
                source,
            })?;
        match state {
            Some(state) => {
                Snapshot::from_json(&state).map_err(|source| ReconcileError::SnapshotCodec {
                    unit_id: unit_id.clone(),
                    source,
                })
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, unit_id: &UnitId, state: &str) -> ReconcileResult<()> {
        self.store
            .save(unit_id, state)
            .map_err(|source| ReconcileError::SnapshotPersist {
                unit_id: unit_id.clone(),
                source,
            })
    }

    fn clear_snapshot(&self, unit_id: &UnitId) -> ReconcileResult<()> {
        self.store
            .clear(unit_id)
            .map_err(|source| ReconcileError::SnapshotPersist {
                unit_id: unit_id.clone(),
                source,
            })
    }
}

/// Encodes the snapshot up front so a codec failure aborts before any
/// remote mutation.
fn encode(unit_id: &UnitId, parent: &ParentKey, rules: &[Rule]) -> ReconcileResult<String> {
    Snapshot::new(parent.clone(), rules.to_vec())
        .to_json()
        .map_err(|source| ReconcileError::SnapshotCodec {
            unit_id: unit_id.clone(),
            source,
        })
}

/// Folds an operation's result into the stats.
trait Tally {
    fn tally(&self, stats: &mut ReconcilerStats, skip_unchanged: bool);
}

impl Tally for Outcome {
    fn tally(&self, stats: &mut ReconcilerStats, skip_unchanged: bool) {
        stats.rules_added += self.added as u64;
        stats.rules_removed += self.removed as u64;
        if skip_unchanged && !self.written {
            stats.writes_skipped += 1;
        }
    }
}

impl Tally for Observation {
    fn tally(&self, _stats: &mut ReconcilerStats, _skip_unchanged: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockRetention;
    use crate::credentials::{Credentials, StaticCredentials};
    use crate::error::{CollaboratorError, Phase};
    use crate::remote::MemoryRemoteCollection;
    use crate::store::MemorySnapshotStore;
    use rulesync_model::multiset::set_eq;

    type TestReconciler = Reconciler<MemoryRemoteCollection, MemorySnapshotStore>;

    fn parent() -> ParentKey {
        ParentKey::new("tag-1").unwrap()
    }

    fn unit(id: &str) -> ConfigurationUnit {
        ConfigurationUnit::with_id(parent(), UnitId::new(id).unwrap())
    }

    fn x() -> Rule {
        Rule::new("X", true)
    }

    fn y() -> Rule {
        Rule::new("Y", false)
    }

    fn reconciler() -> TestReconciler {
        let remote = Arc::new(MemoryRemoteCollection::new());
        remote.insert_parent(parent(), Vec::new());
        Reconciler::new(
            ReconcilerConfig::new().with_lock_retention(LockRetention::Retain),
            remote,
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(StaticCredentials::new(Credentials::new("token"))),
        )
    }

    fn remote_rules(r: &TestReconciler) -> Vec<Rule> {
        r.remote().rules(&parent()).unwrap()
    }

    #[test]
    fn materialize_adds_and_records() {
        let r = reconciler();
        let outcome = r.materialize(&unit("a"), &[x()]).unwrap();
        assert_eq!(outcome.added, 1);
        assert!(outcome.written);
        assert_eq!(remote_rules(&r), vec![x()]);

        let state = r.store().state(&UnitId::new("a").unwrap()).unwrap();
        let snapshot = Snapshot::from_json(&state).unwrap().unwrap();
        assert_eq!(snapshot.parent_key, parent());
        assert_eq!(snapshot.rules, vec![x()]);
    }

    #[test]
    fn materialize_collapses_duplicates() {
        let r = reconciler();
        r.remote().insert_parent(parent(), vec![x()]);
        let outcome = r.materialize(&unit("a"), &[x(), x(), y()]).unwrap();
        assert_eq!(outcome.added, 1);
        assert!(set_eq(&remote_rules(&r), &[x(), y()]));
    }

    #[test]
    fn reconcile_removes_dropped_rules_only() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        r.materialize(&unit("b"), &[y()]).unwrap();

        let outcome = r.reconcile(&unit("a"), &[]).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(remote_rules(&r), vec![y()]);
    }

    #[test]
    fn second_reconcile_is_a_noop() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        r.reconcile(&unit("a"), &[y()]).unwrap();
        let before = remote_rules(&r);
        let writes = r.remote().replace_count();

        let outcome = r.reconcile(&unit("a"), &[y()]).unwrap();
        assert!(outcome.is_noop());
        assert!(!outcome.written);
        assert_eq!(r.remote().replace_count(), writes);
        assert!(set_eq(&remote_rules(&r), &before));
        assert_eq!(r.stats().writes_skipped, 1);
    }

    #[test]
    fn reconcile_rejects_parent_change() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        let other = ParentKey::new("tag-2").unwrap();
        let moved = ConfigurationUnit::with_id(other, UnitId::new("a").unwrap());
        let err = r.reconcile(&moved, &[x()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Validation);
        assert!(!r.lock_registry().is_locked(&parent()));
    }

    #[test]
    fn observe_reports_drift() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x(), y()]).unwrap();
        r.remote()
            .modify_externally(&parent(), |rules| rules.retain(|rule| *rule != y()));

        let observation = r.observe(&UnitId::new("a").unwrap()).unwrap();
        assert_eq!(observation.owned, vec![x()]);
        assert_eq!(observation.missing, vec![y()]);
        assert!(observation.has_drift());
    }

    #[test]
    fn observe_unknown_unit_is_empty() {
        let r = reconciler();
        let observation = r.observe(&UnitId::new("nobody").unwrap()).unwrap();
        assert_eq!(observation, Observation::default());
        assert_eq!(r.remote().fetch_count(), 0);
    }

    #[test]
    fn retract_removes_and_clears() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        r.materialize(&unit("b"), &[y()]).unwrap();

        let outcome = r.retract(&UnitId::new("a").unwrap()).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(remote_rules(&r), vec![y()]);
        assert_eq!(r.store().state(&UnitId::new("a").unwrap()).as_deref(), Some(""));

        let observation = r.observe(&UnitId::new("a").unwrap()).unwrap();
        assert!(observation.owned.is_empty());
    }

    #[test]
    fn write_failure_leaves_no_snapshot() {
        let r = reconciler();
        r.remote()
            .fail_next_replace(CollaboratorError::retryable("503 service unavailable"));
        let err = r.materialize(&unit("a"), &[x()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Write);
        assert!(err.is_retryable());
        assert!(remote_rules(&r).is_empty());
        assert!(r.store().state(&UnitId::new("a").unwrap()).is_none());
        assert!(!r.lock_registry().is_locked(&parent()));
        assert_eq!(r.stats().failures, 1);
    }

    #[test]
    fn snapshot_failure_is_reported_as_divergence() {
        let r = reconciler();
        r.store().fail_next_save(CollaboratorError::fatal("disk full"));
        let err = r.materialize(&unit("a"), &[x()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Snapshot);
        assert!(err.may_have_diverged());
        // the remote write already happened
        assert_eq!(remote_rules(&r), vec![x()]);
    }

    #[test]
    fn credential_failure_happens_before_locking() {
        struct NoCredentials;
        impl CredentialSource for NoCredentials {
            fn resolve(&self) -> crate::error::CollaboratorResult<Credentials> {
                Err(CollaboratorError::fatal("token expired"))
            }
        }

        let remote = Arc::new(MemoryRemoteCollection::new());
        remote.insert_parent(parent(), Vec::new());
        let r = Reconciler::new(
            ReconcilerConfig::default(),
            remote,
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(NoCredentials),
        );
        let err = r.materialize(&unit("a"), &[x()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Credential);
        assert_eq!(r.remote().fetch_count(), 0);
        assert!(r.lock_registry().is_empty());
    }

    #[test]
    fn corrupt_snapshot_aborts_before_fetch() {
        let r = reconciler();
        r.store().set_state(&UnitId::new("a").unwrap(), "{oops");
        let err = r.reconcile(&unit("a"), &[x()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Snapshot);
        assert!(!err.may_have_diverged());
        assert_eq!(r.remote().fetch_count(), 0);
    }

    #[test]
    fn retract_without_snapshot_is_noop() {
        let r = reconciler();
        let outcome = r.retract(&UnitId::new("ghost").unwrap()).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(r.remote().fetch_count(), 0);
        assert!(r.store().state(&UnitId::new("ghost").unwrap()).is_none());
    }

    #[test]
    fn materialize_over_owned_snapshot_is_rejected() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        let writes = r.remote().replace_count();

        let err = r.materialize(&unit("a"), &[y()]).unwrap_err();
        assert_eq!(err.phase(), Phase::Validation);
        assert_eq!(r.remote().replace_count(), writes);
        assert!(!r.lock_registry().is_locked(&parent()));

        // the first rule set is still tracked and fully retractable
        r.retract(&UnitId::new("a").unwrap()).unwrap();
        assert!(remote_rules(&r).is_empty());
    }

    #[test]
    fn materialize_after_retract_is_allowed() {
        let r = reconciler();
        r.materialize(&unit("a"), &[x()]).unwrap();
        r.retract(&UnitId::new("a").unwrap()).unwrap();

        let outcome = r.materialize(&unit("a"), &[y()]).unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(remote_rules(&r), vec![y()]);
    }

    #[test]
    fn materialize_over_empty_snapshot_is_allowed() {
        let r = reconciler();
        r.materialize(&unit("a"), &[]).unwrap();
        r.materialize(&unit("a"), &[x()]).unwrap();
        assert_eq!(remote_rules(&r), vec![x()]);
    }
}
