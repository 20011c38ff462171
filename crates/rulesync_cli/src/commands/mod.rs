//! CLI command implementations.

pub mod apply;
pub mod observe;
pub mod parent;
pub mod show;

use clap::ValueEnum;
use rulesync_engine::{
    CollaboratorError, CredentialSource, Credentials, DirRemoteCollection, EnvCredentials,
    FileSnapshotStore, ReconcileError, Reconciler, ReconcilerConfig, RequestContext,
    StaticCredentials,
};
use rulesync_model::{ModelError, Rule};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "RULESYNC_API_TOKEN";

/// Environment variable holding the API endpoint.
pub const ENDPOINT_VAR: &str = "RULESYNC_API_ENDPOINT";

/// Token used when no token variable is set; the local remote ignores it.
const LOCAL_TOKEN: &str = "local";

/// Reconciler over the local state directory.
pub type LocalReconciler = Reconciler<DirRemoteCollection, FileSnapshotStore>;

/// Errors reported by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// No state directory was given.
    #[error("state directory required (use --state-dir or RULESYNC_STATE_DIR)")]
    MissingStateDir,

    /// The rules file could not be read.
    #[error("cannot read rules file {path:?}: {source}")]
    ReadRules {
        /// Path of the rules file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The rules file is not a JSON array of rules.
    #[error("invalid rules file {path:?}: {source}")]
    ParseRules {
        /// Path of the rules file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid identifier on the command line.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Local state could not be opened or read.
    #[error(transparent)]
    State(#[from] CollaboratorError),

    /// A reconciler operation failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Output could not be encoded.
    #[error("cannot encode output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Output format for read commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Local stand-ins for the remote API and the snapshot store.
pub struct LocalState {
    reconciler: LocalReconciler,
    credentials: Arc<dyn CredentialSource>,
}

impl LocalState {
    /// Opens (creating if needed) the state directory.
    pub fn open(state_dir: &Path) -> Result<Self, CliError> {
        let remote = DirRemoteCollection::open(state_dir.join("remote"))?;
        let store = FileSnapshotStore::open(state_dir.join("snapshots"))?;
        let credentials = credential_source();
        let reconciler = Reconciler::new(
            ReconcilerConfig::default(),
            Arc::new(remote),
            Arc::new(store),
            Arc::clone(&credentials),
        );
        Ok(Self {
            reconciler,
            credentials,
        })
    }

    /// Returns the reconciler.
    pub fn reconciler(&self) -> &LocalReconciler {
        &self.reconciler
    }

    /// Returns the directory-backed remote.
    pub fn remote(&self) -> &DirRemoteCollection {
        self.reconciler.remote()
    }

    /// Builds a request context for direct remote reads.
    pub fn request_context(&self) -> Result<RequestContext, CliError> {
        let credentials = self.credentials.resolve()?;
        Ok(RequestContext::new(credentials)
            .with_timeout(self.reconciler.config().request_timeout))
    }
}

/// Reads the token from the environment when set, otherwise uses a fixed
/// local token.
fn credential_source() -> Arc<dyn CredentialSource> {
    if std::env::var_os(TOKEN_VAR).is_some() {
        Arc::new(EnvCredentials::new(TOKEN_VAR).with_endpoint_var(ENDPOINT_VAR))
    } else {
        Arc::new(StaticCredentials::new(Credentials::new(LOCAL_TOKEN)))
    }
}

/// Reads a JSON array of rules.
pub fn read_rules(path: &Path) -> Result<Vec<Rule>, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadRules {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseRules {
        path: path.to_path_buf(),
        source,
    })
}

/// One-line summary of a rule.
pub fn describe(rule: &Rule) -> String {
    let state = if rule.enabled { "enabled" } else { "disabled" };
    let mut line = format!("{} ({state})", rule.kind);
    if let Some(attr) = &rule.attribute_rule {
        let conditions = attr.conditions.as_ref().map_or(0, Vec::len);
        line.push_str(&format!(" on {} with {conditions} condition(s)", attr.entity_type));
    }
    if let Some(selector) = &rule.entity_selector {
        line.push_str(&format!(" selector {selector:?}"));
    }
    if let Some(format) = &rule.value_format {
        line.push_str(&format!(" -> {format:?}"));
    }
    line
}
