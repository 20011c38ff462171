//! Error types for the reconciliation engine.

use rulesync_model::{ModelError, ParentKey, UnitId};
use std::fmt;
use thiserror::Error;

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Error returned by a collaborator (remote client, snapshot store,
/// credential source).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CollaboratorError {
    /// Error message.
    pub message: String,
    /// Whether the caller may retry the whole operation.
    pub retryable: bool,
}

impl CollaboratorError {
    /// Creates a retryable error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates the error a collaborator reports when its deadline expired.
    pub fn deadline_exceeded() -> Self {
        Self::retryable("deadline exceeded")
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        let retryable = matches!(
            err.kind(),
            ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
        );
        Self {
            message: err.to_string(),
            retryable,
        }
    }
}

/// The phase of an operation in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Request validation, before any collaborator call.
    Validation,
    /// Credential resolution, before any lock is taken.
    Credential,
    /// Fetching the remote list or loading the prior snapshot.
    Retrieval,
    /// Writing the merged list back to the remote side.
    Write,
    /// Decoding, encoding or persisting the unit's snapshot.
    Snapshot,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validation => "validation",
            Phase::Credential => "credential",
            Phase::Retrieval => "retrieval",
            Phase::Write => "write",
            Phase::Snapshot => "snapshot",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a reconciliation operation.
///
/// Every variant aborts the operation; the per-key lock has been released
/// by the time the caller sees it.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The request was rejected before any remote call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Access context could not be resolved.
    #[error("credential resolution failed: {0}")]
    Credential(#[source] CollaboratorError),

    /// The shared parent's rule list could not be fetched.
    #[error("failed to fetch rules of {parent_key}: {source}")]
    Retrieval {
        /// Shared parent that was fetched.
        parent_key: ParentKey,
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },

    /// The unit's prior snapshot could not be loaded.
    #[error("failed to load snapshot of unit {unit_id}: {source}")]
    SnapshotLoad {
        /// Unit whose snapshot was loaded.
        unit_id: UnitId,
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },

    /// The merged list could not be written back. The remote list is left
    /// as it was fetched.
    #[error("failed to write rules of {parent_key}: {source}")]
    Write {
        /// Shared parent that was written.
        parent_key: ParentKey,
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },

    /// The unit's snapshot could not be encoded or decoded.
    #[error("snapshot of unit {unit_id} is unreadable: {source}")]
    SnapshotCodec {
        /// Unit whose snapshot was rejected.
        unit_id: UnitId,
        /// Underlying codec error.
        #[source]
        source: ModelError,
    },

    /// The unit's snapshot could not be saved or cleared after the remote
    /// write. Remote state and snapshot may now disagree.
    #[error("failed to persist snapshot of unit {unit_id}: {source}")]
    SnapshotPersist {
        /// Unit whose snapshot was persisted.
        unit_id: UnitId,
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },
}

impl ReconcileError {
    /// Returns the phase in which the operation failed.
    pub fn phase(&self) -> Phase {
        match self {
            ReconcileError::InvalidRequest(_) => Phase::Validation,
            ReconcileError::Credential(_) => Phase::Credential,
            ReconcileError::Retrieval { .. } | ReconcileError::SnapshotLoad { .. } => {
                Phase::Retrieval
            }
            ReconcileError::Write { .. } => Phase::Write,
            ReconcileError::SnapshotCodec { .. } | ReconcileError::SnapshotPersist { .. } => {
                Phase::Snapshot
            }
        }
    }

    /// Returns true if the remote list may no longer match the unit's
    /// stored snapshot.
    pub fn may_have_diverged(&self) -> bool {
        matches!(self, ReconcileError::SnapshotPersist { .. })
    }

    /// Returns true if the collaborator reported the failure as transient.
    ///
    /// The engine never retries; this is a hint for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Credential(source)
            | ReconcileError::Retrieval { source, .. }
            | ReconcileError::SnapshotLoad { source, .. }
            | ReconcileError::Write { source, .. }
            | ReconcileError::SnapshotPersist { source, .. } => source.retryable,
            ReconcileError::InvalidRequest(_) | ReconcileError::SnapshotCodec { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> ParentKey {
        ParentKey::new("tag-1").unwrap()
    }

    fn unit() -> UnitId {
        UnitId::new("unit-a").unwrap()
    }

    #[test]
    fn phases() {
        let err = ReconcileError::Credential(CollaboratorError::fatal("no token"));
        assert_eq!(err.phase(), Phase::Credential);

        let err = ReconcileError::SnapshotLoad {
            unit_id: unit(),
            source: CollaboratorError::fatal("io"),
        };
        assert_eq!(err.phase(), Phase::Retrieval);

        let err = ReconcileError::Write {
            parent_key: parent(),
            source: CollaboratorError::retryable("503"),
        };
        assert_eq!(err.phase(), Phase::Write);
        assert!(!err.may_have_diverged());

        let err = ReconcileError::SnapshotPersist {
            unit_id: unit(),
            source: CollaboratorError::fatal("disk full"),
        };
        assert_eq!(err.phase(), Phase::Snapshot);
        assert!(err.may_have_diverged());
    }

    #[test]
    fn retryable_errors() {
        assert!(ReconcileError::Retrieval {
            parent_key: parent(),
            source: CollaboratorError::retryable("connection reset"),
        }
        .is_retryable());
        assert!(!ReconcileError::Write {
            parent_key: parent(),
            source: CollaboratorError::fatal("400 bad request"),
        }
        .is_retryable());
        assert!(!ReconcileError::InvalidRequest("x".into()).is_retryable());
        assert!(CollaboratorError::deadline_exceeded().retryable);
    }

    #[test]
    fn error_display_names_the_target() {
        let err = ReconcileError::Retrieval {
            parent_key: parent(),
            source: CollaboratorError::fatal("not found"),
        };
        assert_eq!(err.to_string(), "failed to fetch rules of tag-1: not found");
        assert_eq!(Phase::Snapshot.to_string(), "snapshot");
    }

    #[test]
    fn io_errors_convert() {
        let err: CollaboratorError =
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk").into();
        assert!(err.retryable);
        let err: CollaboratorError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert!(!err.retryable);
    }
}
