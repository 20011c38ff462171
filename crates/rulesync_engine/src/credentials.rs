//! Access context for remote calls.

use crate::error::{CollaboratorError, CollaboratorResult};
use std::fmt;
use std::time::{Duration, Instant};

/// Credentials for the remote management API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    endpoint: Option<String>,
}

impl Credentials {
    /// Creates credentials from an API token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: None,
        }
    }

    /// Sets the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the API endpoint, if one was configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Resolves the access context for an operation.
pub trait CredentialSource: Send + Sync {
    /// Returns credentials, or an error if none can be resolved.
    fn resolve(&self) -> CollaboratorResult<Credentials>;
}

/// A credential source that always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    /// Creates a static source.
    pub fn new(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialSource for StaticCredentials {
    fn resolve(&self) -> CollaboratorResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Reads the API token (and optionally the endpoint) from environment
/// variables at resolution time.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    token_var: String,
    endpoint_var: Option<String>,
}

impl EnvCredentials {
    /// Reads the token from `token_var`.
    pub fn new(token_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            endpoint_var: None,
        }
    }

    /// Also reads the endpoint from `endpoint_var`.
    pub fn with_endpoint_var(mut self, endpoint_var: impl Into<String>) -> Self {
        self.endpoint_var = Some(endpoint_var.into());
        self
    }
}

impl CredentialSource for EnvCredentials {
    fn resolve(&self) -> CollaboratorResult<Credentials> {
        let token = std::env::var(&self.token_var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CollaboratorError::fatal(format!("{} is not set", self.token_var))
            })?;
        let mut credentials = Credentials::new(token);
        if let Some(var) = &self.endpoint_var {
            if let Ok(endpoint) = std::env::var(var) {
                credentials = credentials.with_endpoint(endpoint);
            }
        }
        Ok(credentials)
    }
}

/// Per-operation context handed to the remote collaborator.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Resolved credentials.
    pub credentials: Credentials,
    /// Point in time after which the collaborator should give up.
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            deadline: None,
        }
    }

    /// Sets the deadline to `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Time left before the deadline. `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails with a deadline error if the deadline has passed.
    pub fn check_deadline(&self) -> CollaboratorResult<()> {
        if self.is_expired() {
            Err(CollaboratorError::deadline_exceeded())
        } else {
            Ok(())
        }
    }
}
