//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FleetHubError`] via `#[from]`. Adapters box their concrete errors into
//! the [`FleetHubError::Storage`] or [`FleetHubError::Collaborator`] variants.

use crate::id::AutomationId;

/// Boxed error coming from outside the domain (database, remote service, …).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum FleetHubError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("automation error: {0}")]
    Automation(#[from] AutomationError),

    /// An external collaborator (container runtime, playbook runner, …) failed.
    #[error("collaborator error: {0}")]
    Collaborator(#[source] BoxError),

    #[error("storage error: {0}")]
    Storage(#[source] BoxError),
}

impl FleetHubError {
    /// Wrap an arbitrary collaborator failure.
    #[must_use]
    pub fn collaborator(err: impl Into<BoxError>) -> Self {
        Self::Collaborator(err.into())
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name must be at least {min} characters long")]
    NameTooShort { min: usize },

    #[error("name must be at most {max} characters long")]
    NameTooLong { max: usize },

    #[error("an automation named {0:?} already exists")]
    DuplicateName(String),

    #[error("automation chain is missing")]
    MissingChain,

    #[error("automation chain is missing its trigger")]
    MissingTrigger,

    #[error("unsupported trigger kind")]
    UnsupportedTrigger,

    #[error("automation chain is missing its actions array")]
    MissingActions,

    #[error("automation chain must contain at least one action")]
    NoActions,

    #[error("action #{index} has an unsupported kind")]
    UnsupportedAction { index: usize },

    #[error("{kind} action requires at least one target")]
    EmptyTargets { kind: &'static str },

    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidCron { expression: String, reason: String },
}

/// A looked-up resource does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures of the automation engine itself (registration, execution).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutomationError {
    /// An action kind needs a collaborator that was not wired in.
    #[error("no {0} collaborator configured")]
    MissingCollaborator(&'static str),

    /// The definition exists but has no live component (disabled, or
    /// registration failed earlier).
    #[error("automation component not found: {0}")]
    ComponentNotFound(AutomationId),

    #[error("automation component {0} has been deregistered")]
    Deregistered(AutomationId),

    #[error("automation {id} failed: {}", failures.join("; "))]
    RunFailed {
        id: AutomationId,
        failures: Vec<String>,
    },
}
