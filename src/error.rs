//! Reconciliation error taxonomy.
//!
//! Every variant except `Tabular` and `Fatal` is recoverable: the failing row
//! or rule is recorded in the run report and processing moves on.

use thiserror::Error;

use crate::load_balancer::types::ApiError;

/// What kind of resource a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Listener,
    TargetGroup,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Listener => f.write_str("listener"),
            ResourceKind::TargetGroup => f.write_str("target group"),
        }
    }
}

/// Errors raised while reconciling rules.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad or missing field, unresolvable condition or action.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown listener port or target group name.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    /// Eviction could not bring the listener below its rule ceiling.
    #[error("listener {listener} holds {count} rules, ceiling is {max}")]
    CapacityExceeded { listener: String, count: usize, max: usize },

    /// The control plane rejected a rule creation.
    #[error("failed to create rule at priority {priority} on {listener}: {message}")]
    Submission {
        listener: String,
        priority: u32,
        message: String,
    },

    /// Control-plane call failed outside of rule submission.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The tabular source or sink could not be used at all.
    #[error("tabular error: {0}")]
    Tabular(String),

    /// Unrecoverable precondition; the run stops before mutating anything.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<csv::Error> for SyncError {
    fn from(e: csv::Error) -> Self {
        SyncError::Tabular(e.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
