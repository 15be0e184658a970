//! Error handling for action execution.
//!
//! Every action returns [`ExecutionError`] on failure. Each variant has a
//! static code used for metric labels and in the JSON error body.

use crate::db::DbError;
use thiserror::Error;

/// Boxed cause attached to an execution failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while executing an action.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// A strategy failed; the cause is kept as the error source.
    #[error("{message}")]
    Execution {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Db(DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// Wrap a failure cause under a user-facing message.
    pub fn execution(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Execution {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "invalid_params",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::UnknownAction(_) => "unknown_action",
            Self::Conflict(_) => "conflict",
            Self::Execution { .. } => "execution",
            Self::Db(_) => "database",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<DbError> for ExecutionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ActivityNotFound(id) => Self::NotFound(format!("activity {id}")),
            DbError::GadgetNotFound(id) => Self::NotFound(format!("gadget {id}")),
            DbError::AccountExists(account) => {
                Self::Conflict(format!("account {account} already exists"))
            }
            DbError::GroupExists(name) => Self::Conflict(format!("group {name} already exists")),
            other => Self::Db(other),
        }
    }
}
