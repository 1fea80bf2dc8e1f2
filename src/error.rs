//! Error hierarchy for dispatch.
//!
//! Controllers and filters return [`ControllerError`]. The dispatcher wraps those in
//! [`DispatchError`] together with its own failure modes, and every `DispatchError` ends up as
//! either a 404 or a 500 response. [`BuildError`] is only produced while validating a
//! [`DispatcherBuilder`](crate::dispatcher::DispatcherBuilder).

use thiserror::Error;

use crate::router::RouterError;
use crate::server::TransformError;

// ============================================================================
// Controller errors (returned by actions and filters)
// ============================================================================

/// Errors raised by controller actions and filters.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The requested entity does not exist; rendered by the not-found handler.
    #[error("{0}")]
    NotFound(String),

    /// A concurrent write clashed with this one. The dispatcher retries the action.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Failure(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ControllerError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict(reason.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// Dispatch errors
// ============================================================================

/// Everything that can abort a dispatch after the route was resolved.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("controller `{0}` is not registered")]
    UnknownController(String),

    #[error("filter `{0}` is not registered")]
    UnknownFilter(String),

    /// The action kept reporting conflicts until the retry budget ran out.
    #[error("Deadlock detected")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl DispatchError {
    /// Whether this failure is rendered by the not-found handler rather than the server-error one.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Controller(err) if err.is_not_found())
    }

    /// Static code for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Controller(ControllerError::NotFound(_)) => "not_found",
            Self::Controller(ControllerError::Conflict(_)) => "conflict",
            Self::Controller(_) => "controller_failure",
            Self::UnknownController(_) => "unknown_controller",
            Self::UnknownFilter(_) => "unknown_filter",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Transform(_) => "transform",
        }
    }
}

// ============================================================================
// Startup validation errors
// ============================================================================

/// Configuration problems detected when the dispatcher is built.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("route `{method} {pattern}` targets unregistered controller `{controller}`")]
    UnknownRouteController {
        method: String,
        pattern: String,
        controller: String,
    },

    #[error("{role} handler controller `{controller}` is not registered")]
    UnknownHandlerController {
        role: &'static str,
        controller: String,
    },

    #[error("{role} handler `{controller}::{action}` is not an action of that controller")]
    UnknownHandlerAction {
        role: &'static str,
        controller: String,
        action: String,
    },

    #[error("controller `{controller}` declares unregistered filter `{filter}`")]
    UnknownFilter { controller: String, filter: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_controller_not_found_is_not_found() {
        assert!(DispatchError::from(ControllerError::not_found("gone")).is_not_found());
        assert!(!DispatchError::from(ControllerError::failure("boom")).is_not_found());
        assert!(!DispatchError::UnknownController("User".into()).is_not_found());
    }

    #[test]
    fn test_exhaustion_message_is_generic() {
        let err = DispatchError::RetriesExhausted { attempts: 20 };
        assert_eq!(err.to_string(), "Deadlock detected");
        assert_eq!(err.error_code(), "retries_exhausted");
    }

    #[test]
    fn test_messages_pass_through() {
        assert_eq!(ControllerError::not_found("no user 7").to_string(), "no user 7");
        let wrapped = DispatchError::from(ControllerError::failure("db down"));
        assert_eq!(wrapped.to_string(), "db down");
    }
}
