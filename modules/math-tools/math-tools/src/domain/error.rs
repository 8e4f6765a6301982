//! Domain error types for the math tools dispatcher.

use math_tools_sdk::{ArgumentViolation, MathToolsError};
use thiserror::Error;

use crate::infra::remote::TransportError;

/// Domain-level errors for the dispatcher and intent mapper.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The operation name is not registered.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Arguments failed validation; nothing was sent.
    #[error("Invalid arguments for '{operation}' ({} violation(s))", .violations.len())]
    InvalidArguments {
        operation: &'static str,
        violations: Vec<ArgumentViolation>,
    },

    /// The server answered with an error message.
    #[error("Remote computation failed: {0}")]
    Remote(String),

    /// No usable answer could be obtained from the server.
    #[error("Remote server unavailable: {0}")]
    Unavailable(#[from] TransportError),

    /// An intent could not be turned into an operation call.
    #[error("Intent resolution failed: {0}")]
    IntentResolution(String),
}

impl DomainError {
    /// Creates an `UnknownOperation` error.
    #[must_use]
    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::UnknownOperation(name.into())
    }

    /// Creates an `IntentResolution` error.
    #[must_use]
    pub fn intent_resolution(reason: impl Into<String>) -> Self {
        Self::IntentResolution(reason.into())
    }

    /// Creates an `Unavailable` error for a reply that has the wrong shape.
    #[must_use]
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::Unavailable(TransportError::InvalidResponse {
            reason: reason.into(),
        })
    }
}

impl From<DomainError> for MathToolsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnknownOperation(name) => MathToolsError::UnknownOperation { name },
            DomainError::InvalidArguments {
                operation,
                violations,
            } => MathToolsError::InvalidArgument {
                operation: operation.to_owned(),
                violations,
            },
            DomainError::Remote(message) => MathToolsError::RemoteComputationError { message },
            DomainError::Unavailable(cause) => MathToolsError::RemoteUnavailable {
                cause: cause.to_string(),
            },
            DomainError::IntentResolution(reason) => {
                MathToolsError::IntentResolutionError { reason }
            }
        }
    }
}
