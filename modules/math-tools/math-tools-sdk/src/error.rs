//! Error types for the math tools dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a single argument was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required parameter was not supplied
    Missing,
    /// Value does not conform to the declared type
    WrongType,
    /// Value has the right type but fails the parameter constraint
    Constraint,
    /// Parameter is not declared by the operation
    Unexpected,
    /// Parameter was supplied under more than one spelling
    DuplicateAlias,
}

impl ViolationKind {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongType => "wrong_type",
            Self::Constraint => "constraint",
            Self::Unexpected => "unexpected",
            Self::DuplicateAlias => "duplicate_alias",
        }
    }
}

/// One rejected argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentViolation {
    pub parameter: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl ArgumentViolation {
    #[must_use]
    pub fn new(
        parameter: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ArgumentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameter, self.message)
    }
}

fn join_violations(violations: &[ArgumentViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by [`crate::MathToolsClient`].
///
/// A failed call never carries a partial or default result.
#[derive(Debug, Clone, Error)]
pub enum MathToolsError {
    /// The operation name is not in the registry.
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },

    /// One or more arguments failed validation. All violations are reported.
    #[error("invalid arguments for '{operation}': {}", join_violations(.violations))]
    InvalidArgument {
        operation: String,
        violations: Vec<ArgumentViolation>,
    },

    /// The remote server reported a computation error; the message is verbatim.
    #[error("remote computation failed: {message}")]
    RemoteComputationError { message: String },

    /// The remote server could not be reached or answered unusably,
    /// after all retries.
    #[error("remote server unavailable: {cause}")]
    RemoteUnavailable { cause: String },

    /// An intent could not be mapped to an operation call.
    #[error("intent resolution failed: {reason}")]
    IntentResolutionError { reason: String },
}

impl MathToolsError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.err_def().code
    }

    #[must_use]
    pub fn violations(&self) -> &[ArgumentViolation] {
        match self {
            Self::InvalidArgument { violations, .. } => violations,
            _ => &[],
        }
    }

    pub(crate) fn err_def(&self) -> &'static crate::problem::ErrDef {
        use crate::problem::catalog;
        match self {
            Self::UnknownOperation { .. } => &catalog::UNKNOWN_OPERATION,
            Self::InvalidArgument { .. } => &catalog::INVALID_ARGUMENT,
            Self::RemoteComputationError { .. } => &catalog::REMOTE_COMPUTATION_ERROR,
            Self::RemoteUnavailable { .. } => &catalog::REMOTE_UNAVAILABLE,
            Self::IntentResolutionError { .. } => &catalog::INTENT_RESOLUTION_ERROR,
        }
    }
}
