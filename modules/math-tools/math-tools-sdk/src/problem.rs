//! RFC 9457 style problem details for host-visible errors.

use crate::error::MathToolsError;
use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// Problem details returned to the host for a failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[must_use]
pub struct Problem {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub type_url: String,
    /// Short summary of the problem type
    pub title: String,
    /// HTTP-equivalent status, serialized as u16
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    /// Explanation specific to this occurrence
    pub detail: String,
    /// Stable machine-readable error code
    pub code: String,
    /// Per-argument violations for `INVALID_ARGUMENT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationViolation>>,
}

/// Individual validation violation for a specific argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// Parameter name as declared by the operation
    pub field: String,
    /// Human-readable message
    pub message: String,
    /// Machine-readable violation code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            code: String::new(),
            errors: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_errors(mut self, errors: Vec<ValidationViolation>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Static error definition from the catalog
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail
    #[inline]
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Problem::new(status, self.title, detail.into())
            .with_code(self.code)
            .with_type(self.type_url)
    }
}

/// Error catalog with stable codes.
pub mod catalog {
    use super::ErrDef;

    pub const UNKNOWN_OPERATION: ErrDef = ErrDef {
        status: 404,
        title: "Unknown operation",
        code: "UNKNOWN_OPERATION",
        type_url: "https://errors.math-tools.dev/UNKNOWN_OPERATION",
    };

    pub const INVALID_ARGUMENT: ErrDef = ErrDef {
        status: 422,
        title: "Invalid argument",
        code: "INVALID_ARGUMENT",
        type_url: "https://errors.math-tools.dev/INVALID_ARGUMENT",
    };

    pub const REMOTE_COMPUTATION_ERROR: ErrDef = ErrDef {
        status: 422,
        title: "Remote computation error",
        code: "REMOTE_COMPUTATION_ERROR",
        type_url: "https://errors.math-tools.dev/REMOTE_COMPUTATION_ERROR",
    };

    pub const REMOTE_UNAVAILABLE: ErrDef = ErrDef {
        status: 503,
        title: "Remote server unavailable",
        code: "REMOTE_UNAVAILABLE",
        type_url: "https://errors.math-tools.dev/REMOTE_UNAVAILABLE",
    };

    pub const INTENT_RESOLUTION_ERROR: ErrDef = ErrDef {
        status: 400,
        title: "Intent resolution error",
        code: "INTENT_RESOLUTION_ERROR",
        type_url: "https://errors.math-tools.dev/INTENT_RESOLUTION_ERROR",
    };
}

impl From<&MathToolsError> for Problem {
    fn from(err: &MathToolsError) -> Self {
        let def = err.err_def();
        match err {
            MathToolsError::InvalidArgument {
                operation,
                violations,
            } => def
                .as_problem(format!(
                    "{} argument(s) rejected for '{operation}'",
                    violations.len()
                ))
                .with_errors(
                    violations
                        .iter()
                        .map(|v| ValidationViolation {
                            field: v.parameter.clone(),
                            message: v.message.clone(),
                            code: Some(v.kind.code().to_owned()),
                        })
                        .collect(),
                ),
            MathToolsError::UnknownOperation { name } => {
                def.as_problem(format!("operation '{name}' is not registered"))
            }
            MathToolsError::RemoteComputationError { message } => def.as_problem(message.clone()),
            MathToolsError::RemoteUnavailable { cause } => def.as_problem(cause.clone()),
            MathToolsError::IntentResolutionError { reason } => def.as_problem(reason.clone()),
        }
    }
}

impl From<MathToolsError> for Problem {
    fn from(err: MathToolsError) -> Self {
        Problem::from(&err)
    }
}
