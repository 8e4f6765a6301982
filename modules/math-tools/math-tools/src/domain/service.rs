use std::sync::Arc;

use math_tools_sdk::{Arguments, OperationResult, OperationSpec, ResultType};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::error::DomainError;
use super::registry;
use super::validation::{self, ValidatedArguments};
use crate::infra::remote::{RemoteClient, RemoteEnvelope};

/// A finished operation call.
#[derive(Debug, Clone)]
pub struct Completed {
    pub spec: &'static OperationSpec,
    pub arguments: ValidatedArguments,
    pub result: OperationResult,
}

/// Validates calls against the registry and forwards them to the server.
///
/// Holds no per-call state; concurrent dispatches share only the remote client.
#[derive(Clone)]
pub struct Dispatcher {
    remote: Arc<dyn RemoteClient>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteClient>) -> Self {
        Self { remote }
    }

    /// Run an operation and return its result.
    ///
    /// # Errors
    /// See [`Dispatcher::execute`].
    pub async fn dispatch(
        &self,
        operation: &str,
        arguments: &Arguments,
    ) -> Result<OperationResult, DomainError> {
        self.execute(operation, arguments)
            .await
            .map(|completed| completed.result)
    }

    /// Run an operation, keeping the normalized arguments alongside the result.
    ///
    /// # Errors
    /// `UnknownOperation` and `InvalidArguments` are raised before anything is
    /// sent. `Remote` carries a server-reported error; `Unavailable` covers
    /// transport failures after retries and replies of the wrong shape.
    #[instrument(skip_all, fields(operation = %operation))]
    pub async fn execute(
        &self,
        operation: &str,
        arguments: &Arguments,
    ) -> Result<Completed, DomainError> {
        let spec =
            registry::lookup(operation).ok_or_else(|| DomainError::unknown_operation(operation))?;

        let validated = validation::validate(spec, arguments).map_err(|violations| {
            debug!(count = violations.len(), "arguments rejected");
            DomainError::InvalidArguments {
                operation: spec.name,
                violations,
            }
        })?;

        let envelope = self.remote.send(spec, &validated).await.map_err(|e| {
            warn!(error = %e, "remote server unavailable");
            DomainError::from(e)
        })?;

        let value = match envelope {
            RemoteEnvelope::Ok(value) => value,
            RemoteEnvelope::Error(message) => {
                info!(%message, "remote computation error");
                return Err(DomainError::Remote(message));
            }
        };

        let result = shape_result(&value, spec.result).ok_or_else(|| {
            DomainError::invalid_response(format!(
                "expected {} result for '{}', got {value}",
                spec.result, spec.name
            ))
        })?;

        debug!("operation completed");
        Ok(Completed {
            spec,
            arguments: validated,
            result,
        })
    }
}

/// Convert a result value to the declared shape, if it conforms.
fn shape_result(value: &Value, expected: ResultType) -> Option<OperationResult> {
    match expected {
        ResultType::Number => value.as_number().cloned().map(OperationResult::Number),
        ResultType::Boolean => value.as_bool().map(OperationResult::Boolean),
        ResultType::Sequence => value
            .as_array()?
            .iter()
            .map(|item| item.as_number().cloned())
            .collect::<Option<Vec<_>>>()
            .map(OperationResult::Sequence),
    }
}
