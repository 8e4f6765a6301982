//! Public API trait for the math tools dispatcher.

use async_trait::async_trait;

use crate::error::MathToolsError;
use crate::models::{Arguments, IntentResponse, OperationResult, OperationSpec};

/// Host-facing client for the math tools dispatcher.
///
/// ```ignore
/// let client: Arc<dyn MathToolsClient> = ...;
///
/// let sum = client
///     .dispatch("add", arguments([("a", 1.0), ("b", 2.0)]))
///     .await?;
///
/// let answer = client
///     .handle_intent("MathGcd", arguments([("a", "12"), ("b", "18")]))
///     .await?;
/// println!("{}", answer.speech);
/// ```
#[async_trait]
pub trait MathToolsClient: Send + Sync {
    /// Validate `arguments` against the named operation and run it remotely.
    ///
    /// # Errors
    ///
    /// - `UnknownOperation` if the name is not registered
    /// - `InvalidArgument` with every violation when validation fails;
    ///   nothing is sent in that case
    /// - `RemoteComputationError` when the server reports an error
    /// - `RemoteUnavailable` when the server cannot be reached after retries
    async fn dispatch(
        &self,
        operation: &str,
        arguments: Arguments,
    ) -> Result<OperationResult, MathToolsError>;

    /// Resolve an intent to an operation call, dispatch it and render the answer.
    ///
    /// # Errors
    ///
    /// `IntentResolutionError` for unknown intents or missing slots, otherwise
    /// the same errors as [`MathToolsClient::dispatch`].
    async fn handle_intent(
        &self,
        intent_type: &str,
        slots: Arguments,
    ) -> Result<IntentResponse, MathToolsError>;

    /// The operation catalog.
    fn operations(&self) -> &'static [OperationSpec];
}
