//! In-process implementation of the host-facing client.

use std::sync::Arc;

use async_trait::async_trait;
use math_http::HttpError;
use math_tools_sdk::{
    Arguments, IntentResponse, MathToolsClient, MathToolsError, OperationResult, OperationSpec,
};
use tokio_util::sync::CancellationToken;

use super::intent::IntentHandler;
use super::{DomainError, Dispatcher, registry};
use crate::config::MathToolsConfig;
use crate::infra::remote::{HttpRemoteClient, RemoteClient};

/// Dispatcher and intent handler behind the [`MathToolsClient`] trait.
#[derive(Clone)]
pub struct MathToolsLocalClient {
    dispatcher: Dispatcher,
    intents: IntentHandler,
}

impl MathToolsLocalClient {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteClient>) -> Self {
        let dispatcher = Dispatcher::new(remote);
        Self {
            intents: IntentHandler::new(dispatcher.clone()),
            dispatcher,
        }
    }

    /// Build a client talking HTTP to the configured server.
    ///
    /// Cancelling `cancel` aborts every in-flight call.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(
        config: &MathToolsConfig,
        cancel: CancellationToken,
    ) -> Result<Self, HttpError> {
        let remote = HttpRemoteClient::with_cancellation(config, cancel)?;
        Ok(Self::new(Arc::new(remote)))
    }

    /// Match a free-text utterance to an intent and answer it.
    ///
    /// # Errors
    /// `IntentResolutionError` when nothing matches, otherwise as
    /// [`MathToolsClient::handle_intent`].
    pub async fn ask(&self, utterance: &str) -> Result<IntentResponse, MathToolsError> {
        self.intents
            .handle_utterance(utterance)
            .await
            .map_err(|e| log_and_convert("ask", e))
    }
}

fn log_and_convert(op: &str, e: DomainError) -> MathToolsError {
    match &e {
        DomainError::Unavailable(_) => {
            tracing::error!(call = op, error = ?e, "math-tools call failed");
        }
        _ => tracing::debug!(call = op, error = %e, "math-tools call rejected"),
    }
    e.into()
}

#[async_trait]
impl MathToolsClient for MathToolsLocalClient {
    async fn dispatch(
        &self,
        operation: &str,
        arguments: Arguments,
    ) -> Result<OperationResult, MathToolsError> {
        self.dispatcher
            .dispatch(operation, &arguments)
            .await
            .map_err(|e| log_and_convert("dispatch", e))
    }

    async fn handle_intent(
        &self,
        intent_type: &str,
        slots: Arguments,
    ) -> Result<IntentResponse, MathToolsError> {
        self.intents
            .handle(intent_type, &slots)
            .await
            .map_err(|e| log_and_convert("handle_intent", e))
    }

    fn operations(&self) -> &'static [OperationSpec] {
        registry::all()
    }
}
