//! HTTP transport to the remote computation server.

use async_trait::async_trait;
use math_http::{
    Backoff, HttpClient, HttpClientBuilder, HttpClientConfig, HttpError, HttpResponse,
    RetryPolicy, TransportSecurity,
};
use math_tools_sdk::OperationSpec;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{MathToolsConfig, RouteStyle};
use crate::domain::validation::ValidatedArguments;

/// Header carrying the configured API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Interpreted reply of one remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEnvelope {
    /// The `result` field of a successful reply
    Ok(Value),
    /// Error message reported by the server
    Error(String),
}

/// Failure to obtain a usable reply from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or timeout failure; terminal after retries.
    #[error(transparent)]
    Http(HttpError),

    /// A success status whose body is not a result envelope.
    #[error("invalid response from server: {reason}")]
    InvalidResponse { reason: String },

    /// A non-2xx reply without an error message, e.g. a proxy's error page.
    #[error("server answered HTTP {status} without an error message: {preview}")]
    Status { status: u16, preview: String },

    /// The client was shut down while the call was in flight.
    #[error("request cancelled")]
    Cancelled,
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => Self::Cancelled,
            other => Self::Http(other),
        }
    }
}

/// Sends validated operation calls to the computation server.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Perform one logical call, retrying internally on transport failures.
    ///
    /// # Errors
    /// Returns a [`TransportError`] when no interpretable reply was obtained.
    async fn send(
        &self,
        operation: &'static OperationSpec,
        arguments: &ValidatedArguments,
    ) -> Result<RemoteEnvelope, TransportError>;
}

/// [`RemoteClient`] over the pooled, retrying HTTP client.
pub struct HttpRemoteClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<SecretString>,
    route_style: RouteStyle,
}

impl HttpRemoteClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    /// Returns `HttpError` if the HTTP client cannot be initialised.
    pub fn new(config: &MathToolsConfig) -> Result<Self, HttpError> {
        Self::with_cancellation(config, CancellationToken::new())
    }

    /// Like [`HttpRemoteClient::new`], sharing `cancel` for shutdown.
    ///
    /// # Errors
    /// Returns `HttpError` if the HTTP client cannot be initialised.
    pub fn with_cancellation(
        config: &MathToolsConfig,
        cancel: CancellationToken,
    ) -> Result<Self, HttpError> {
        let http = HttpClientBuilder::with_config(http_config(config))
            .cancellation(cancel)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            route_style: config.route_style,
        })
    }

    /// Target URL for `operation` under the configured route style.
    #[must_use]
    pub fn url_for(&self, operation: &OperationSpec) -> String {
        match self.route_style {
            RouteStyle::Flat => format!("{}/{}", self.base_url, operation.name),
            RouteStyle::Grouped => {
                format!("{}/{}/{}", self.base_url, operation.category, operation.name)
            }
        }
    }

    /// Abort in-flight calls and pending retries.
    pub fn shutdown(&self) {
        self.http.shutdown();
    }
}

/// Map dispatcher settings onto the HTTP client configuration.
#[must_use]
pub fn http_config(config: &MathToolsConfig) -> HttpClientConfig {
    let backoff = Backoff::doubling(config.backoff_initial, config.backoff_max);
    HttpClientConfig {
        request_timeout: config.timeout,
        retry: RetryPolicy::new(config.max_retries, backoff),
        transport: if config.is_plain_http() {
            TransportSecurity::AllowHttp
        } else {
            TransportSecurity::HttpsOnly
        },
        ..HttpClientConfig::default()
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn send(
        &self,
        operation: &'static OperationSpec,
        arguments: &ValidatedArguments,
    ) -> Result<RemoteEnvelope, TransportError> {
        let url = self.url_for(operation);
        tracing::debug!(operation = operation.name, %url, "calling remote operation");

        let mut request = self.http.post(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }
        let response = request
            .json(arguments)?
            .retry_if(is_gateway_failure)
            .send()
            .await?;
        interpret(&response)
    }
}

/// A bodyless 502/503/504: the server behind the gateway never answered.
fn is_gateway_failure(response: &HttpResponse) -> bool {
    matches!(response.status().as_u16(), 502..=504) && reported_error(response).is_none()
}

fn reported_error(response: &HttpResponse) -> Option<String> {
    let body: Value = serde_json::from_slice(response.bytes()).ok()?;
    error_message(body.as_object()?)
}

/// Interpret a received response.
///
/// A 2xx reply with a `result` field is a success. Any reply whose body
/// carries an error message is a remote error regardless of status.
///
/// # Errors
/// `TransportError::InvalidResponse` for a 2xx reply without a result,
/// `TransportError::Status` for a non-2xx reply without an error message.
pub fn interpret(response: &HttpResponse) -> Result<RemoteEnvelope, TransportError> {
    let status = response.status();
    let body: Option<Value> = serde_json::from_slice(response.bytes()).ok();
    let object = body.as_ref().and_then(Value::as_object);

    if status.is_success()
        && let Some(map) = object
        && let Some(result) = map.get("result")
        && !reports_error_status(map)
    {
        return Ok(RemoteEnvelope::Ok(result.clone()));
    }

    if let Some(message) = object.and_then(error_message) {
        return Ok(RemoteEnvelope::Error(message));
    }

    if status.is_success() {
        let reason = match object {
            Some(_) => "response has no 'result' field".to_owned(),
            None if body.is_some() => "response is not a JSON object".to_owned(),
            None => format!("response is not JSON: {}", response.body_preview()),
        };
        return Err(TransportError::InvalidResponse { reason });
    }

    Err(TransportError::Status {
        status: status.as_u16(),
        preview: response.body_preview(),
    })
}

fn reports_error_status(map: &Map<String, Value>) -> bool {
    map.get("status").and_then(Value::as_str) == Some("error")
}

fn error_message(map: &Map<String, Value>) -> Option<String> {
    for field in ["error", "detail", "message"] {
        match map.get(field) {
            Some(Value::String(text)) if !text.trim().is_empty() => return Some(text.clone()),
            Some(Value::Object(inner)) => {
                if let Some(text) = inner.get("message").and_then(Value::as_str) {
                    return Some(text.to_owned());
                }
            }
            // Validation reports: [{"loc": [...], "msg": "..."}]
            Some(Value::Array(items)) if field == "detail" => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return Some(messages.join("; "));
                }
            }
            _ => {}
        }
    }
    reports_error_status(map).then(|| "server reported an error".to_owned())
}
