use crate::builder::HttpClientBuilder;
use crate::config::{HttpClientConfig, TransportSecurity};
use crate::error::HttpError;
use crate::request::{RequestBuilder, RetryCheck};
use crate::response::HttpResponse;
use crate::retry::{RETRY_ATTEMPT_HEADER, run_with_retry};
use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderValue, Method, Uri};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub(crate) type PooledClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP client with connection pooling, per-attempt timeouts and retries
///
/// Cloning is cheap: clones share the connection pool, configuration and
/// cancellation token.
#[derive(Clone)]
pub struct HttpClient {
    inner: PooledClient,
    config: Arc<HttpClientConfig>,
    user_agent: HeaderValue,
    cancel: CancellationToken,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a builder for configuring the client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Create a client with default configuration
    ///
    /// # Errors
    /// Returns an error if the TLS connector cannot be initialised.
    pub fn new() -> Result<Self, HttpError> {
        HttpClientBuilder::new().build()
    }

    pub(crate) fn from_parts(
        inner: PooledClient,
        config: Arc<HttpClientConfig>,
        user_agent: HeaderValue,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            config,
            user_agent,
            cancel,
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), Method::GET, url.to_owned())
    }

    /// Start a POST request
    pub fn post(&self, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), Method::POST, url.to_owned())
    }

    #[cfg(test)]
    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel all in-flight requests and pending retries
    ///
    /// Requests started afterwards fail immediately with `HttpError::Cancelled`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn transport(&self) -> TransportSecurity {
        self.config.transport
    }

    pub(crate) async fn execute(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        retry_if: Option<RetryCheck>,
    ) -> Result<HttpResponse, HttpError> {
        let method = &method;
        let uri = &uri;
        let headers = &headers;
        run_with_retry(&self.config.retry, &self.cancel, |attempt| {
            let body = body.clone();
            async move {
                let response = self.execute_once(attempt, method, uri, headers, body).await?;
                if retry_if.is_some_and(|check| check(&response)) {
                    return Err(HttpError::Status {
                        status: response.status(),
                        preview: response.body_preview(),
                    });
                }
                Ok(response)
            }
        })
        .await
    }

    async fn execute_once(
        &self,
        attempt: usize,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<HttpResponse, HttpError> {
        let mut request = http::Request::builder()
            .method(method.clone())
            .uri(uri.clone())
            .body(Full::new(body))?;

        let request_headers = request.headers_mut();
        request_headers.extend(headers.clone());
        request_headers.insert(USER_AGENT, self.user_agent.clone());
        if attempt > 0 {
            request_headers.insert(RETRY_ATTEMPT_HEADER, HeaderValue::from(attempt));
        }

        let timeout = self.config.request_timeout;
        let limit = self.config.max_body_size;
        let exchange = async {
            let response = self.inner.request(request).await?;
            let (parts, body) = response.into_parts();
            let collected = Limited::new(body, limit)
                .collect()
                .await
                .map_err(|e| map_body_error(e, limit))?;
            Ok(HttpResponse::new(
                parts.status,
                parts.headers,
                collected.to_bytes(),
            ))
        };

        tracing::trace!(%method, %uri, attempt, "sending request");
        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| HttpError::Timeout(timeout))?
    }
}

fn map_body_error(err: Box<dyn std::error::Error + Send + Sync>, limit: usize) -> HttpError {
    if err.downcast_ref::<LengthLimitError>().is_some() {
        HttpError::BodyTooLarge { limit }
    } else {
        HttpError::Transport(err)
    }
}
