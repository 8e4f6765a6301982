use crate::client::{HttpClient, PooledClient};
use crate::config::{HttpClientConfig, RetryPolicy, TransportSecurity};
use crate::error::HttpError;
use crate::tls;
use http::HeaderValue;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builder for an [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    cancel: Option<CancellationToken>,
}

impl HttpClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Largest accepted response body, in bytes.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn allow_http(mut self) -> Self {
        self.config.transport = TransportSecurity::AllowHttp;
        self
    }

    /// Share `token` with the built client. Cancelling it aborts in-flight
    /// attempts and backoff sleeps.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// # Errors
    /// `HttpError::InvalidHeaderValue` for an unusable user agent,
    /// `HttpError::Tls` if the TLS connector cannot be set up.
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let Self { config, cancel } = self;
        let user_agent = HeaderValue::try_from(config.user_agent.as_str())?;

        if config.transport == TransportSecurity::AllowHttp {
            tracing::warn!("plain HTTP is enabled; requests may travel unencrypted");
        }
        let connector = tls::build_https_connector(config.transport)?;

        let mut pool = Client::builder(TokioExecutor::new());
        // idle eviction needs a timer
        pool.pool_timer(TokioTimer::new());
        if let Some(idle) = config.pool_idle_timeout {
            pool.pool_idle_timeout(idle);
        }
        let inner: PooledClient = pool.build(connector);

        Ok(HttpClient::from_parts(
            inner,
            Arc::new(config),
            user_agent,
            cancel.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::Backoff;

    #[test]
    fn setters_land_in_the_config() {
        let builder = HttpClientBuilder::new()
            .timeout(Duration::from_millis(750))
            .retry(RetryPolicy::new(1, Backoff::quick()))
            .user_agent("math-cli/0.1")
            .max_body_size(64)
            .allow_http();

        let config = &builder.config;
        assert_eq!(config.request_timeout, Duration::from_millis(750));
        assert_eq!(config.retry.max_retries, 1);
        assert!(!config.retry.backoff.jitter);
        assert_eq!(config.user_agent, "math-cli/0.1");
        assert_eq!(config.max_body_size, 64);
        assert_eq!(config.transport, TransportSecurity::AllowHttp);
    }

    #[tokio::test]
    async fn default_client_builds() {
        assert!(HttpClientBuilder::new().build().is_ok());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn plain_http_is_logged() {
        assert!(HttpClientBuilder::new().allow_http().build().is_ok());
        assert!(logs_contain("plain HTTP is enabled"));
    }

    #[tokio::test]
    async fn control_characters_in_user_agent_are_rejected() {
        let result = HttpClientBuilder::new().user_agent("math\r\ntools").build();
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let client = HttpClientBuilder::new()
            .cancellation(token.clone())
            .build()
            .unwrap();
        token.cancel();
        assert!(client.cancellation_token().is_cancelled());
    }
}
