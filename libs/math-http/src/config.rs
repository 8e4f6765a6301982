use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("math-tools-http/", env!("CARGO_PKG_VERSION"));

/// 1 MiB
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Sleep schedule between attempts.
///
/// The pause before retry `k` (zero-based) is `initial * factor^k` capped at
/// `max`. With `jitter` it is stretched by up to a quarter, never past `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub factor: u32,
    pub jitter: bool,
}

impl Backoff {
    #[must_use]
    pub const fn doubling(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            factor: 2,
            jitter: true,
        }
    }

    /// 1ms doubling up to 100ms without jitter, for tests.
    #[must_use]
    pub const fn quick() -> Self {
        Self {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(100),
            factor: 2,
            jitter: false,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::doubling(Duration::from_millis(100), Duration::from_secs(2))
    }
}

/// How many times a failed exchange is repeated.
///
/// Failures that produced no HTTP response are repeated (see
/// [`crate::HttpError::is_retryable`]). A status is a final answer unless the
/// request flags it with [`crate::RequestBuilder::retry_if`]. `POST` is retried
/// too: every endpoint behind this client is a pure function of its request
/// body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// A call makes at most `max_retries + 1` attempts.
    pub max_retries: usize,
    pub backoff: Backoff,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: usize, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// One attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Backoff::default())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::default())
    }
}

/// URL schemes the client will connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSecurity {
    #[default]
    HttpsOnly,
    /// `http://` too, for math servers on a private network or localhost.
    AllowHttp,
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Bounds one attempt, response body included. Backoff sleeps are extra.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub user_agent: String,
    pub max_body_size: usize,
    pub transport: TransportSecurity,
    /// `None` keeps pooled connections until the server closes them.
    pub pool_idle_timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            transport: TransportSecurity::HttpsOnly,
            pool_idle_timeout: Some(Duration::from_secs(90)),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dispatcher_defaults() {
        let config = HttpClientConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.backoff.initial, Duration::from_millis(100));
        assert_eq!(config.retry.backoff.max, Duration::from_secs(2));
        assert!(config.retry.backoff.jitter);
        assert_eq!(config.transport, TransportSecurity::HttpsOnly);
        assert!(config.user_agent.starts_with("math-tools-http/"));
    }

    #[test]
    fn none_policy_allows_a_single_attempt() {
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
