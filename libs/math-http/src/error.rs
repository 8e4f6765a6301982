use std::time::Duration;
use thiserror::Error;

/// Why a request URL was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    ParseError,
    MissingAuthority,
    MissingScheme,
}

/// Errors produced by [`crate::HttpClient`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    #[error("cannot build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("bad header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("bad header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// One attempt ran past the configured request timeout.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused or reset, DNS failure and similar.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A received response the request's `retry_if` check flagged as a failed
    /// attempt.
    #[error("server answered {status}: {preview}")]
    Status {
        status: http::StatusCode,
        preview: String,
    },

    /// The client's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// The retry budget ran out; `last` is what the final attempt returned.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: Box<HttpError>,
    },

    /// `reason` is diagnostic text; match on `kind`.
    #[error("bad URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        reason: String,
    },

    /// Scheme not permitted by the transport security setting.
    #[error("scheme '{scheme}' refused: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// Worth another attempt: no response arrived, or the one that did was
    /// flagged by `retry_if`.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Status { .. }
        )
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    fn refused() -> HttpError {
        HttpError::Transport(Box::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }

    #[test]
    fn transport_error_keeps_the_io_source() {
        let err = refused();
        let io_err = err
            .source()
            .and_then(|s| s.downcast_ref::<io::Error>())
            .unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn exhausted_retries_point_at_the_last_attempt() {
        let err = HttpError::RetriesExhausted {
            attempts: 4,
            last: Box::new(HttpError::Timeout(Duration::from_secs(5))),
        };

        assert_eq!(
            err.to_string(),
            "gave up after 4 attempts: attempt timed out after 5s"
        );
        assert!(matches!(
            err.source().and_then(|s| s.downcast_ref::<HttpError>()),
            Some(HttpError::Timeout(_))
        ));
    }

    #[test]
    fn only_connection_failures_and_timeouts_are_retryable() {
        assert!(refused().is_retryable());
        assert!(HttpError::Timeout(Duration::from_millis(1)).is_retryable());
        assert!(!HttpError::Cancelled.is_retryable());
        assert!(!HttpError::BodyTooLarge { limit: 1 }.is_retryable());
    }
}
