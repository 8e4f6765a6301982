use crate::client::HttpClient;
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::HttpResponse;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri};
use serde::Serialize;

/// HTTP request builder with fluent API
///
/// Created by [`HttpClient::get`] and [`HttpClient::post`]. Header and body
/// errors are captured and reported by [`send()`](RequestBuilder::send), so
/// calls can be chained without intermediate `?`.
///
/// ```ignore
/// let resp = client
///     .post("https://math.example.com/gcd")
///     .header("x-api-key", "secret")
///     .json(&serde_json::json!({"a": 12, "b": 18}))?
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
    retry_if: Option<RetryCheck>,
    error: Option<HttpError>,
}

/// Decides whether a received response counts as a failed attempt.
pub type RetryCheck = fn(&HttpResponse) -> bool;

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            retry_if: None,
            error: None,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(mut value)) => {
                if name.as_str().contains("key") || name == http::header::AUTHORIZATION {
                    value.set_sensitive(true);
                }
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Set request body as JSON
    ///
    /// Serializes the value using `serde_json` and sets Content-Type to
    /// `application/json` unless a Content-Type header was already provided.
    ///
    /// # Errors
    /// Returns `Err(HttpError::Json)` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        let encoded = serde_json::to_vec(body)?;
        self.body = Bytes::from(encoded);
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        Ok(self)
    }

    /// Set a raw request body
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Turn responses for which `check` holds into [`HttpError::Status`], so
    /// they are retried like transport failures.
    pub fn retry_if(mut self, check: RetryCheck) -> Self {
        self.retry_if = Some(check);
        self
    }

    /// Send the request
    ///
    /// Returns `Ok` for every received response regardless of status.
    ///
    /// # Errors
    /// Returns an error for invalid URLs or headers, transport failures,
    /// timeouts, oversized bodies and cancellation.
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let uri = parse_url(&self.url, self.client.transport())?;
        self.client
            .execute(self.method, uri, self.headers, self.body, self.retry_if)
            .await
    }
}

/// Parse and validate a URL against the transport security mode.
fn parse_url(url: &str, transport: TransportSecurity) -> Result<Uri, HttpError> {
    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
        url: url.to_owned(),
        kind: InvalidUriKind::ParseError,
        reason: e.to_string(),
    })?;

    let Some(scheme) = uri.scheme_str() else {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingScheme,
            reason: "URL must start with http:// or https://".to_owned(),
        });
    };

    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "URL has no host".to_owned(),
        });
    }

    match (scheme, transport) {
        ("https", _) | ("http", TransportSecurity::AllowHttp) => Ok(uri),
        ("http", TransportSecurity::HttpsOnly) => Err(HttpError::InvalidScheme {
            scheme: scheme.to_owned(),
            reason: "plain HTTP is disabled; enable AllowHttp to use it".to_owned(),
        }),
        (other, _) => Err(HttpError::InvalidScheme {
            scheme: other.to_owned(),
            reason: "only http and https are supported".to_owned(),
        }),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_accepts_https() {
        let uri = parse_url("https://math.example.com/add", TransportSecurity::HttpsOnly).unwrap();
        assert_eq!(uri.path(), "/add");
    }

    #[test]
    fn test_parse_url_rejects_http_when_tls_only() {
        let err = parse_url("http://localhost:8080/add", TransportSecurity::HttpsOnly).unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { ref scheme, .. } if scheme == "http"));
    }

    #[test]
    fn test_parse_url_allows_http_when_enabled() {
        assert!(parse_url("http://localhost:8080/add", TransportSecurity::AllowHttp).is_ok());
    }

    #[test]
    fn test_parse_url_requires_scheme() {
        let err = parse_url("/add", TransportSecurity::AllowHttp).unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::MissingScheme,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_url_rejects_unknown_scheme() {
        let err = parse_url("ftp://example.com/add", TransportSecurity::AllowHttp)
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidScheme { .. }));
    }

    #[test]
    fn test_parse_url_reports_garbage() {
        let err = parse_url("http://exa mple.com", TransportSecurity::AllowHttp)
            .unwrap_err();
        assert!(matches!(
            err,
            HttpError::InvalidUri {
                kind: InvalidUriKind::ParseError,
                ..
            }
        ));
    }
}
