use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// Maximum number of body characters kept in error previews.
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 256;

/// A fully received HTTP response.
///
/// The body is read completely (within the configured size limit) before the
/// attempt that produced it is considered finished, so a response never
/// escapes the client half-read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Assemble a response from already received parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    /// Returns `HttpError::Json` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Lossy UTF-8 preview of the body, truncated for logs and error messages
    #[must_use]
    pub fn body_preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let trimmed = text.trim();
        match trimmed.char_indices().nth(ERROR_BODY_PREVIEW_LIMIT) {
            Some((idx, _)) => format!("{}...", &trimmed[..idx]),
            None => trimmed.to_owned(),
        }
    }
}
