#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP client infrastructure for the math tools dispatcher
//!
//! This crate provides a hyper-based JSON client with:
//! - Automatic TLS via rustls (plain HTTP must be allowed explicitly)
//! - Connection pooling
//! - A timeout applied to every individual attempt
//! - Automatic retries with exponential backoff on transport failures and timeouts
//! - Cooperative cancellation through a shared `CancellationToken`
//! - Response body size limits
//!
//! Every request is sent as-is for each attempt; the client never inspects
//! the payload. Non-2xx responses are returned as `Ok(HttpResponse)` so the
//! caller can interpret error bodies itself, unless the request's `retry_if`
//! check flags them, in which case they are retried and finally reported as
//! `HttpError::Status`.
//!
//! # Example
//!
//! ```ignore
//! use math_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! let resp = client
//!     .post("https://math.example.com/add")
//!     .json(&serde_json::json!({"a": 1, "b": 2}))?
//!     .send()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    Backoff, DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, HttpClientConfig, RetryPolicy,
    TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use request::{RequestBuilder, RetryCheck};
pub use response::HttpResponse;
pub use retry::{RETRY_ATTEMPT_HEADER, calculate_backoff, run_with_retry};
