//! Math tools dispatcher
//!
//! Validates operation calls against a fixed catalog and forwards them to a
//! remote math server over HTTP with timeouts and retries. Natural-language
//! intents are mapped onto the same catalog.
//!
//! The crate implements the [`math_tools_sdk::MathToolsClient`] trait through
//! [`MathToolsLocalClient`].
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{ConfigError, MathToolsConfig, RouteStyle};
pub use domain::{DomainError, MathToolsLocalClient};
