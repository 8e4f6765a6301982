#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Math Tools SDK
//!
//! This crate provides the public contract of the math tools dispatcher:
//!
//! - [`MathToolsClient`] - API trait for hosts
//! - [`ArgValue`], [`OperationResult`], [`OperationSpec`] - Models
//! - [`IntentRequest`], [`IntentResponse`] - Intent surface
//! - [`MathToolsError`] - Error taxonomy with stable codes
//! - [`Problem`] - Host-visible error rendering

pub mod api;
pub mod error;
pub mod models;
pub mod problem;

pub use api::MathToolsClient;
pub use error::{ArgumentViolation, MathToolsError, ViolationKind};
pub use models::{
    ArgValue, Arguments, CallRequest, Category, Constraint, DefaultValue, IntentCard, IntentRequest,
    IntentResponse, OperationResult, OperationSpec, ParamType, ParameterSpec, ResultType,
    arguments, format_exact, format_number, format_sequence,
};
pub use problem::{ErrDef, Problem, ValidationViolation};
