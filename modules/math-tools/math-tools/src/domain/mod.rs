//! Domain layer: registry, validation, dispatch and intents.

pub mod error;
pub mod intent;
pub mod local_client;
pub mod registry;
pub mod service;
pub mod validation;

pub use error::DomainError;
pub use intent::IntentHandler;
pub use local_client::MathToolsLocalClient;
pub use service::{Completed, Dispatcher};
pub use validation::ValidatedArguments;
