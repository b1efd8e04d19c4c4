//! Listener configuration.
//!
//! Provides the connection and listener settings, their file and
//! environment forms, and validation.

mod model;
mod validation;

pub use model::{ConnectionConfig, DEFAULT_PORT, ListenerSettings, Protocol, WatchConfig};
pub use validation::{ValidationError, ValidationResult, validate_config};
