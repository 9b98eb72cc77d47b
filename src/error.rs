//! Error types for the console application.

use crate::config::ConfigError;
use resource_sync::{FrameworkError, NormalizedError};
use thiserror::Error;

/// Errors surfaced by the console outside of the per-command `last_error` slots.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The API token cannot be sent as a header value.
    #[error("API token contains characters not allowed in a header")]
    InvalidToken,

    /// A command settled with an error.
    #[error("Command failed: {0}")]
    Command(#[from] NormalizedError),

    /// A resource worker did not shut down cleanly.
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}
