//! Application-wide error types using thiserror.

use utmdash_common::DashError;
use utmdash_config::ConfigError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Library error from the client or report pipeline.
    #[error(transparent)]
    Dash(#[from] DashError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid command line input.
    #[error("Invalid arguments: {0}")]
    Usage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the application.
pub type AppResult<T> = Result<T, AppError>;
