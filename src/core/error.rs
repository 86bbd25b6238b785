use thiserror::Error;

use crate::core::config::ConfigError;
use crate::telegram::gateway::GatewayError;

/// Startup and infrastructure errors.
///
/// Request-level failures use [`ApiError`](crate::web::error::ApiError) and bot
/// command failures use [`CommandError`](crate::telegram::dispatcher::CommandError);
/// this enum covers everything that can stop the process from coming up.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Outbound client could not be built
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors (socket bind, serve)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logger could not be installed
    #[error("Logging error: {0}")]
    Logging(String),

    /// A required setting is missing for the selected mode
    #[error("Missing setting: {0}")]
    Missing(&'static str),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
