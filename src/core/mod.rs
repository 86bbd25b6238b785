//! Core utilities: configuration, shared context, errors, logging, rate limiting

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod rate_limiter;

// Re-exports for convenience
pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
