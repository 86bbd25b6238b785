//! Logger initialization

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::core::error::{AppError, AppResult};

/// Installs the global tracing subscriber.
///
/// `filter` is an `EnvFilter` directive such as `info` or
/// `chipmunk=debug,teloxide=warn`. `log` records (teloxide, reqwest) are
/// forwarded into the same subscriber.
///
/// # Returns
/// * `Ok(())` - Subscriber installed
/// * `Err(AppError::Logging)` - Invalid directive or a subscriber is already set
pub fn init_logger(filter: &str) -> AppResult<()> {
    let filter = EnvFilter::try_new(filter).map_err(|e| AppError::Logging(format!("invalid filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| AppError::Logging(format!("failed to initialize logger: {}", e)))?;

    Ok(())
}
