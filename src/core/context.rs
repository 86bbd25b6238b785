//! Process-wide application context.
//!
//! Built once in `main` and handed by reference to the HTTP pipeline, the route
//! table and the command dispatcher. Everything inside is read-only after startup.

use std::sync::Arc;
use tokio::time::Instant;

use crate::core::config::AppConfig;
use crate::web::routes::users::UserRepository;

/// Shared, read-only state for both entry paths (HTTP and bot)
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub users: UserRepository,
    pub started_at: Instant,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self::with_users(config, UserRepository::seeded())
    }

    /// Same as [`AppContext::new`] with a caller-supplied user store
    pub fn with_users(config: AppConfig, users: UserRepository) -> Self {
        Self {
            config,
            users,
            started_at: Instant::now(),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
