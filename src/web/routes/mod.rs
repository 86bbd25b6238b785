//! Route table.
//!
//! Prefixes are matched by whole path segment; the first match wins and anything
//! unmatched falls through to the normalized not-found response.

pub mod docs;
pub mod health;
pub mod users;

use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::core::context::AppContext;
use crate::web::error::{handle_panic, not_found};

pub const HEALTH_CHECK_PREFIX: &str = "/health-check";
pub const USERS_PREFIX: &str = "/users";

/// Builds the route table bound to the shared context.
///
/// Handler panics are turned into normalized 500s here, so they still travel
/// back out through the logging and header stages.
pub fn route_table(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .nest(HEALTH_CHECK_PREFIX, health::router())
        .nest(USERS_PREFIX, users::router())
        .merge(docs::router())
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(ctx)
}
