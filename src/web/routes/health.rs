//! `/health-check`

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use crate::core::context::AppContext;
use crate::web::response::ServiceResponse;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/", get(health_check).post(health_check))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health-check",
    tag = "Health Check",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health_check() -> ServiceResponse<()> {
    ServiceResponse::success("Service is healthy", None)
}
