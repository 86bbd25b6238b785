//! Generated API documentation: `/swagger.json` and a Swagger UI page at `/`.

use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::core::context::AppContext;
use crate::web::routes::{health, users};

#[derive(OpenApi)]
#[openapi(
    info(title = "Chipmunk Kombat API", description = "Health check and user resources"),
    paths(health::health_check, users::list_users, users::get_user),
    components(schemas(users::User)),
    tags((name = "Health Check"), (name = "User"))
)]
pub struct ApiDoc;

/// The UI loads its assets from unpkg, so it ships its own CSP.
const SWAGGER_UI_CSP: &str = "default-src 'self';script-src 'self' 'unsafe-inline' https://unpkg.com;\
style-src 'self' 'unsafe-inline' https://unpkg.com;img-src 'self' data: https:;object-src 'none'";

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Chipmunk Kombat API</title>
<link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>window.ui = SwaggerUIBundle({ url: "/swagger.json", dom_id: "#swagger-ui" });</script>
</body>
</html>"##;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", get(swagger_ui))
        .route("/swagger.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> impl IntoResponse {
    (
        [(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(SWAGGER_UI_CSP))],
        Html(SWAGGER_UI_HTML),
    )
}
