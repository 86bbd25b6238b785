//! Cross-origin policy built from `CORS_ORIGIN`.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Builds the CORS layer.
///
/// `origin` is either a single origin, a comma-separated list, or `*`. Because
/// credentials are always allowed, `*` is answered by echoing the caller's origin
/// rather than a literal wildcard.
pub fn cors_layer(origin: &str) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allow_origin(origin))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

fn allow_origin(origin: &str) -> AllowOrigin {
    if origin.trim() == "*" {
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = parse_origins(origin);
    AllowOrigin::list(origins)
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match HeaderValue::from_str(s) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = s, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}
