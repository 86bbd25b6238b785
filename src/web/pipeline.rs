//! Middleware chain assembly.
//!
//! The order requests travel through the chain is declared once in [`PIPELINE`];
//! [`apply`] is the only place layers are installed. The error normalizer wraps
//! the whole chain so a failure at any stage, or in the route table, comes out in
//! the uniform shape.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use std::fmt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::core::context::AppContext;
use crate::core::rate_limiter::RateLimiter;
use crate::web::error::{handle_panic, normalize_errors};
use crate::web::middleware::{cors_layer, rate_limit, request_log, security_headers};

/// One interceptor in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Caps request bodies before any extractor parses them
    BodyLimit,
    /// Origin allow-list and credential flag
    Cors,
    /// Fixed security response headers
    SecurityHeaders,
    /// Per-client throttling
    RateLimit,
    /// Method/path/status/latency logging
    RequestLog,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::BodyLimit => "body_limit",
            Stage::Cors => "cors",
            Stage::SecurityHeaders => "security_headers",
            Stage::RateLimit => "rate_limit",
            Stage::RequestLog => "request_log",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stages in the order a request meets them.
pub const PIPELINE: [Stage; 5] = [
    Stage::BodyLimit,
    Stage::Cors,
    Stage::SecurityHeaders,
    Stage::RateLimit,
    Stage::RequestLog,
];

/// Wraps `routes` in the full middleware chain.
pub fn apply(routes: Router, ctx: &AppContext, limiter: &RateLimiter) -> Router {
    let mut router = routes;

    // Router::layer wraps what is already there, so install innermost first.
    for stage in PIPELINE.iter().rev() {
        router = match stage {
            Stage::BodyLimit => router.layer(RequestBodyLimitLayer::new(ctx.config.http.max_body_bytes)),
            Stage::Cors => router.layer(cors_layer(&ctx.config.http.cors_origin)),
            Stage::SecurityHeaders => router.layer(from_fn(security_headers)),
            Stage::RateLimit => router.layer(from_fn_with_state(limiter.clone(), rate_limit)),
            Stage::RequestLog => router.layer(from_fn(request_log)),
        };
    }

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(normalize_errors))
}

/// Human-readable chain description for startup logs
pub fn describe() -> String {
    PIPELINE
        .iter()
        .map(Stage::name)
        .chain(std::iter::once("routes"))
        .collect::<Vec<_>>()
        .join(" -> ")
}
