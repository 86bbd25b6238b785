//! Integration tests for the HTTP pipeline and route table
//!
//! Run with: cargo test --test http_pipeline_test

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chipmunk::core::rate_limiter::RateLimiter;
use chipmunk::core::{AppConfig, AppContext};
use chipmunk::web::error::{INTERNAL_ERROR_MESSAGE, RATE_LIMIT_MESSAGE};
use chipmunk::web::routes::users::UserRepository;
use chipmunk::web::{build_app, pipeline};

// ============================================================================
// Helpers
// ============================================================================

fn context(pairs: &[(&str, &str)]) -> Arc<AppContext> {
    AppContext::new(config(pairs)).shared()
}

fn config(pairs: &[(&str, &str)]) -> AppConfig {
    let pairs: Vec<(String, String)> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
        .expect("valid test config")
}

fn app(pairs: &[(&str, &str)]) -> Router {
    let ctx = context(pairs);
    let limiter = RateLimiter::new(ctx.config.rate_limit);
    build_app(ctx, &limiter)
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    use tower::ServiceExt;
    app.clone().oneshot(request).await.unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Route table
// ============================================================================

mod routes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health_check_get_and_post() {
        let app = app(&[]);

        for method in [Method::GET, Method::POST] {
            let response = send(&app, request(method, "/health-check")).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = json(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["message"], "Service is healthy");
            assert_eq!(body["responseObject"], Value::Null);
            assert_eq!(body["statusCode"], 200);
        }
    }

    #[tokio::test]
    async fn test_list_users() {
        let response = send(&app(&[]), request(Method::GET, "/users")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["message"], "Users found");
        let users = body["responseObject"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["name"], "Alice");
        assert!(users[0].get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let app = app(&[]);

        let found = send(&app, request(Method::GET, "/users/2")).await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(json(found).await["responseObject"]["email"], "robert@example.com");

        let missing = send(&app, request(Method::GET, "/users/99")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let body = json(missing).await;
        assert_eq!(body["message"], "User not found");
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_user_ids() {
        let app = app(&[]);

        let cases = [
            ("/users/abc", "Invalid input: ID must be a numeric value"),
            ("/users/0", "Invalid input: ID must be a positive number"),
            ("/users/-3", "Invalid input: ID must be a positive number"),
        ];

        for (uri, message) in cases {
            let response = send(&app, request(Method::GET, uri)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = json(response).await;
            assert_eq!(body["kind"], "validation");
            assert_eq!(body["message"], message);
            assert_eq!(body["statusCode"], 400);
        }
    }

    #[tokio::test]
    async fn test_swagger_document() {
        let response = send(&app(&[]), request(Method::GET, "/swagger.json")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert!(body["openapi"].is_string());
        assert!(body["paths"].get("/health-check").is_some());
        assert!(body["paths"].get("/users/{id}").is_some());
    }

    #[tokio::test]
    async fn test_docs_ui_keeps_its_own_csp() {
        let response = send(&app(&[]), request(Method::GET, "/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let csp = response.headers()[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.contains("unpkg.com"));
    }

    #[tokio::test]
    async fn test_docs_ui_page_points_at_document() {
        let response = send(&app(&[]), request(Method::GET, "/")).await;
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r##"dom_id: "#swagger-ui""##));
        assert!(html.contains(r#"url: "/swagger.json""#));
    }

    #[tokio::test]
    async fn test_empty_user_store() {
        let ctx = AppContext::with_users(config(&[]), UserRepository::new(Vec::new())).shared();
        let limiter = RateLimiter::new(ctx.config.rate_limit);
        let app = build_app(ctx, &limiter);

        let response = send(&app, request(Method::GET, "/users")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json(response).await;
        assert_eq!(body["message"], "No Users found");
        assert_eq!(body["kind"], "not_found");
    }
}

// ============================================================================
// Error normalization
// ============================================================================

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unknown_path_is_normalized() {
        let response = send(&app(&[]), request(Method::GET, "/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["message"], "Not Found");
        assert_eq!(body["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_wrong_method_is_normalized() {
        let response = send(&app(&[]), request(Method::DELETE, "/health-check")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let body = json(response).await;
        assert_eq!(body["kind"], "method_not_allowed");
        assert_eq!(body["statusCode"], 405);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = app(&[("MAX_BODY_BYTES", "16")]);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/health-check")
            .header(header::CONTENT_LENGTH, "64")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json(response).await["kind"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_generic_500() {
        let ctx = context(&[]);
        let limiter = RateLimiter::new(ctx.config.rate_limit);
        let routes = Router::new().route(
            "/boom",
            get(|| async {
                let exploding = true;
                if exploding {
                    panic!("secret detail");
                }
                "unreachable"
            }),
        );
        let app = pipeline::apply(routes, &ctx, &limiter);

        let response = send(&app, request(Method::GET, "/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json(response).await;
        assert_eq!(body["kind"], "internal");
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("secret detail"));
    }
}

// ============================================================================
// Pipeline stages
// ============================================================================

mod stages {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_security_and_cors_headers() {
        let app = app(&[]);
        let request = Request::builder()
            .uri("/health-check")
            .header(header::ORIGIN, "http://localhost:8080")
            .body(Body::empty())
            .unwrap();

        let response = send(&app, request).await;
        let headers = response.headers();

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:8080");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(!headers.contains_key("x-powered-by"));
    }

    #[tokio::test]
    async fn test_disallowed_origin_gets_no_cors_grant() {
        let request = Request::builder()
            .uri("/health-check")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = send(&app(&[]), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health-check")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();

        let response = send(&app(&[]), request).await;
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn test_rate_limited_requests_never_reach_handlers() {
        let ctx = context(&[
            ("COMMON_RATE_LIMIT_MAX_REQUESTS", "2"),
            ("COMMON_RATE_LIMIT_WINDOW_MS", "60000"),
        ]);
        let limiter = RateLimiter::new(ctx.config.rate_limit);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let routes = Router::new().route(
            "/count",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        );
        let app = pipeline::apply(routes, &ctx, &limiter);

        for _ in 0..2 {
            let response = send(&app, request(Method::GET, "/count")).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key("ratelimit-remaining"));
        }

        let limited = send(&app, request(Method::GET, "/count")).await;
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(limited.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(limited.headers()["x-content-type-options"], "nosniff");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        let body = json(limited).await;
        assert_eq!(body["kind"], "rate_limited");
        assert_eq!(body["message"], RATE_LIMIT_MESSAGE);
        assert_eq!(body["statusCode"], 429);
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client() {
        let app = app(&[
            ("COMMON_RATE_LIMIT_MAX_REQUESTS", "1"),
            ("COMMON_RATE_LIMIT_WINDOW_MS", "60000"),
        ]);

        let first = send(&app, request(Method::GET, "/health-check")).await;
        assert_eq!(first.status(), StatusCode::OK);

        let other_client = Request::builder()
            .uri("/health-check")
            .header("x-forwarded-for", "198.51.100.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, other_client).await.status(), StatusCode::OK);

        let repeat = send(&app, request(Method::GET, "/health-check")).await;
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_throttled_requests_skip_request_log() {
        let app = app(&[
            ("COMMON_RATE_LIMIT_MAX_REQUESTS", "1"),
            ("COMMON_RATE_LIMIT_WINDOW_MS", "60000"),
        ]);

        // Only requests that pass the rate limit reach the logging stage,
        // which is what tags responses with a request id.
        let admitted = send(&app, request(Method::GET, "/health-check")).await;
        assert_eq!(admitted.status(), StatusCode::OK);
        assert!(admitted.headers().contains_key("x-request-id"));

        let throttled = send(&app, request(Method::GET, "/health-check")).await;
        assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(!throttled.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ratelimit_reset_rounds_up() {
        // Default window is 1000 ms.
        let response = send(&app(&[]), request(Method::GET, "/health-check")).await;

        assert_eq!(response.headers()["ratelimit-limit"], "1000");
        assert_eq!(response.headers()["ratelimit-reset"], "1");
    }
}
