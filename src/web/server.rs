//! HTTP server entry point.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::core::context::AppContext;
use crate::core::error::AppResult;
use crate::core::rate_limiter::RateLimiter;
use crate::web::pipeline;
use crate::web::routes::route_table;

/// Smallest interval between rate-limit pruning passes
const MIN_PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Route table wrapped in the full middleware chain.
pub fn build_app(ctx: Arc<AppContext>, limiter: &RateLimiter) -> Router {
    let routes = route_table(Arc::clone(&ctx));
    pipeline::apply(routes, &ctx, limiter)
}

/// Binds `HOST:PORT` and serves until `shutdown` resolves.
pub async fn start_web_server<F>(ctx: Arc<AppContext>, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let limiter = RateLimiter::new(ctx.config.rate_limit);
    let app = build_app(Arc::clone(&ctx), &limiter);
    let pruner = spawn_pruner(limiter);

    let addr = ctx.config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        "Server ({}) running on http://{}",
        ctx.config.environment,
        listener.local_addr().map(|a| a.to_string()).unwrap_or(addr)
    );
    tracing::info!("HTTP pipeline: {}", pipeline::describe());

    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await;

    pruner.abort();
    tracing::info!("HTTP server stopped");
    result.map_err(Into::into)
}

fn spawn_pruner(limiter: RateLimiter) -> JoinHandle<()> {
    let period = limiter.config().window.max(MIN_PRUNE_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            limiter.prune_expired();
        }
    })
}
