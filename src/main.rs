use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

use chipmunk::cli::{Cli, Commands};
use chipmunk::core::{init_logger, AppConfig, AppContext};
use chipmunk::telegram::start_bot;
use chipmunk::web::start_web_server;

/// Main entry point
///
/// Parses CLI arguments and runs the HTTP server, the bot, or both.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging, socket bind, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = AppConfig::from_env()?;
    init_logger(&config.log_filter)?;

    let ctx = AppContext::new(config).shared();
    let shutdown = shutdown_channel();

    match cli.command() {
        Commands::Run => {
            tracing::info!("running HTTP server and bot");
            let bot = run_bot_if_configured(Arc::clone(&ctx), shutdown.clone());
            let http = start_web_server(Arc::clone(&ctx), wait_for_shutdown(shutdown));
            let ((), http) = tokio::join!(bot, http);
            http?;
        }
        Commands::Serve => {
            tracing::info!("running HTTP server only");
            start_web_server(Arc::clone(&ctx), wait_for_shutdown(shutdown)).await?;
        }
        Commands::Bot => {
            tracing::info!("running bot only");
            start_bot(Arc::clone(&ctx), wait_for_shutdown(shutdown)).await?;
        }
    }

    tracing::info!(uptime_secs = ctx.started_at.elapsed().as_secs(), "shutdown complete");
    Ok(())
}

/// Bot half of `run`: skipped without a token, failures do not stop the HTTP server.
async fn run_bot_if_configured(ctx: Arc<AppContext>, shutdown: watch::Receiver<bool>) {
    if ctx.config.bot.token.is_none() {
        tracing::warn!("BOT_TOKEN is not set, bot disabled");
        return;
    }
    if let Err(e) = start_bot(ctx, wait_for_shutdown(shutdown)).await {
        tracing::error!(error = %e, "bot stopped with an error");
    }
}

/// Flips to `true` on the first ctrl-c.
fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutting down gracefully...");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                // Sender stays alive: a closed channel would read as shutdown.
                std::future::pending::<()>().await;
            }
        }
    });
    rx
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
