//! Outbound calls made on behalf of command handlers.
//!
//! Handlers talk to third parties only through [`OutboundGateway`]: a price feed
//! and a messenger, both behind traits so tests can swap in fakes that resolve
//! immediately. [`OutboundGateway::schedule`] runs a command on its own task and
//! hands back an [`OutboundCall`] without waiting for it.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use teloxide::types::ChatId;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::telegram::context::ChatContext;

/// Failures of third-party calls
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network error, timeout or undecodable body
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Third party answered with a non-success status
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    /// Price response did not contain the requested pair
    #[error("no {currency} quote for {asset}")]
    MissingQuote { asset: String, currency: String },

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Service could not be reached for another reason
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// A quoted price, kept as the JSON number the API returned.
///
/// `2500`, `2500.0` print as `2500` and `2500.5` as `2500.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Price(serde_json::Number);

impl Price {
    pub fn new(value: impl Into<serde_json::Number>) -> Self {
        Self(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }
}

impl From<serde_json::Number> for Price {
    fn from(value: serde_json::Number) -> Self {
        Self(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display drops a zero fraction, the JSON writer keeps it.
        match self.0.as_f64() {
            Some(value) if self.0.is_f64() => fmt::Display::fmt(&value, f),
            _ => fmt::Display::fmt(&self.0, f),
        }
    }
}

/// Price-quote service
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Current price of `asset` (e.g. `ethereum`) in `currency` (e.g. `usd`)
    async fn spot_price(&self, asset: &str, currency: &str) -> Result<Price, GatewayError>;
}

/// Chat messaging service
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), GatewayError>;
}

/// How a scheduled command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// Handler returned an error (already logged)
    Failed(String),
    /// Handler panicked (already logged)
    Panicked,
    /// Task was dropped before finishing, e.g. on runtime shutdown
    Cancelled,
}

/// Handle to a scheduled command.
///
/// Dropping it does not cancel the work; it only gives up the ability to
/// observe the outcome.
#[derive(Debug)]
pub struct OutboundCall {
    label: String,
    completion: oneshot::Receiver<CommandOutcome>,
}

impl OutboundCall {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Waits for the scheduled work to finish.
    pub async fn completed(self) -> CommandOutcome {
        self.completion.await.unwrap_or(CommandOutcome::Cancelled)
    }
}

/// Entry point for every outbound call a handler makes
#[derive(Clone)]
pub struct OutboundGateway {
    prices: Arc<dyn PriceFeed>,
    messenger: Arc<dyn Messenger>,
}

impl OutboundGateway {
    pub fn new(prices: Arc<dyn PriceFeed>, messenger: Arc<dyn Messenger>) -> Self {
        Self { prices, messenger }
    }

    /// Fetches a fresh quote. No caching, no retry.
    pub async fn spot_price(&self, asset: &str, currency: &str) -> Result<Price, GatewayError> {
        self.prices.spot_price(asset, currency).await
    }

    /// Sends `text` to the chat the command came from.
    pub async fn reply(&self, ctx: &ChatContext, text: &str) -> Result<(), GatewayError> {
        self.messenger.send_text(ctx.chat_id(), text).await
    }

    /// Runs `work` on its own task and returns immediately.
    ///
    /// Panics inside `work` are caught and reported as [`CommandOutcome::Panicked`].
    pub fn schedule<F>(&self, label: impl Into<String>, work: F) -> OutboundCall
    where
        F: Future<Output = CommandOutcome> + Send + 'static,
    {
        let label = label.into();
        let (tx, rx) = oneshot::channel();
        let task_label = label.clone();

        tokio::spawn(async move {
            let outcome = match tokio::spawn(work).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    tracing::error!(command = %task_label, "command task panicked");
                    CommandOutcome::Panicked
                }
                Err(_) => CommandOutcome::Cancelled,
            };
            // Nobody listening is fine.
            let _ = tx.send(outcome);
        });

        OutboundCall {
            label,
            completion: rx,
        }
    }
}

impl fmt::Debug for OutboundGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundGateway").finish_non_exhaustive()
    }
}
