//! Command handler implementations (/start, /info, /ethereum)

use async_trait::async_trait;

use crate::telegram::context::ChatContext;
use crate::telegram::dispatcher::{CommandDispatcher, CommandHandler, CommandResult};
use crate::telegram::gateway::{OutboundGateway, Price};

pub const WELCOME_MESSAGE: &str =
    "Hello there! Welcome to the Chipmunk Kombat App. respond to /info. Please try it";

/// Replies with the welcome text. No outbound calls besides the reply.
pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    fn description(&self) -> &str {
        "welcome message"
    }

    async fn handle(&self, ctx: &ChatContext, gateway: &OutboundGateway) -> CommandResult {
        tracing::info!(chat_id = ctx.chat_id().0, sender = ?ctx.sender_id(), "start command");
        gateway.reply(ctx, WELCOME_MESSAGE).await?;
        Ok(())
    }
}

/// Logs the request and stays silent.
///
/// Reserved for the web-app menu button; until that exists it must not reply.
pub struct InfoCommand;

#[async_trait]
impl CommandHandler for InfoCommand {
    fn description(&self) -> &str {
        "app information"
    }

    async fn handle(&self, ctx: &ChatContext, _gateway: &OutboundGateway) -> CommandResult {
        tracing::info!(
            chat_id = ctx.chat_id().0,
            sender = ?ctx.sender_id(),
            text = ctx.text(),
            "info command"
        );
        Ok(())
    }
}

/// Fetches a fresh quote for one asset and replies with it.
pub struct PriceCommand {
    asset: String,
    currency: String,
    description: &'static str,
}

impl PriceCommand {
    pub fn new(asset: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            currency: currency.into(),
            description: "",
        }
    }

    /// ETH in USD, bound to `/ethereum`
    pub fn ethereum() -> Self {
        Self {
            description: "current ethereum price",
            ..Self::new("ethereum", "usd")
        }
    }
}

#[async_trait]
impl CommandHandler for PriceCommand {
    fn description(&self) -> &str {
        self.description
    }

    async fn handle(&self, ctx: &ChatContext, gateway: &OutboundGateway) -> CommandResult {
        tracing::info!(chat_id = ctx.chat_id().0, sender = ?ctx.sender_id(), asset = %self.asset, "price command");

        let price = gateway.spot_price(&self.asset, &self.currency).await?;
        tracing::debug!(asset = %self.asset, currency = %self.currency, %price, "price received");

        gateway.reply(ctx, &price_message(&self.asset, &price, &self.currency)).await?;
        Ok(())
    }
}

/// `Hello, today the ethereum price is 2500USD`
pub fn price_message(asset: &str, price: &Price, currency: &str) -> String {
    format!("Hello, today the {} price is {}{}", asset, price, currency.to_uppercase())
}

/// Binds the built-in commands: `start`, `info`, `ethereum`.
pub fn register_default_commands(dispatcher: &mut CommandDispatcher) {
    dispatcher
        .register("start", StartCommand)
        .register("info", InfoCommand)
        .register("ethereum", PriceCommand::ethereum());
}
