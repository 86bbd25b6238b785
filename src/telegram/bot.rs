//! Bot initialization and the teloxide update loop
//!
//! This module contains:
//! - Bot instance creation
//! - The Telegram-backed [`Messenger`]
//! - Command menu publishing
//! - The long-polling loop feeding [`LaunchedDispatcher`]

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ChatId};

use crate::core::config::BotConfig;
use crate::core::{AppContext, AppError, AppResult};
use crate::telegram::coingecko::CoinGeckoClient;
use crate::telegram::commands::register_default_commands;
use crate::telegram::context::ChatContext;
use crate::telegram::dispatcher::{CommandDispatcher, LaunchedDispatcher};
use crate::telegram::gateway::{GatewayError, Messenger, OutboundGateway};

const SHUTDOWN_ATTEMPTS: u32 = 50;
const SHUTDOWN_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Creates a Bot instance with custom or default API URL
///
/// # Errors
/// * `AppError::Missing` - no token configured
/// * `AppError::Http` - HTTP client could not be built
pub fn create_bot(config: &BotConfig) -> AppResult<Bot> {
    let token = config.token.as_ref().ok_or(AppError::Missing("BOT_TOKEN"))?;
    let client = teloxide::net::default_reqwest_settings().build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    Ok(match &config.api_url {
        Some(url) => {
            tracing::info!(api_url = %url, "using custom Bot API URL");
            bot.set_api_url(url.clone())
        }
        None => bot,
    })
}

/// [`Messenger`] that sends plain text through the Bot API
#[derive(Debug, Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), GatewayError> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }
}

/// Sets up bot commands in Telegram UI.
///
/// Commands without a description are left out of the menu.
pub async fn publish_commands(bot: &Bot, dispatcher: &LaunchedDispatcher) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = dispatcher
        .commands()
        .into_iter()
        .filter(|(_, description)| !description.is_empty())
        .map(|(name, description)| BotCommand::new(name, description))
        .collect();

    bot.set_my_commands(commands).await?;
    Ok(())
}

/// Runs long polling until `shutdown` resolves.
///
/// Each text message is handed to `dispatcher` without waiting for the handler,
/// so a slow price lookup never delays the next update.
pub async fn run_bot<S>(bot: Bot, dispatcher: LaunchedDispatcher, shutdown: S)
where
    S: Future<Output = ()> + Send + 'static,
{
    let handler = Update::filter_message().endpoint(|msg: Message, dispatcher: LaunchedDispatcher| async move {
        if let Some(ctx) = ChatContext::from_message(&msg) {
            // Outcome is logged by the dispatcher.
            let _ = dispatcher.dispatch(ctx);
        }
        respond(())
    });

    let mut update_loop = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|update| async move {
            tracing::trace!(update_id = update.id.0, "unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("An error from the update handler"))
        .build();

    let token = update_loop.shutdown_token();
    tokio::spawn(async move {
        shutdown.await;
        // The token refuses while the loop is still starting up.
        for _ in 0..SHUTDOWN_ATTEMPTS {
            match token.shutdown() {
                Ok(done) => return done.await,
                Err(_) => tokio::time::sleep(SHUTDOWN_RETRY_DELAY).await,
            }
        }
        tracing::warn!("bot update loop did not accept shutdown");
    });

    tracing::info!("starting bot in long polling mode");
    update_loop.dispatch().await;
    tracing::info!("bot update loop stopped");
}

/// Builds the command dispatcher from configuration and runs the bot.
///
/// A failed menu upload is logged and does not stop startup.
pub async fn start_bot<S>(ctx: Arc<AppContext>, shutdown: S) -> AppResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let bot = create_bot(&ctx.config.bot)?;
    let me = bot.get_me().await?;
    tracing::info!(username = ?me.username, "bot authorized");

    let outbound = &ctx.config.outbound;
    let prices = CoinGeckoClient::new(&outbound.price_api_url, outbound.timeout)?;
    let gateway = OutboundGateway::new(Arc::new(prices), Arc::new(TelegramMessenger::new(bot.clone())));

    let mut dispatcher = CommandDispatcher::new(gateway);
    if let Some(username) = me.username.clone() {
        dispatcher = dispatcher.with_bot_username(username);
    }
    register_default_commands(&mut dispatcher);
    let launched = dispatcher.launch();

    if let Err(e) = publish_commands(&bot, &launched).await {
        tracing::warn!(error = %e, "failed to publish bot commands");
    }

    run_bot(bot, launched, shutdown).await;
    Ok(())
}
