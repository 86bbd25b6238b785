//! Telegram bot integration: command dispatch and outbound calls

pub mod bot;
pub mod coingecko;
pub mod commands;
pub mod context;
pub mod dispatcher;
pub mod gateway;

// Re-exports for convenience
pub use bot::{create_bot, start_bot, TelegramMessenger};
pub use context::ChatContext;
pub use dispatcher::{CommandDispatcher, Dispatch, LaunchedDispatcher};
pub use gateway::{CommandOutcome, OutboundGateway};
