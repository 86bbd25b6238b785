//! Bot command dispatcher.
//!
//! Two states: [`CommandDispatcher`] collects registrations at startup, and
//! [`CommandDispatcher::launch`] freezes the table into a [`LaunchedDispatcher`],
//! the only form that can process updates. Unknown commands are ignored; handler
//! failures are logged here and never reach the update loop.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::telegram::context::{parse_command, ChatContext};
use crate::telegram::gateway::{CommandOutcome, GatewayError, OutboundCall, OutboundGateway};

/// Error type for command handlers
#[derive(Debug, Error)]
pub enum CommandError {
    /// An outbound call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Handler-specific failure
    #[error("{0}")]
    Handler(String),
}

pub type CommandResult = Result<(), CommandError>;

/// A bot command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Short text shown in the Telegram command menu; empty hides the command
    fn description(&self) -> &str {
        ""
    }

    async fn handle(&self, ctx: &ChatContext, gateway: &OutboundGateway) -> CommandResult;
}

/// Adapter turning an async closure into a [`CommandHandler`]
pub struct FnHandler<F> {
    f: F,
    description: &'static str,
}

/// Wraps `f` as a handler.
///
/// # Example
///
/// ```no_run
/// use chipmunk::telegram::dispatcher::{handler_fn, CommandDispatcher, CommandResult};
/// # fn demo(dispatcher: &mut CommandDispatcher) {
/// dispatcher.register("ping", handler_fn(|ctx, gateway| async move {
///     gateway.reply(&ctx, "pong").await?;
///     CommandResult::Ok(())
/// }));
/// # }
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(ChatContext, OutboundGateway) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    FnHandler { f, description: "" }
}

impl<F> FnHandler<F> {
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(ChatContext, OutboundGateway) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    fn description(&self) -> &str {
        self.description
    }

    async fn handle(&self, ctx: &ChatContext, gateway: &OutboundGateway) -> CommandResult {
        (self.f)(ctx.clone(), gateway.clone()).await
    }
}

/// Result of [`LaunchedDispatcher::dispatch`]
#[derive(Debug)]
pub enum Dispatch {
    /// Not a command, unknown name, or addressed to another bot
    Ignored,
    /// Handler started on its own task
    Scheduled(OutboundCall),
}

impl Dispatch {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Dispatch::Ignored)
    }

    /// Waits for the scheduled handler, if any.
    pub async fn outcome(self) -> Option<CommandOutcome> {
        match self {
            Dispatch::Ignored => None,
            Dispatch::Scheduled(call) => Some(call.completed().await),
        }
    }
}

struct Registry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
    gateway: OutboundGateway,
    bot_username: Option<String>,
}

/// Dispatcher before launch: accepts registrations, processes nothing
pub struct CommandDispatcher {
    registry: Registry,
}

impl CommandDispatcher {
    pub fn new(gateway: OutboundGateway) -> Self {
        Self {
            registry: Registry {
                handlers: HashMap::new(),
                gateway,
                bot_username: None,
            },
        }
    }

    /// Commands explicitly addressed to another bot (`/start@OtherBot`) are
    /// ignored once the own username is known.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.registry.bot_username = Some(username.into());
        self
    }

    /// Binds `name` to `handler`. Registering a name again replaces the
    /// previous handler.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        let name = name.into().trim_start_matches('/').to_string();
        if self.registry.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(command = %name, "command handler replaced");
        }
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.registry.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.handlers.is_empty()
    }

    /// Freezes the registration table and starts accepting updates.
    pub fn launch(self) -> LaunchedDispatcher {
        let mut names: Vec<&str> = self.registry.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        tracing::info!(commands = ?names, "command dispatcher launched");

        LaunchedDispatcher {
            registry: Arc::new(self.registry),
        }
    }
}

/// Dispatcher after launch: read-only table, cheap to clone
#[derive(Clone)]
pub struct LaunchedDispatcher {
    registry: Arc<Registry>,
}

impl LaunchedDispatcher {
    /// Routes one chat update to its handler.
    ///
    /// Returns without waiting for the handler; the returned [`Dispatch`] can be
    /// awaited or dropped.
    pub fn dispatch(&self, ctx: ChatContext) -> Dispatch {
        let Some(parsed) = parse_command(ctx.text()) else {
            return Dispatch::Ignored;
        };

        if let (Some(mention), Some(own)) = (parsed.mention, self.registry.bot_username.as_deref()) {
            if !mention.eq_ignore_ascii_case(own) {
                return Dispatch::Ignored;
            }
        }

        let Some(handler) = self.registry.handlers.get(parsed.name).cloned() else {
            tracing::debug!(command = parsed.name, chat_id = ctx.chat_id().0, "unknown command ignored");
            return Dispatch::Ignored;
        };

        let name = parsed.name.to_string();
        tracing::info!(command = %name, chat_id = ctx.chat_id().0, "dispatching command");

        let gateway = self.registry.gateway.clone();
        let task_name = name.clone();
        let work = async move {
            match handler.handle(&ctx, &gateway).await {
                Ok(()) => CommandOutcome::Completed,
                Err(e) => {
                    tracing::error!(
                        command = %task_name,
                        chat_id = ctx.chat_id().0,
                        error = %e,
                        "command handler failed"
                    );
                    CommandOutcome::Failed(e.to_string())
                }
            }
        };

        Dispatch::Scheduled(self.registry.gateway.schedule(name, work))
    }

    /// Registered commands with their menu descriptions, sorted by name
    pub fn commands(&self) -> Vec<(String, String)> {
        let mut commands: Vec<(String, String)> = self
            .registry
            .handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.description().to_string()))
            .collect();
        commands.sort();
        commands
    }
}
