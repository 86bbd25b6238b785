use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chipmunk")]
#[command(author, version, about = "HTTP API and Telegram bot for the Chipmunk Kombat app", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server and the bot (default)
    Run,

    /// Run only the HTTP server
    Serve,

    /// Run only the bot (requires BOT_TOKEN)
    Bot,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Selected subcommand, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}
