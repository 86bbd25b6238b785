//! Chipmunk - HTTP API and Telegram bot for the Chipmunk Kombat app
//!
//! # Module Structure
//!
//! - `core`: configuration, shared context, errors, logging, rate limiting
//! - `web`: HTTP middleware pipeline and route table
//! - `telegram`: bot command dispatcher and outbound call gateway
//! - `cli`: command-line arguments

pub mod cli;
pub mod core;
pub mod telegram;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::core::{AppConfig, AppContext, AppError, AppResult};
pub use crate::web::{build_app, start_web_server};
