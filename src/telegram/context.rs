//! Narrow view of an inbound chat update handed to command handlers.

use teloxide::types::{ChatId, Message, UserId};

/// The conversation a command came from.
///
/// Exposes exactly the chat, the sender and the raw text; handlers never see the
/// full Telegram message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    chat_id: ChatId,
    sender_id: Option<UserId>,
    text: String,
}

impl ChatContext {
    pub fn new(chat_id: ChatId, sender_id: Option<UserId>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender_id,
            text: text.into(),
        }
    }

    /// Extracts the context from a Telegram message.
    ///
    /// Returns `None` for messages without text (stickers, photos, service messages).
    pub fn from_message(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        Some(Self::new(msg.chat.id, msg.from.as_ref().map(|u| u.id), text))
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn sender_id(&self) -> Option<UserId> {
        self.sender_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A `/command` split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    /// Bot username after `@`, if the command was addressed explicitly
    pub mention: Option<&'a str>,
    /// Everything after the command token, trimmed
    pub args: &'a str,
}

/// Parses `/name`, `/name args` and `/name@BotName args`.
///
/// Returns `None` when the text is not a command.
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (token, args) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };

    let (name, mention) = match token.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (token, None),
    };

    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand { name, mention, args })
}
