//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod catalog;
pub mod commands;
pub mod menu;
pub mod notifications;
pub mod router;
pub mod schema;
pub mod support;
pub mod types;
pub mod vacancy;

use teloxide::types::InlineKeyboardButton;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};

/// Shorthand for an inline callback button.
pub fn cb<T: Into<String>, D: Into<String>>(text: T, data: D) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.into())
}
