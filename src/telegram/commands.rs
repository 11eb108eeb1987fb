//! /start and /help command handlers

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use crate::i18n;
use crate::telegram::menu::main_keyboard;
use crate::telegram::types::{HandlerError, UserInfo};

/// Greet and show the main reply keyboard.
pub async fn handle_start(bot: &Bot, user: &UserInfo, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    let mut args = FluentArgs::new();
    args.set("name", user.display_name());
    bot.send_message(ChatId(user.chat_id), i18n::t_args(lang, "greeting", &args))
        .reply_markup(main_keyboard())
        .await?;
    Ok(())
}

/// Fixed help text.
pub async fn handle_help(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "help")).await?;
    Ok(())
}

/// Fixed reply for any command outside the table.
pub async fn handle_unknown_command(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "unknown-command")).await?;
    Ok(())
}
