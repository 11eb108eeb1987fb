//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_help, handle_start, handle_unknown_command};
use super::router::{classify, Inbound, MenuAction};
use super::types::{remember_user, HandlerDeps, HandlerError, UserInfo};
use super::{admin, catalog, support, vacancy};
use crate::i18n;
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's
/// Dispatcher. The same schema is used in production and in integration
/// tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_admin_reply = deps.clone();
    let deps_panel = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps.clone();

    dptree::entry()
        // Admin reply-to must win over the generic message branch
        .branch(admin_reply_handler(deps_admin_reply))
        // Hidden admin command (not in Command enum)
        .branch(panel_handler(deps_panel))
        // Public commands
        .branch(command_handler(deps_commands))
        // Menu labels and free text
        .branch(message_handler(deps_messages))
        // Callback query handler
        .branch(callback_handler(deps_callback))
}

/// Handler for admin replies to forwarded customer messages. Resolution
/// happens in the chain: a reply that maps to no forwarded message yields
/// no `AdminReply`, so the update falls through to the normal branches
/// instead of being consumed here.
fn admin_reply_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let resolve_deps = deps.clone();
    Update::filter_message()
        .filter_map(move |msg: Message| admin::resolve_admin_reply(&resolve_deps, &msg))
        .endpoint(move |bot: Bot, msg: Message, reply: admin::AdminReply| {
            let deps = deps.clone();
            async move { admin::handle_admin_reply(&bot, &deps, &msg, reply).await }
        })
}

/// Handler for the hidden /panel admin command (not in Command enum)
fn panel_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.text().map(|text| text.starts_with("/panel")).unwrap_or(false)
                && msg
                    .from
                    .as_ref()
                    .and_then(|u| i64::try_from(u.id.0).ok())
                    .map(admin::is_admin)
                    .unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                admin::show_panel(&bot, &deps, msg.chat.id, 0).await?;
                Ok(())
            }
        })
}

/// Handler for /start and /help
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let user = UserInfo::from_message(&msg);
                remember_user(&deps, &user);
                let lang = i18n::lang_from_telegram(user.language_code.as_deref());

                match cmd {
                    Command::Start => handle_start(&bot, &user, &lang).await?,
                    Command::Help => handle_help(&bot, msg.chat.id, &lang).await?,
                }
                Ok(())
            }
        })
}

/// Handler for menu labels and free text
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let user = UserInfo::from_message(&msg);
                remember_user(&deps, &user);
                let lang = i18n::lang_from_telegram(user.language_code.as_deref());
                let text = msg.text().unwrap_or_default();

                // A questionnaire in progress swallows everything
                if vacancy::handle_vacancy_input(&bot, &deps, &user, &lang, text).await? {
                    return Ok(());
                }

                match classify(text) {
                    // Known commands are consumed by command_handler above;
                    // these arms only fire for odd spacing variants
                    Inbound::Start => handle_start(&bot, &user, &lang).await?,
                    Inbound::Help => handle_help(&bot, msg.chat.id, &lang).await?,
                    Inbound::UnknownCommand => handle_unknown_command(&bot, msg.chat.id, &lang).await?,
                    Inbound::Menu(MenuAction::Support) => {
                        support::open_support_menu(&bot, msg.chat.id, user.chat_id, &lang).await?
                    }
                    Inbound::Menu(MenuAction::Vacancies) => {
                        vacancy::start_vacancy(&bot, &deps, msg.chat.id, &lang).await?
                    }
                    Inbound::Menu(MenuAction::MyChats) => {
                        support::show_my_chats(&bot, &deps, msg.chat.id, &lang).await?
                    }
                    Inbound::Menu(MenuAction::Order) => {
                        use fluent_templates::fluent_bundle::FluentArgs;

                        use crate::core::config;

                        let mut args = FluentArgs::new();
                        args.set("site", config::SITE_URL.as_str());
                        bot.send_message(msg.chat.id, i18n::t_args(&lang, "order-info", &args))
                            .await?;
                    }
                    Inbound::Menu(MenuAction::Catalog) => {
                        catalog::show_categories(&bot, &deps, msg.chat.id, &lang).await?
                    }
                    Inbound::Free(free_text) => {
                        support::relay_free_text(&bot, &deps, &user, &lang, free_text).await?
                    }
                }
                Ok(())
            }
        })
}

/// Handler for inline keyboard callbacks
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let _ = bot.answer_callback_query(q.id.clone()).await;

            let Some(data) = q.data.as_deref() else {
                return Ok(());
            };
            let user_id = i64::try_from(q.from.id.0).unwrap_or(0);
            let chat_id = q.message.as_ref().map(|m| m.chat().id).unwrap_or(ChatId(user_id));
            let lang = i18n::lang_from_telegram(q.from.language_code.as_deref());

            if let Some(key) = data.strip_prefix("topic_") {
                support::handle_topic_selected(&bot, &deps, chat_id, key, &lang).await?;
            } else if let Some(id) = data.strip_prefix("claim_").and_then(|s| s.parse::<i64>().ok()) {
                admin::handle_claim(&bot, &deps, chat_id, user_id, &q.from.first_name, id, &lang).await?;
            } else if data == "check_sub" {
                support::handle_subscription_check(&bot, chat_id, user_id, &lang).await?;
            } else if let Some(rest) = data.strip_prefix("rate_") {
                if let Some((id, rating)) = parse_rating(rest) {
                    admin::handle_rating(&bot, &deps, chat_id, id, rating, &lang).await?;
                }
            } else if data == "my_chats" {
                support::show_my_chats(&bot, &deps, chat_id, &lang).await?;
            } else if let Some(id) = data.strip_prefix("view_ticket_").and_then(|s| s.parse::<i64>().ok()) {
                support::show_ticket(&bot, &deps, chat_id, id, &lang).await?;
            } else if data == "back_to_menu" {
                support::back_to_menu(&bot, chat_id, &lang).await?;
            } else if let Some(page) = data.strip_prefix("panel_page_").and_then(|s| s.parse::<i64>().ok()) {
                if admin::is_admin(user_id) {
                    admin::show_panel(&bot, &deps, chat_id, page).await?;
                }
            } else if let Some(id) = data.strip_prefix("panel_view_").and_then(|s| s.parse::<i64>().ok()) {
                if admin::is_admin(user_id) {
                    admin::show_panel_ticket(&bot, &deps, chat_id, id).await?;
                }
            } else if let Some(category) = data.strip_prefix("cat_") {
                catalog::show_category(&bot, &deps, chat_id, category, &lang).await?;
            } else if let Some(id) = data.strip_prefix("prod_") {
                catalog::show_product(&bot, &deps, chat_id, id, &lang).await?;
            } else if data == "catalog_menu" {
                catalog::show_categories(&bot, &deps, chat_id, &lang).await?;
            } else {
                log::warn!("Unhandled callback data: {}", data);
            }
            Ok(())
        }
    })
}

/// Split "rate_{id}_{n}" payload after the prefix.
fn parse_rating(rest: &str) -> Option<(i64, i32)> {
    let (id, rating) = rest.rsplit_once('_')?;
    Some((id.parse().ok()?, rating.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rating_accepts_valid_payloads() {
        assert_eq!(parse_rating("17_5"), Some((17, 5)));
        assert_eq!(parse_rating("3_1"), Some((3, 1)));
    }

    #[test]
    fn parse_rating_rejects_malformed_payloads() {
        assert_eq!(parse_rating("17"), None);
        assert_eq!(parse_rating("x_5"), None);
        assert_eq!(parse_rating("17_y"), None);
    }
}
