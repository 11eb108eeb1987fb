//! Customer-facing support flow: topic selection, ticket creation and
//! continuation, the "my chats" history view.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, Recipient, UserId};
use unic_langid::LanguageIdentifier;

use crate::core::config;
use crate::i18n;
use crate::storage::{get_connection, tickets};
use crate::telegram::cb;
use crate::telegram::menu::{self, main_keyboard, topic_keyboard};
use crate::telegram::notifications::{notify_new_ticket, notify_ticket_continuation};
use crate::telegram::router::{decide_relay, RelayDecision};
use crate::telegram::types::{HandlerDeps, HandlerError, UserInfo};

/// True when the user is a member of every required channel. An empty
/// channel list disables the gate. Lookup failures count as subscribed so
/// a misconfigured channel never locks customers out.
pub async fn is_subscribed(bot: &Bot, user_id: i64) -> bool {
    let Ok(user_id) = u64::try_from(user_id) else {
        return true;
    };
    for channel in config::REQUIRED_CHANNELS.iter() {
        match bot
            .get_chat_member(Recipient::ChannelUsername(channel.clone()), UserId(user_id))
            .await
        {
            Ok(member) => {
                if !(member.kind.is_owner() || member.kind.is_administrator() || member.kind.is_member()) {
                    return false;
                }
            }
            Err(e) => log::error!("Failed to check membership in {}: {}", channel, e),
        }
    }
    true
}

/// Entry to the support flow: the topic menu, behind the channel gate.
pub async fn open_support_menu(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if !is_subscribed(bot, user_id).await {
        let mut args = FluentArgs::new();
        args.set("channels", config::REQUIRED_CHANNELS.join("\n"));
        let keyboard = InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "subscribe-confirm"), "check_sub")]]);
        bot.send_message(chat_id, i18n::t_args(lang, "subscribe-required", &args))
            .reply_markup(keyboard)
            .await?;
        return Ok(());
    }
    show_topic_menu(bot, chat_id, lang).await
}

/// The "I joined" button under the subscription prompt.
pub async fn handle_subscription_check(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if is_subscribed(bot, user_id).await {
        show_topic_menu(bot, chat_id, lang).await
    } else {
        bot.send_message(chat_id, i18n::t(lang, "subscribe-not-yet")).await?;
        Ok(())
    }
}

/// Show the support topic keyboard.
pub async fn show_topic_menu(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "choose-topic"))
        .reply_markup(topic_keyboard())
        .await?;
    Ok(())
}

/// A topic button was pressed: remember it for the next free-text message.
pub async fn handle_topic_selected(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    topic_key: &str,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if !menu::is_known_topic(topic_key) {
        log::warn!("Unknown topic key in callback: {}", topic_key);
        return Ok(());
    }
    deps.pending_topics.insert(chat_id.0, topic_key.to_string());
    bot.send_message(chat_id, i18n::t(lang, "topic-saved")).await?;
    Ok(())
}

/// Relay free text: new ticket, continuation, or menu re-prompt.
pub async fn relay_free_text(
    bot: &Bot,
    deps: &HandlerDeps,
    user: &UserInfo,
    lang: &LanguageIdentifier,
    text: &str,
) -> Result<(), HandlerError> {
    let chat_id = ChatId(user.chat_id);

    let pending = deps.pending_topics.get(&user.chat_id).map(|t| t.value().clone());
    let open_ticket_id = match get_connection(&deps.db_pool) {
        Ok(conn) => match tickets::find_open_ticket(&conn, user.chat_id) {
            Ok(ticket) => ticket.map(|t| t.ticket_id),
            Err(e) => {
                log::error!("find_open_ticket failed for {}: {}", user.chat_id, e);
                None
            }
        },
        Err(e) => {
            log::error!("Failed to get DB connection: {}", e);
            bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
            return Ok(());
        }
    };

    match decide_relay(pending, open_ticket_id) {
        RelayDecision::NewTicket { topic } => {
            let conn = match get_connection(&deps.db_pool) {
                Ok(conn) => conn,
                Err(e) => {
                    log::error!("Failed to get DB connection: {}", e);
                    bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
                    return Ok(());
                }
            };
            // Not wrapped in a transaction: a crash here leaves an empty
            // ticket, which the admin panel tolerates.
            let ticket_id = match tickets::create_ticket(&conn, user.chat_id, &topic) {
                Ok(id) => id,
                Err(e) => {
                    log::error!("create_ticket failed for {}: {}", user.chat_id, e);
                    bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
                    return Ok(());
                }
            };
            if let Err(e) = tickets::append_message(&conn, ticket_id, user.chat_id, Some(&user.display_name()), text) {
                log::error!("append_message failed for ticket {}: {}", ticket_id, e);
            }
            drop(conn);
            deps.pending_topics.remove(&user.chat_id);

            let mut args = FluentArgs::new();
            args.set("id", ticket_id);
            bot.send_message(chat_id, i18n::t_args(lang, "ticket-created", &args))
                .await?;

            notify_new_ticket(bot, &deps.db_pool, ticket_id, &topic, &user.display_name(), user.chat_id, text).await;
        }
        RelayDecision::Append { ticket_id } => {
            match get_connection(&deps.db_pool) {
                Ok(conn) => {
                    if let Err(e) =
                        tickets::append_message(&conn, ticket_id, user.chat_id, Some(&user.display_name()), text)
                    {
                        log::error!("append_message failed for ticket {}: {}", ticket_id, e);
                        bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
                        return Ok(());
                    }
                }
                Err(e) => {
                    log::error!("Failed to get DB connection: {}", e);
                    bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
                    return Ok(());
                }
            }

            let mut args = FluentArgs::new();
            args.set("id", ticket_id);
            bot.send_message(chat_id, i18n::t_args(lang, "message-appended", &args))
                .await?;

            notify_ticket_continuation(bot, &deps.db_pool, ticket_id, &user.display_name(), text).await;
        }
        RelayDecision::Reprompt => {
            bot.send_message(chat_id, i18n::t(lang, "menu-reprompt"))
                .reply_markup(main_keyboard())
                .await?;
        }
    }

    Ok(())
}

/// List the user's tickets with a view button per ticket.
pub async fn show_my_chats(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let list = match get_connection(&deps.db_pool) {
        Ok(conn) => tickets::list_for_user(&conn, chat_id.0).unwrap_or_default(),
        Err(e) => {
            log::error!("Failed to get DB connection: {}", e);
            Vec::new()
        }
    };

    if list.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "my-chats-empty")).await?;
        return Ok(());
    }

    let mut rows: Vec<Vec<_>> = list
        .iter()
        .map(|t| {
            let status_mark = if t.status == "open" { "🟢" } else { "⚪" };
            vec![cb(
                format!("{status_mark} #{} {}", t.ticket_id, menu::topic_title(&t.topic)),
                format!("view_ticket_{}", t.ticket_id),
            )]
        })
        .collect();
    rows.push(vec![cb(i18n::t(lang, "back-to-menu"), "back_to_menu")]);

    bot.send_message(chat_id, i18n::t(lang, "my-chats-title"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Show one ticket's message log.
pub async fn show_ticket(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    ticket_id: i64,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get DB connection: {}", e);
            bot.send_message(chat_id, i18n::t(lang, "retry-later")).await?;
            return Ok(());
        }
    };

    let Some(ticket) = tickets::get_ticket(&conn, ticket_id).ok().flatten() else {
        bot.send_message(chat_id, i18n::t(lang, "my-chats-empty")).await?;
        return Ok(());
    };
    // Only the owner may read the log
    if ticket.user_id != chat_id.0 {
        log::warn!("User {} tried to view foreign ticket {}", chat_id.0, ticket_id);
        return Ok(());
    }

    let mut args = FluentArgs::new();
    args.set("id", ticket.ticket_id);
    args.set("topic", menu::topic_title(&ticket.topic));
    args.set("status", ticket.status.as_str());
    let mut text = i18n::t_args(lang, "ticket-view-header", &args);

    for message in tickets::messages_for_ticket(&conn, ticket_id).unwrap_or_default() {
        let sender = message.sender_name.unwrap_or_else(|| message.sender_id.to_string());
        text.push_str(&format!("\n\n{}: {}", sender, message.message_text));
    }

    let keyboard = InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "back-to-menu"), "back_to_menu")]]);
    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}

/// Re-show the main reply keyboard.
pub async fn back_to_menu(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "help"))
        .reply_markup(main_keyboard())
        .await?;
    Ok(())
}
