//! Operator-side handlers: the /panel ticket list, claiming, replying via
//! reply-to, and the post-close rating.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, Message};
use unic_langid::LanguageIdentifier;

use crate::core::config::admin::{ADMIN_IDS, PANEL_PAGE_SIZE, TOPIC_ADMINS};
use crate::i18n;
use crate::storage::{get_connection, tickets};
use crate::telegram::cb;
use crate::telegram::menu::{self, rating_keyboard};
use crate::telegram::types::{HandlerDeps, HandlerError};

/// True for configured support operators, including per-topic ones.
pub fn is_admin(user_id: i64) -> bool {
    ADMIN_IDS.contains(&user_id) || TOPIC_ADMINS.iter().any(|(_, ids)| ids.contains(&user_id))
}

/// Show one page of open tickets.
pub async fn show_panel(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId, page: i64) -> Result<(), HandlerError> {
    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get DB connection for panel: {}", e);
            return Ok(());
        }
    };

    let total = tickets::count_open_tickets(&conn).unwrap_or(0);
    let page = page.max(0);
    let tickets_page = tickets::open_tickets_page(&conn, page * PANEL_PAGE_SIZE, PANEL_PAGE_SIZE).unwrap_or_default();
    drop(conn);

    if total == 0 {
        bot.send_message(chat_id, "✅ Ochiq murojaatlar yo'q.").await?;
        return Ok(());
    }

    let pages = (total + PANEL_PAGE_SIZE - 1) / PANEL_PAGE_SIZE;
    let mut rows: Vec<Vec<_>> = tickets_page
        .iter()
        .map(|t| {
            let claimed = if t.assigned_admin_id.is_some() { "👤" } else { "🆕" };
            vec![cb(
                format!("{claimed} #{} {} ({})", t.ticket_id, menu::topic_title(&t.topic), t.user_id),
                format!("panel_view_{}", t.ticket_id),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(cb("⬅️", format!("panel_page_{}", page - 1)));
    }
    if page + 1 < pages {
        nav.push(cb("➡️", format!("panel_page_{}", page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    bot.send_message(
        chat_id,
        format!("📋 Ochiq murojaatlar: {total}\nSahifa {}/{}", page + 1, pages),
    )
    .reply_markup(InlineKeyboardMarkup::new(rows))
    .await?;
    Ok(())
}

/// Show the full log of one ticket to an operator.
pub async fn show_panel_ticket(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    ticket_id: i64,
) -> Result<(), HandlerError> {
    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get DB connection for panel view: {}", e);
            return Ok(());
        }
    };

    let Some(ticket) = tickets::get_ticket(&conn, ticket_id).ok().flatten() else {
        bot.send_message(chat_id, "Murojaat topilmadi.").await?;
        return Ok(());
    };

    let assigned = match ticket.assigned_admin_id {
        Some(id) => format!("biriktirilgan: {id}"),
        None => "biriktirilmagan".to_string(),
    };
    let mut text = format!(
        "📋 Murojaat #{} — {}\n👤 {} | {} | {}\n",
        ticket.ticket_id,
        menu::topic_title(&ticket.topic),
        ticket.user_id,
        ticket.status,
        assigned
    );
    for message in tickets::messages_for_ticket(&conn, ticket_id).unwrap_or_default() {
        let sender = message.sender_name.unwrap_or_else(|| message.sender_id.to_string());
        text.push_str(&format!("\n{}: {}", sender, message.message_text));
    }
    drop(conn);

    let mut rows = Vec::new();
    if ticket.assigned_admin_id.is_none() {
        rows.push(vec![cb("✅ Qabul qilish", format!("claim_{ticket_id}"))]);
    }
    rows.push(vec![cb("⬅️", "panel_page_0")]);

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// An admin pressed the claim button on a ticket notification. The customer
/// is told their ticket is being looked at.
pub async fn handle_claim(
    bot: &Bot,
    deps: &HandlerDeps,
    admin_chat_id: ChatId,
    admin_id: i64,
    admin_name: &str,
    ticket_id: i64,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if !is_admin(admin_id) {
        log::warn!("Non-admin {} tried to claim ticket {}", admin_id, ticket_id);
        return Ok(());
    }

    let (claimed, customer_id) = match get_connection(&deps.db_pool) {
        Ok(conn) => {
            let claimed = tickets::assign_admin(&conn, ticket_id, admin_id).unwrap_or(false);
            let customer_id = tickets::get_ticket(&conn, ticket_id).ok().flatten().map(|t| t.user_id);
            (claimed, customer_id)
        }
        Err(e) => {
            log::error!("Failed to get DB connection for claim: {}", e);
            (false, None)
        }
    };

    // Web-synthesized tickets (user id 0) have no chat to notify
    if claimed {
        if let Some(customer_id) = customer_id.filter(|&id| id != 0) {
            let customer_lang = i18n::lang_from_telegram(None);
            let mut args = FluentArgs::new();
            args.set("id", ticket_id);
            args.set("admin", admin_name);
            if let Err(e) = bot
                .send_message(ChatId(customer_id), i18n::t_args(&customer_lang, "ticket-in-progress", &args))
                .await
            {
                log::error!("Failed to notify customer of claim on ticket {}: {}", ticket_id, e);
            }
        }
    }

    let mut args = FluentArgs::new();
    args.set("id", ticket_id);
    let key = if claimed { "claim-taken" } else { "claim-already" };
    bot.send_message(admin_chat_id, i18n::t_args(lang, key, &args)).await?;
    Ok(())
}

/// An admin reply-to message resolved to the ticket it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminReply {
    pub admin_id: i64,
    pub ticket_id: i64,
}

/// Map a message onto the forwarded-message record it replies to. `None`
/// lets the update fall through to the normal branches, so an admin's own
/// support chats keep working. Only fan-out copies to admin chats are ever
/// recorded, so the lookup itself is the authorization check.
pub fn resolve_admin_reply(deps: &HandlerDeps, msg: &Message) -> Option<AdminReply> {
    let admin_id = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok())?;
    let reply_to = msg.reply_to_message()?;
    msg.text()?;

    let conn = get_connection(&deps.db_pool).ok()?;
    let ticket_id = tickets::ticket_for_admin_reply(&conn, admin_id, reply_to.id.0)
        .ok()
        .flatten()?;
    Some(AdminReply { admin_id, ticket_id })
}

/// Admin reply-to path: a reply to a forwarded customer message appends
/// the text to the ticket, closes it, and asks the customer for a rating.
pub async fn handle_admin_reply(
    bot: &Bot,
    deps: &HandlerDeps,
    msg: &Message,
    reply: AdminReply,
) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let admin_name = msg
        .from
        .as_ref()
        .map(|u| u.first_name.clone())
        .unwrap_or_else(|| reply.admin_id.to_string());

    let ticket = match get_connection(&deps.db_pool) {
        Ok(conn) => {
            let ticket = tickets::get_ticket(&conn, reply.ticket_id).ok().flatten();
            if let Err(e) = tickets::append_message(&conn, reply.ticket_id, reply.admin_id, Some(&admin_name), text) {
                log::error!("Failed to append admin reply to ticket {}: {}", reply.ticket_id, e);
            }
            if let Err(e) = tickets::close_ticket(&conn, reply.ticket_id) {
                log::error!("Failed to close ticket {}: {}", reply.ticket_id, e);
            }
            ticket
        }
        Err(e) => {
            log::error!("Failed to get DB connection for admin reply: {}", e);
            None
        }
    };
    let Some(ticket) = ticket else {
        return Ok(());
    };

    // Web-synthesized tickets have no customer chat to answer
    if ticket.user_id != 0 {
        let customer = ChatId(ticket.user_id);
        let lang = i18n::lang_from_telegram(None);
        if let Err(e) = bot.send_message(customer, text).await {
            log::error!("Failed to deliver admin reply for ticket {}: {}", reply.ticket_id, e);
        } else {
            let mut args = FluentArgs::new();
            args.set("id", reply.ticket_id);
            let _ = bot
                .send_message(customer, i18n::t_args(&lang, "ticket-closed", &args))
                .reply_markup(rating_keyboard(reply.ticket_id))
                .await;
        }
    }

    bot.send_message(
        msg.chat.id,
        format!("✅ Javob yuborildi, murojaat #{} yopildi.", reply.ticket_id),
    )
    .await?;
    Ok(())
}

/// Customer rated a closed ticket.
pub async fn handle_rating(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    ticket_id: i64,
    rating: i32,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if !(1..=5).contains(&rating) {
        log::warn!("Rating out of range for ticket {}: {}", ticket_id, rating);
        return Ok(());
    }

    match get_connection(&deps.db_pool) {
        Ok(conn) => {
            // Only the ticket owner may rate it
            match tickets::get_ticket(&conn, ticket_id).ok().flatten() {
                Some(ticket) if ticket.user_id == chat_id.0 => {
                    if let Err(e) = tickets::set_rating(&conn, ticket_id, rating) {
                        log::error!("Failed to set rating for ticket {}: {}", ticket_id, e);
                    }
                }
                Some(_) => {
                    log::warn!("User {} tried to rate foreign ticket {}", chat_id.0, ticket_id);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
        Err(e) => log::error!("Failed to get DB connection for rating: {}", e),
    }

    bot.send_message(chat_id, i18n::t(lang, "rating-thanks")).await?;
    Ok(())
}
