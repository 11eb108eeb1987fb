//! Fan-out of customer messages to the configured admin list.
//!
//! Fire-and-forget: delivery failures are logged and never surfaced to the
//! relay. Each delivered copy is recorded in forwarded_messages so an admin
//! reply-to can find its ticket.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::InlineKeyboardMarkup;

use crate::core::config::admin::{admins_for_topic, ADMIN_IDS};
use crate::storage::db::DbPool;
use crate::storage::{get_connection, tickets};
use crate::telegram::cb;
use crate::telegram::menu;

/// Announce a new ticket with a claim button. Topics with a dedicated
/// operator list get only those operators; the rest fan out to ADMIN_IDS.
pub async fn notify_new_ticket(
    bot: &Bot,
    db_pool: &Arc<DbPool>,
    ticket_id: i64,
    topic: &str,
    sender_name: &str,
    sender_id: i64,
    text: &str,
) {
    let topic_title = menu::topic_title(topic);
    let body = format!(
        "🆕 Yangi murojaat #{ticket_id}\n👤 {sender_name} ({sender_id})\n📌 Mavzu: {topic_title}\n\n{text}"
    );
    let keyboard = InlineKeyboardMarkup::new(vec![vec![cb("✅ Qabul qilish", format!("claim_{ticket_id}"))]]);

    for admin_id in admins_for_topic(topic) {
        match bot
            .send_message(ChatId(admin_id), &body)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(sent) => record_forward(db_pool, ticket_id, admin_id, sent.id.0),
            Err(e) => log::error!("Failed to notify admin {} about ticket {}: {}", admin_id, ticket_id, e),
        }
    }
}

/// Announce a continuation message on an existing ticket.
pub async fn notify_ticket_continuation(
    bot: &Bot,
    db_pool: &Arc<DbPool>,
    ticket_id: i64,
    sender_name: &str,
    text: &str,
) {
    let body = format!("💬 Murojaat #{ticket_id} davomi\n👤 {sender_name}\n\n{text}");

    for admin_id in ADMIN_IDS.iter() {
        match bot.send_message(ChatId(*admin_id), &body).await {
            Ok(sent) => record_forward(db_pool, ticket_id, *admin_id, sent.id.0),
            Err(e) => log::error!("Failed to notify admin {} about ticket {}: {}", admin_id, ticket_id, e),
        }
    }
}

fn record_forward(db_pool: &Arc<DbPool>, ticket_id: i64, admin_id: i64, message_id: i32) {
    match get_connection(db_pool) {
        Ok(conn) => {
            if let Err(e) = tickets::record_forward(&conn, ticket_id, admin_id, message_id) {
                log::error!("Failed to record forward for ticket {}: {}", ticket_id, e);
            }
        }
        Err(e) => log::error!("Failed to get DB connection to record forward: {}", e),
    }
}
