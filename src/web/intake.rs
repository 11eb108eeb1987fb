//! Contact-form intake: validation plus the bridge into the ticket store.

use std::sync::Arc;

use serde::Deserialize;

use crate::core::error::AppResult;
use crate::storage::contact_log::ContactLog;
use crate::storage::db::DbPool;
use crate::storage::{get_connection, tickets};
use crate::telegram::menu::WEB_ORDER_TOPIC;
use crate::web::pages::sanitize_field;

/// Sender name recorded for web-synthesized tickets.
pub const WEB_SENDER_NAME: &str = "Mijoz";

/// Raw POST /contact body.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub message: String,
}

/// A submission that passed validation; all fields trimmed and escaped.
#[derive(Debug, PartialEq, Eq)]
pub struct CleanContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub product: String,
    pub message: String,
}

/// Trim and escape every field; name, phone and message must be non-empty.
pub fn validate(form: &ContactForm) -> Option<CleanContact> {
    let clean = CleanContact {
        name: sanitize_field(&form.name),
        phone: sanitize_field(&form.phone),
        email: sanitize_field(&form.email),
        product: sanitize_field(&form.product),
        message: sanitize_field(&form.message),
    };
    if clean.name.is_empty() || clean.phone.is_empty() || clean.message.is_empty() {
        return None;
    }
    Some(clean)
}

/// Ticket body announced to the operators.
pub fn ticket_body(clean: &CleanContact) -> String {
    let mut body = format!("📦 YANGI BUYURTMA\n\nIsm: {}\nTelefon: {}", clean.name, clean.phone);
    if !clean.email.is_empty() {
        body.push_str(&format!("\nEmail: {}", clean.email));
    }
    if !clean.product.is_empty() {
        body.push_str(&format!("\nMahsulot: {}", clean.product));
    }
    body.push_str(&format!("\n\nXabar: {}", clean.message));
    body
}

/// Persist a validated submission: synthesize a ticket (user id 0) through
/// the regular ticket store, then append to the flat log. The ticket is the
/// source of truth; a log write failure is not fatal and must not leave a
/// stray log entry behind a failed ticket. Returns the new ticket id so the
/// caller can notify admins.
pub fn submit(db_pool: &Arc<DbPool>, contact_log: &ContactLog, clean: &CleanContact) -> AppResult<i64> {
    let conn = get_connection(db_pool)?;
    let ticket_id = tickets::create_ticket(&conn, 0, WEB_ORDER_TOPIC)?;
    tickets::append_message(&conn, ticket_id, 0, Some(WEB_SENDER_NAME), &ticket_body(clean))?;
    drop(conn);

    if let Err(e) = contact_log.append(&clean.name, &clean.phone, &clean.email, &clean.product, &clean.message) {
        log::warn!("Contact log write failed for ticket {}: {}", ticket_id, e);
    }
    Ok(ticket_id)
}
