//! Handler types, dependencies, and user upsert helper

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::Message;

use crate::storage::contact_log::ContactLog;
use crate::storage::db::{self, upsert_user};
use crate::storage::get_connection;
use crate::storage::products::ProductStore;
use crate::telegram::vacancy::VacancyForm;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<db::DbPool>,
    pub products: ProductStore,
    pub contact_log: ContactLog,
    /// Per-chat topic selected via the inline keyboard, consumed by the
    /// next free-text message
    pub pending_topics: Arc<DashMap<i64, String>>,
    /// Per-chat vacancy questionnaire progress
    pub vacancy_forms: Arc<DashMap<i64, VacancyForm>>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<db::DbPool>, products: ProductStore, contact_log: ContactLog) -> Self {
        Self {
            db_pool,
            products,
            contact_log,
            pending_topics: Arc::new(DashMap::new()),
            vacancy_forms: Arc::new(DashMap::new()),
        }
    }
}

/// Sender identity extracted from a Telegram message
#[derive(Clone)]
pub struct UserInfo {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language_code: Option<String>,
}

impl UserInfo {
    /// Extract user info from a Telegram message
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            username: msg.from.as_ref().and_then(|u| u.username.clone()),
            first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
            language_code: msg.from.as_ref().and_then(|u| u.language_code.clone()),
        }
    }

    /// Display name used in the ticket message log.
    pub fn display_name(&self) -> String {
        self.first_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.chat_id.to_string())
    }
}

/// Upsert the sender before dispatch. DB failure is logged, not fatal:
/// the relay should still answer even when the identity row is stale.
pub fn remember_user(deps: &HandlerDeps, user: &UserInfo) {
    match get_connection(&deps.db_pool) {
        Ok(conn) => {
            if let Err(e) = upsert_user(&conn, user.chat_id, user.first_name.as_deref(), user.username.as_deref()) {
                log::error!("Failed to upsert user {}: {}", user.chat_id, e);
            }
        }
        Err(e) => log::error!("Failed to get DB connection for user upsert: {}", e),
    }
}
