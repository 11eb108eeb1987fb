//! Support-ticket store: the relay's persistence layer.
//!
//! Two related records (ticket, message) plus the forwarded-message map
//! that lets admin reply-to messages find their ticket. No transaction
//! wraps create+append; a crash between the two leaves an empty ticket,
//! which the admin panel tolerates.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Result};

use crate::storage::db::DbConnection;

/// Обращение покупателя в поддержку.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub ticket_id: i64,
    pub user_id: i64,
    pub topic: String,
    /// "open" или "closed"
    pub status: String,
    pub created_at: String,
    pub assigned_admin_id: Option<i64>,
    pub rating: Option<i32>,
}

/// Одно сообщение в журнале обращения.
#[derive(Debug, Clone)]
pub struct TicketMessage {
    pub message_db_id: i64,
    pub ticket_id: i64,
    pub sender_id: i64,
    pub sender_name: Option<String>,
    pub message_text: String,
    pub sent_at: String,
}

fn ticket_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        ticket_id: row.get(0)?,
        user_id: row.get(1)?,
        topic: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        assigned_admin_id: row.get(5)?,
        rating: row.get(6)?,
    })
}

const TICKET_COLUMNS: &str = "ticket_id, user_id, topic, status, created_at, assigned_admin_id, rating";

/// Create a new open ticket and return its id.
pub fn create_ticket(conn: &DbConnection, user_id: i64, topic: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO tickets (user_id, topic, status, created_at) VALUES (?1, ?2, 'open', ?3)",
        params![user_id, topic, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append a message to a ticket's log.
pub fn append_message(
    conn: &DbConnection,
    ticket_id: i64,
    sender_id: i64,
    sender_name: Option<&str>,
    text: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (ticket_id, sender_id, sender_name, message_text, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![ticket_id, sender_id, sender_name, text, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Most recent open ticket for a user, or none.
///
/// "One open ticket per user" is an assumption, not a constraint; when
/// several are open the newest wins.
pub fn find_open_ticket(conn: &DbConnection, user_id: i64) -> Result<Option<Ticket>> {
    conn.query_row(
        &format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE user_id = ?1 AND status = 'open'
             ORDER BY ticket_id DESC LIMIT 1"
        ),
        params![user_id],
        ticket_from_row,
    )
    .optional()
}

/// All tickets of a user, newest first.
pub fn list_for_user(conn: &DbConnection, user_id: i64) -> Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE user_id = ?1 ORDER BY ticket_id DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], ticket_from_row)?;
    rows.collect()
}

/// Fetch a ticket by id.
pub fn get_ticket(conn: &DbConnection, ticket_id: i64) -> Result<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
        params![ticket_id],
        ticket_from_row,
    )
    .optional()
}

/// Message log of a ticket, oldest first.
pub fn messages_for_ticket(conn: &DbConnection, ticket_id: i64) -> Result<Vec<TicketMessage>> {
    let mut stmt = conn.prepare(
        "SELECT message_db_id, ticket_id, sender_id, sender_name, message_text, sent_at
         FROM messages WHERE ticket_id = ?1 ORDER BY message_db_id",
    )?;
    let rows = stmt.query_map(params![ticket_id], |row| {
        Ok(TicketMessage {
            message_db_id: row.get(0)?,
            ticket_id: row.get(1)?,
            sender_id: row.get(2)?,
            sender_name: row.get(3)?,
            message_text: row.get(4)?,
            sent_at: row.get(5)?,
        })
    })?;
    rows.collect()
}

/// Claim a ticket for an admin. Returns false when someone already took it.
pub fn assign_admin(conn: &DbConnection, ticket_id: i64, admin_id: i64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE tickets SET assigned_admin_id = ?2 WHERE ticket_id = ?1 AND assigned_admin_id IS NULL",
        params![ticket_id, admin_id],
    )?;
    Ok(updated > 0)
}

/// Mark a ticket closed.
pub fn close_ticket(conn: &DbConnection, ticket_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE tickets SET status = 'closed' WHERE ticket_id = ?1",
        params![ticket_id],
    )?;
    Ok(())
}

/// Store the customer's 1..5 rating after the ticket is closed.
pub fn set_rating(conn: &DbConnection, ticket_id: i64, rating: i32) -> Result<()> {
    conn.execute(
        "UPDATE tickets SET rating = ?2 WHERE ticket_id = ?1",
        params![ticket_id, rating],
    )?;
    Ok(())
}

/// One page of open tickets for the admin panel, newest first.
pub fn open_tickets_page(conn: &DbConnection, offset: i64, limit: i64) -> Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE status = 'open'
         ORDER BY ticket_id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], ticket_from_row)?;
    rows.collect()
}

/// Total number of open tickets.
pub fn count_open_tickets(conn: &DbConnection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM tickets WHERE status = 'open'", [], |row| {
        row.get(0)
    })
}

/// Remember which message id a ticket was forwarded under in an admin chat.
pub fn record_forward(conn: &DbConnection, ticket_id: i64, admin_id: i64, message_id: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO forwarded_messages (ticket_id, admin_id, message_id) VALUES (?1, ?2, ?3)",
        params![ticket_id, admin_id, message_id],
    )?;
    Ok(())
}

/// Resolve an admin reply-to back to the ticket it belongs to.
pub fn ticket_for_admin_reply(conn: &DbConnection, admin_id: i64, message_id: i32) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT ticket_id FROM forwarded_messages WHERE admin_id = ?1 AND message_id = ?2",
        params![admin_id, message_id],
        |row| row.get(0),
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{create_pool, get_connection, DbPool};
    use crate::storage::migrations::run_migrations_for_test;
    use pretty_assertions::assert_eq;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.sqlite");
        let mut raw = rusqlite::Connection::open(&path).unwrap();
        run_migrations_for_test(&mut raw).unwrap();
        drop(raw);
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[test]
    fn append_links_message_to_parent_ticket() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let id = create_ticket(&conn, 100, "texnik").unwrap();
        append_message(&conn, id, 100, Some("Ali"), "divan buzildi").unwrap();

        let log = messages_for_ticket(&conn, id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].ticket_id, id);
        assert_eq!(log[0].message_text, "divan buzildi");
    }

    #[test]
    fn find_open_ticket_returns_most_recent_open() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let first = create_ticket(&conn, 7, "buyurtma").unwrap();
        let second = create_ticket(&conn, 7, "taklif").unwrap();

        let open = find_open_ticket(&conn, 7).unwrap().unwrap();
        assert_eq!(open.ticket_id, second);

        close_ticket(&conn, second).unwrap();
        let open = find_open_ticket(&conn, 7).unwrap().unwrap();
        assert_eq!(open.ticket_id, first);

        close_ticket(&conn, first).unwrap();
        assert!(find_open_ticket(&conn, 7).unwrap().is_none());
    }

    #[test]
    fn find_open_ticket_ignores_other_users() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        create_ticket(&conn, 1, "texnik").unwrap();
        assert!(find_open_ticket(&conn, 2).unwrap().is_none());
    }

    #[test]
    fn claim_is_first_come_first_served() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let id = create_ticket(&conn, 5, "hamkorlik").unwrap();
        assert!(assign_admin(&conn, id, 111).unwrap());
        assert!(!assign_admin(&conn, id, 222).unwrap());

        let ticket = get_ticket(&conn, id).unwrap().unwrap();
        assert_eq!(ticket.assigned_admin_id, Some(111));
    }

    #[test]
    fn close_and_rate_update_ticket_state() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let id = create_ticket(&conn, 9, "taklif").unwrap();
        close_ticket(&conn, id).unwrap();
        set_rating(&conn, id, 4).unwrap();

        let ticket = get_ticket(&conn, id).unwrap().unwrap();
        assert_eq!(ticket.status, "closed");
        assert_eq!(ticket.rating, Some(4));
    }

    #[test]
    fn open_tickets_page_respects_offset_and_limit() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        for user in 1..=7 {
            create_ticket(&conn, user, "buyurtma").unwrap();
        }
        close_ticket(&conn, 7).unwrap();

        assert_eq!(count_open_tickets(&conn).unwrap(), 6);

        let first_page = open_tickets_page(&conn, 0, 5).unwrap();
        assert_eq!(first_page.len(), 5);
        assert_eq!(first_page[0].ticket_id, 6); // newest open first

        let second_page = open_tickets_page(&conn, 5, 5).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].ticket_id, 1);
    }

    #[test]
    fn forwarded_message_maps_back_to_ticket() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        let id = create_ticket(&conn, 3, "texnik").unwrap();
        record_forward(&conn, id, 555, 1234).unwrap();

        assert_eq!(ticket_for_admin_reply(&conn, 555, 1234).unwrap(), Some(id));
        assert_eq!(ticket_for_admin_reply(&conn, 555, 9999).unwrap(), None);
        assert_eq!(ticket_for_admin_reply(&conn, 556, 1234).unwrap(), None);
    }
}
