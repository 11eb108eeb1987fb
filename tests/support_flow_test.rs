//! Integration tests for the support-ticket relay
//!
//! Run with: cargo test --test support_flow_test
//!
//! Exercises the full path a customer message takes: routing decision,
//! ticket store, and the web contact intake that synthesizes tickets.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use mebelbot::storage::contact_log::ContactLog;
use mebelbot::storage::migrations::run_migrations_for_test;
use mebelbot::storage::products::ProductStore;
use mebelbot::storage::tickets;
use mebelbot::storage::{create_pool, get_connection, DbPool};
use mebelbot::telegram::admin;
use mebelbot::telegram::router::{classify, decide_relay, Inbound, MenuAction, RelayDecision};
use mebelbot::telegram::types::HandlerDeps;
use mebelbot::web::intake::{self, ContactForm};

struct TestDb {
    _dir: tempfile::TempDir,
    pool: Arc<DbPool>,
}

fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("support.sqlite");
    let mut raw = rusqlite::Connection::open(&path).unwrap();
    run_migrations_for_test(&mut raw).unwrap();
    drop(raw);
    let pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());
    TestDb { _dir: dir, pool }
}

fn test_deps(db: &TestDb) -> HandlerDeps {
    let dir = db._dir.path();
    HandlerDeps::new(
        Arc::clone(&db.pool),
        ProductStore::new(dir.join("products.json").to_str().unwrap()),
        ContactLog::new(dir.join("messages.json").to_str().unwrap()),
    )
}

/// Build an incoming Telegram message through the Bot API wire format.
fn reply_message(from_id: u64, chat_id: i64, reply_to_id: i32, text: &str) -> teloxide::types::Message {
    serde_json::from_value(serde_json::json!({
        "message_id": 10_000,
        "date": 1_700_000_000,
        "chat": { "id": chat_id, "type": "private", "first_name": "Chat" },
        "from": { "id": from_id, "is_bot": false, "first_name": "Operator" },
        "text": text,
        "reply_to_message": {
            "message_id": reply_to_id,
            "date": 1_700_000_000,
            "chat": { "id": chat_id, "type": "private", "first_name": "Chat" },
            "text": "forwarded copy"
        }
    }))
    .unwrap()
}

fn contact(name: &str, phone: &str, message: &str) -> ContactForm {
    ContactForm {
        name: name.to_string(),
        phone: phone.to_string(),
        email: String::new(),
        product: String::new(),
        message: message.to_string(),
    }
}

// ============================================================================
// Customer relay: topic -> new ticket -> continuation -> reprompt
// ============================================================================

#[test]
fn topic_then_free_text_opens_one_ticket_and_appends_the_rest() {
    let db = test_db();
    let conn = get_connection(&db.pool).unwrap();
    let user_id = 42;

    // The chat picked a topic, so the first free text opens a ticket
    let open = tickets::find_open_ticket(&conn, user_id).unwrap();
    let decision = decide_relay(Some("texnik".to_string()), open.map(|t| t.ticket_id));
    let ticket_id = match decision {
        RelayDecision::NewTicket { topic } => {
            let id = tickets::create_ticket(&conn, user_id, &topic).unwrap();
            tickets::append_message(&conn, id, user_id, Some("Ali"), "divan g'ichirlayapti").unwrap();
            id
        }
        other => panic!("expected NewTicket, got {:?}", other),
    };

    // Pending topic is consumed; the next message continues the same ticket
    let open = tickets::find_open_ticket(&conn, user_id).unwrap();
    let decision = decide_relay(None, open.map(|t| t.ticket_id));
    match decision {
        RelayDecision::Append { ticket_id: id } => {
            assert_eq!(id, ticket_id);
            tickets::append_message(&conn, id, user_id, Some("Ali"), "rasm yuboraymi?").unwrap();
        }
        other => panic!("expected Append, got {:?}", other),
    }

    let log = tickets::messages_for_ticket(&conn, ticket_id).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|m| m.ticket_id == ticket_id));
    assert_eq!(log[0].message_text, "divan g'ichirlayapti");

    // Once the operator closes it, free text falls back to the menu prompt
    tickets::close_ticket(&conn, ticket_id).unwrap();
    let open = tickets::find_open_ticket(&conn, user_id).unwrap();
    assert_eq!(decide_relay(None, open.map(|t| t.ticket_id)), RelayDecision::Reprompt);
}

#[test]
fn relay_state_is_isolated_per_user() {
    let db = test_db();
    let conn = get_connection(&db.pool).unwrap();

    let id = tickets::create_ticket(&conn, 1, "buyurtma").unwrap();
    tickets::append_message(&conn, id, 1, None, "salom").unwrap();

    // Another user with no pending topic and no ticket gets the reprompt
    let open = tickets::find_open_ticket(&conn, 2).unwrap();
    assert_eq!(decide_relay(None, open.map(|t| t.ticket_id)), RelayDecision::Reprompt);
}

#[test]
fn menu_labels_never_reach_the_relay() {
    assert_eq!(classify("✍️ Murojaat yuborish"), Inbound::Menu(MenuAction::Support));
    assert_eq!(classify("💬 Mening chatlarim"), Inbound::Menu(MenuAction::MyChats));
    assert_eq!(classify("divan kerak"), Inbound::Free("divan kerak"));
    assert_eq!(classify("/version"), Inbound::UnknownCommand);
}

// ============================================================================
// Operator side: claim, reply-to resolution, close and rate
// ============================================================================

#[test]
fn claim_reply_close_and_rate_round_trip() {
    let db = test_db();
    let conn = get_connection(&db.pool).unwrap();
    let admin_id = 900;

    let ticket_id = tickets::create_ticket(&conn, 42, "texnik").unwrap();
    tickets::append_message(&conn, ticket_id, 42, Some("Ali"), "divan buzildi").unwrap();

    // The fan-out records which message id each admin chat received
    tickets::record_forward(&conn, ticket_id, admin_id, 5001).unwrap();
    tickets::record_forward(&conn, ticket_id, 901, 777).unwrap();

    assert!(tickets::assign_admin(&conn, ticket_id, admin_id).unwrap());
    assert!(!tickets::assign_admin(&conn, ticket_id, 901).unwrap());

    // An admin replying to their forwarded copy resolves the right ticket
    let resolved = tickets::ticket_for_admin_reply(&conn, admin_id, 5001).unwrap();
    assert_eq!(resolved, Some(ticket_id));
    assert_eq!(tickets::ticket_for_admin_reply(&conn, admin_id, 777).unwrap(), None);

    tickets::append_message(&conn, ticket_id, admin_id, Some("Operator"), "ustamiz boradi").unwrap();
    tickets::close_ticket(&conn, ticket_id).unwrap();
    tickets::set_rating(&conn, ticket_id, 5).unwrap();

    let ticket = tickets::get_ticket(&conn, ticket_id).unwrap().unwrap();
    assert_eq!(ticket.status, "closed");
    assert_eq!(ticket.assigned_admin_id, Some(admin_id));
    assert_eq!(ticket.rating, Some(5));
    assert_eq!(tickets::messages_for_ticket(&conn, ticket_id).unwrap().len(), 2);
}

#[test]
fn reply_to_unknown_message_resolves_nothing() {
    let db = test_db();
    let deps = test_deps(&db);

    // No forwarded copy recorded for this message id, so the reply must not
    // be consumed by the operator branch
    let msg = reply_message(900, 900, 5001, "qalaysiz?");
    assert_eq!(admin::resolve_admin_reply(&deps, &msg), None);
}

#[test]
fn reply_to_forwarded_copy_resolves_the_ticket() {
    let db = test_db();
    let deps = test_deps(&db);
    let conn = get_connection(&db.pool).unwrap();

    let ticket_id = tickets::create_ticket(&conn, 42, "texnik").unwrap();
    tickets::record_forward(&conn, ticket_id, 900, 5001).unwrap();
    drop(conn);

    let msg = reply_message(900, 900, 5001, "ustamiz boradi");
    assert_eq!(
        admin::resolve_admin_reply(&deps, &msg),
        Some(admin::AdminReply { admin_id: 900, ticket_id })
    );

    // Same message id in another operator's chat resolves nothing
    let msg = reply_message(901, 901, 5001, "men emas");
    assert_eq!(admin::resolve_admin_reply(&deps, &msg), None);
}

#[test]
fn reply_in_a_group_chat_keys_on_the_sender_not_the_chat() {
    let db = test_db();
    let deps = test_deps(&db);
    let conn = get_connection(&db.pool).unwrap();

    let ticket_id = tickets::create_ticket(&conn, 42, "buyurtma").unwrap();
    tickets::record_forward(&conn, ticket_id, 900, 5001).unwrap();
    drop(conn);

    let msg: teloxide::types::Message = serde_json::from_value(serde_json::json!({
        "message_id": 10_001,
        "date": 1_700_000_000,
        "chat": { "id": -100_200_300, "type": "supergroup", "title": "Operatorlar" },
        "from": { "id": 900, "is_bot": false, "first_name": "Operator" },
        "text": "qabul qilindi",
        "reply_to_message": {
            "message_id": 5001,
            "date": 1_700_000_000,
            "chat": { "id": -100_200_300, "type": "supergroup", "title": "Operatorlar" },
            "text": "forwarded copy"
        }
    }))
    .unwrap();

    assert_eq!(
        admin::resolve_admin_reply(&deps, &msg),
        Some(admin::AdminReply { admin_id: 900, ticket_id })
    );
}

// ============================================================================
// Web intake: contact form submissions become tickets
// ============================================================================

#[test]
fn web_submission_creates_ticket_and_log_entry() {
    let db = test_db();
    let dir = tempfile::tempdir().unwrap();
    let log = ContactLog::new(dir.path().join("messages.json").to_str().unwrap());

    let clean = intake::validate(&contact("Ali", "+998901234567", "Divan Premium kerak")).unwrap();
    let ticket_id = intake::submit(&db.pool, &log, &clean).unwrap();

    let conn = get_connection(&db.pool).unwrap();
    let ticket = tickets::get_ticket(&conn, ticket_id).unwrap().unwrap();
    assert_eq!(ticket.user_id, 0);
    assert_eq!(ticket.topic, "buyurtma");
    assert_eq!(ticket.status, "open");

    let messages = tickets::messages_for_ticket(&conn, ticket_id).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_name.as_deref(), Some("Mijoz"));
    assert!(messages[0].message_text.starts_with("📦 YANGI BUYURTMA"));
    assert!(messages[0].message_text.contains("Telefon: +998901234567"));

    assert_eq!(log.unread_count(), 1);
}

#[test]
fn invalid_web_submission_creates_nothing() {
    let db = test_db();
    let dir = tempfile::tempdir().unwrap();
    let log = ContactLog::new(dir.path().join("messages.json").to_str().unwrap());

    // Empty message never reaches the store
    assert!(intake::validate(&contact("Ali", "+998", "   ")).is_none());

    let conn = get_connection(&db.pool).unwrap();
    assert_eq!(tickets::count_open_tickets(&conn).unwrap(), 0);
    assert!(log.load().is_empty());
}

#[test]
fn broken_contact_log_does_not_lose_the_ticket() {
    let db = test_db();
    let dir = tempfile::tempdir().unwrap();

    // Parent of the log path is a plain file, so every log write fails
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let log = ContactLog::new(blocker.join("messages.json").to_str().unwrap());

    let clean = intake::validate(&contact("Ali", "+998901234567", "Divan kerak")).unwrap();
    let ticket_id = intake::submit(&db.pool, &log, &clean).unwrap();

    let conn = get_connection(&db.pool).unwrap();
    let ticket = tickets::get_ticket(&conn, ticket_id).unwrap().unwrap();
    assert_eq!(ticket.status, "open");
    assert_eq!(tickets::messages_for_ticket(&conn, ticket_id).unwrap().len(), 1);
    assert!(log.load().is_empty());
}

#[test]
fn web_ticket_shows_up_in_the_admin_panel_page() {
    let db = test_db();
    let dir = tempfile::tempdir().unwrap();
    let log = ContactLog::new(dir.path().join("messages.json").to_str().unwrap());

    let clean = intake::validate(&contact("Vali", "+998907654321", "Stol narxi?")).unwrap();
    let ticket_id = intake::submit(&db.pool, &log, &clean).unwrap();

    let conn = get_connection(&db.pool).unwrap();
    let page = tickets::open_tickets_page(&conn, 0, 5).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].ticket_id, ticket_id);
    assert!(page[0].assigned_admin_id.is_none());
}
