//! Persistence: SQLite ticket store plus the flat-file product catalog and
//! contact log.

pub mod contact_log;
pub mod db;
pub mod migrations;
pub mod products;
pub mod tickets;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
