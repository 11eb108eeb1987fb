use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Result};

/// Структура, представляющая покупателя в базе данных.
pub struct User {
    /// Telegram ID пользователя
    pub user_id: i64,
    /// Имя, которое Telegram передаёт в апдейте
    pub first_name: Option<String>,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    /// Статус: "active" или "blocked"
    pub status: String,
    /// VIP-флаг (0/1), выставляется операторами вручную
    pub vip_status: i32,
    /// Заметки операторов о пользователе
    pub notes: Option<String>,
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections. Schema
/// migrations are run separately at startup via `storage::migrations`.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Upsert a user on every interaction; natural key is the Telegram id.
///
/// Refreshes first_name/username on conflict so the stored identity follows
/// profile changes. Status, VIP flag and notes are never touched here.
pub fn upsert_user(
    conn: &DbConnection,
    user_id: i64,
    first_name: Option<&str>,
    username: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, first_name, username) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET first_name = excluded.first_name, username = excluded.username",
        params![user_id, first_name, username],
    )?;
    Ok(())
}

/// Fetch a user by Telegram id.
pub fn get_user(conn: &DbConnection, user_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, first_name, username, status, vip_status, notes FROM users WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(User {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                username: row.get(2)?,
                status: row.get(3)?,
                vip_status: row.get(4)?,
                notes: row.get(5)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations_for_test;

    fn test_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        let mut raw = rusqlite::Connection::open(&path).unwrap();
        run_migrations_for_test(&mut raw).unwrap();
        drop(raw);
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[test]
    fn upsert_refreshes_identity_fields() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();

        upsert_user(&conn, 42, Some("Ali"), Some("ali")).unwrap();
        upsert_user(&conn, 42, Some("Alisher"), None).unwrap();

        let user = get_user(&conn, 42).unwrap().unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Alisher"));
        assert_eq!(user.username, None);
        assert_eq!(user.status, "active");
        assert_eq!(user.vip_status, 0);
    }

    #[test]
    fn get_user_returns_none_for_unknown_id() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        assert!(get_user(&conn, 999).unwrap().is_none());
    }
}
