//! SQLite schema versioning.
//!
//! `MIGRATIONS[n]` upgrades the schema from version `n` to `n + 1`. Applied
//! steps are recorded in `schema_migrations`; opening a database runs every
//! step past the recorded version inside one transaction.

use hcms_core::{Clock, SystemClock};
use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};

/// Ordered upgrade steps. Append only; never edit a shipped step.
const MIGRATIONS: &[&str] = &[V1_INITIAL];

/// Schema version this build reads and writes.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring `conn` up to [`CURRENT_VERSION`]. A no-op on an up-to-date database.
///
/// Refuses to touch a database written by a newer build.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_migrations (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL
         );",
    )?;

    let recorded: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if recorded > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database is at schema {recorded}, this build understands up to {CURRENT_VERSION}"
        )));
    }
    if recorded == CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let applied_at = SystemClock.now_millis();
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(recorded as usize) {
        let version = index as u32 + 1;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, applied_at],
        )?;
    }
    tx.commit()?;

    tracing::info!(from = recorded, to = CURRENT_VERSION, "migrated database schema");
    Ok(())
}

const V1_INITIAL: &str = r#"
    CREATE TABLE users (
        id BLOB PRIMARY KEY,              -- 16 bytes, UUID
        username TEXT NOT NULL UNIQUE,
        credential_hash TEXT NOT NULL,    -- PHC string
        role INTEGER NOT NULL,            -- Role as u8
        language TEXT,
        is_anonymous INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL       -- Unix ms
    );

    CREATE TABLE complaints (
        id BLOB PRIMARY KEY,
        owner_id BLOB NOT NULL,
        hospital_id INTEGER NOT NULL,
        category TEXT NOT NULL,
        department TEXT,
        description TEXT NOT NULL,
        attachment_url TEXT,
        status INTEGER NOT NULL,          -- ComplaintStatus as u8
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        resolved_at INTEGER,              -- set iff status = solved
        version INTEGER NOT NULL
    );

    CREATE TABLE comments (
        id BLOB PRIMARY KEY,
        complaint_id BLOB NOT NULL REFERENCES complaints(id) ON DELETE CASCADE,
        author_id BLOB NOT NULL,
        text TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        seq INTEGER NOT NULL,             -- append order within the thread

        UNIQUE(complaint_id, seq)
    );

    CREATE INDEX idx_complaints_owner ON complaints(owner_id);
    CREATE INDEX idx_complaints_status ON complaints(status);
    CREATE INDEX idx_complaints_created ON complaints(created_at);
    CREATE INDEX idx_comments_thread ON comments(complaint_id, created_at, seq);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn
    }

    fn schema_version(conn: &Connection) -> u32 {
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_gets_every_table() {
        let conn = fresh();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        for table in ["users", "complaints", "comments", "schema_migrations"] {
            assert!(names.iter().any(|n| n == table), "missing {table}");
        }
        assert_eq!(schema_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn test_rerun_is_noop() {
        let mut conn = fresh();
        migrate(&mut conn).unwrap();

        let rows: u32 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let mut conn = fresh();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
