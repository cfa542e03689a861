//! SQLite schema versioning.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry in
//! [`STEPS`] moves the schema forward by one version and runs inside the
//! same transaction that bumps the pragma.

use rusqlite::{Connection, Transaction};

use crate::error::{Result, StoreError};

/// Schema steps, in order. Step `i` produces version `i + 1`.
const STEPS: &[&str] = &[
    // v1: one row per durable key, values are CBOR blobs.
    "CREATE TABLE kv (
        key TEXT PRIMARY KEY,
        value BLOB NOT NULL
    );",
    // v2: local write time, for inspecting a database by hand.
    "ALTER TABLE kv ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0;",
];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "kernel database is at schema v{found}, this build understands up to v{CURRENT_VERSION}"
        )));
    }

    for (index, sql) in STEPS.iter().enumerate().skip(found as usize) {
        let tx = conn.transaction()?;
        apply(&tx, index as u32 + 1, sql)?;
        tx.commit()?;
    }
    Ok(())
}

/// Read `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn apply(tx: &Transaction<'_>, version: u32, sql: &str) -> Result<()> {
    tx.execute_batch(sql)
        .map_err(|e| StoreError::Migration(format!("step to v{version} failed: {e}")))?;
    tx.pragma_update(None, "user_version", version)?;
    tracing::debug!(version, "kernel schema upgraded");
    Ok(())
}

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(conn: &Connection) -> Vec<String> {
        let mut stmt = conn.prepare("PRAGMA table_info(kv)").unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        migrate(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        assert_eq!(columns(&conn), vec!["key", "value", "updated_at"]);
    }

    #[test]
    fn test_migrate_twice_is_noop() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES ('xhe.meta', x'00', 1)",
            [],
        )
        .unwrap();

        migrate(&mut conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_v1_database_gains_write_time() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(STEPS[0]).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn.execute("INSERT INTO kv (key, value) VALUES ('xhe.ledger', x'00')", [])
            .unwrap();

        migrate(&mut conn).unwrap();
        let written: i64 = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = 'xhe.ledger'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();
        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
