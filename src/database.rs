use crate::dlog;
use crate::persistence::{StorageError, StorageSlot};
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::Path;

/// Storage slots kept as rows of a small SQLite key/value table.
pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                op: "creating dir",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(db_path)?;
        tracing::info!(path = %db_path.display(), "opened sqlite storage");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        if !table_exists(&conn, "storage_slots")? {
            dlog!("creating storage_slots table");
        }
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS storage_slots (
              key         TEXT PRIMARY KEY,
              value       TEXT NOT NULL,
              updated_at  TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self { conn })
    }
}

impl StorageSlot for SqliteSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM storage_slots WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        let value = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let updated_at = Utc::now().to_rfc3339();
        self.conn.execute(
            r"
            INSERT INTO storage_slots (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
              value = excluded.value,
              updated_at = excluded.updated_at
            ",
            params![key, value, updated_at],
        )?;
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, StorageError> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}
