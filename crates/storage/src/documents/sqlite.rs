#![forbid(unsafe_code)]

use super::{Collection, DocumentStore};
use crate::store::StoreError;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tt_core::SessionId;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
  partition TEXT NOT NULL,
  collection TEXT NOT NULL,
  body TEXT NOT NULL,
  updated_at_ms INTEGER NOT NULL,
  PRIMARY KEY (partition, collection)
);
";

/// Same whole-document semantics as the file backend, kept in a single SQLite file.
/// The partition is the `partition` column; each row is one collection document.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref();
        std::fs::create_dir_all(storage_dir)?;
        let conn = Connection::open(storage_dir.join("thinktrail.db"))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn read(
        &self,
        partition: &SessionId,
        collection: Collection,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let body = conn
            .query_row(
                "SELECT body FROM documents WHERE partition = ?1 AND collection = ?2",
                params![partition.as_str(), collection.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(body)
    }

    fn write(
        &self,
        partition: &SessionId,
        collection: Collection,
        body: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO documents(partition, collection, body, updated_at_ms) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(partition, collection) DO UPDATE SET body = excluded.body, updated_at_ms = excluded.updated_at_ms",
            params![
                partition.as_str(),
                collection.as_str(),
                body,
                crate::unix_ms_now()
            ],
        )?;
        Ok(())
    }

    fn remove_partition(&self, partition: &SessionId) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "DELETE FROM documents WHERE partition = ?1",
            params![partition.as_str()],
        )?;
        Ok(())
    }

    fn partitions(&self) -> Result<Vec<SessionId>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            "SELECT partition FROM documents WHERE collection = ?1 ORDER BY partition",
        )?;
        let rows = stmt.query_map(params![Collection::Session.as_str()], |row| {
            row.get::<_, String>(0)
        })?;
        let mut out = Vec::new();
        for row in rows {
            // Rows are only ever written under validated ids; skip anything else.
            if let Ok(id) = SessionId::try_new(row?) {
                out.push(id);
            }
        }
        Ok(out)
    }
}
