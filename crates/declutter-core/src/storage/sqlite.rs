use rusqlite::{Connection, Result};
use std::path::Path;
use tracing::debug;

/// Embedded hash store: one table keyed by unique file path, all writes
/// upserts. Opened once per scan batch and reused; concurrent callers must
/// serialize themselves.
pub struct HashStore {
    conn: Connection,
}

impl HashStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = HashStore { conn };
        store.configure_pragmas()?;
        store.migrate_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = HashStore { conn };
        store.configure_pragmas()?;
        store.migrate_schema()?;
        Ok(store)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 64MB cache)");
        Ok(())
    }

    /// Check schema version and migrate if needed.
    /// Version < 1: drop and recreate (every row is recomputable from disk).
    fn migrate_schema(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < 1 {
            self.conn
                .execute_batch("DROP TABLE IF EXISTS file_hashes;")?;
            self.conn.execute_batch(include_str!("schema.sql"))?;
            self.conn.execute_batch("PRAGMA user_version = 1;")?;
            debug!("Hash store schema initialized (version 1)");
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
