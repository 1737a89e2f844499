use super::models::HashEntry;
use super::sqlite::HashStore;
use rusqlite::{params, OptionalExtension, Result};
use tracing::debug;

impl HashStore {
    /// Upsert one row per successfully hashed file, keyed on file_path.
    /// Batched in one transaction to amortize fsync cost.
    pub fn upsert_entries(&self, entries: &[HashEntry]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO file_hashes \
                 (file_path, quick_hash, secure_hash, file_size, last_modified, \
                  duplicate_group_id, safety_score, can_delete, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(file_path) DO UPDATE SET \
                     quick_hash = excluded.quick_hash, \
                     secure_hash = excluded.secure_hash, \
                     file_size = excluded.file_size, \
                     last_modified = excluded.last_modified, \
                     duplicate_group_id = excluded.duplicate_group_id, \
                     safety_score = excluded.safety_score, \
                     can_delete = excluded.can_delete",
            )?;
            let now = chrono::Utc::now().to_rfc3339();
            for entry in entries {
                count += stmt.execute(params![
                    entry.file_path,
                    entry.quick_hash,
                    entry.secure_hash,
                    entry.file_size,
                    entry.last_modified,
                    entry.duplicate_group_id,
                    entry.safety_score,
                    entry.can_delete,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} hash entries", count);
        Ok(count)
    }

    pub fn get_entry(&self, file_path: &str) -> Result<Option<HashEntry>> {
        self.connection()
            .query_row(
                "SELECT file_path, quick_hash, secure_hash, file_size, \
                        last_modified, duplicate_group_id, safety_score, can_delete \
                 FROM file_hashes WHERE file_path = ?1",
                params![file_path],
                |row| {
                    Ok(HashEntry {
                        file_path: row.get(0)?,
                        quick_hash: row.get(1)?,
                        secure_hash: row.get(2)?,
                        file_size: row.get(3)?,
                        last_modified: row.get(4)?,
                        duplicate_group_id: row.get(5)?,
                        safety_score: row.get(6)?,
                        can_delete: row.get(7)?,
                    })
                },
            )
            .optional()
    }

    pub fn count_entries(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM file_hashes", [], |row| row.get(0))
    }

    pub fn delete_entry(&self, file_path: &str) -> Result<()> {
        self.connection().execute(
            "DELETE FROM file_hashes WHERE file_path = ?1",
            params![file_path],
        )?;
        Ok(())
    }

    pub fn purge_all(&self) -> Result<()> {
        self.connection().execute_batch("DELETE FROM file_hashes;")?;
        debug!("Hash store purged");
        Ok(())
    }
}
