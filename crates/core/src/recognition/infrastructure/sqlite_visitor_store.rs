/// SQLite-backed visitor store.
///
/// One row per unique visitor: the enrollment embedding as a BLOB, visit
/// bookkeeping, and an optional sample image path. The embedding column
/// is the f32 little-endian byte layout from [`Embedding::to_bytes`];
/// rows whose blob fails to decode abort the load rather than silently
/// shrinking the known set.
use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::recognition::domain::embedding::{Embedding, EmbeddingCodecError};
use crate::recognition::domain::identity_matcher::VisitorId;
use crate::recognition::domain::visitor_store::VisitorStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("visitor {id}: corrupt embedding blob: {source}")]
    CorruptEmbedding {
        id: VisitorId,
        source: EmbeddingCodecError,
    },
}

pub struct SqliteVisitorStore {
    conn: Connection,
}

impl SqliteVisitorStore {
    /// Opens (or creates) the database at `path` and applies the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS visitors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                embedding BLOB NOT NULL,
                visit_count INTEGER NOT NULL DEFAULT 1,
                first_seen TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                last_seen TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                sample_image_path TEXT
            );",
        )?;
        Ok(Self { conn })
    }
}

impl VisitorStore for SqliteVisitorStore {
    fn create(
        &mut self,
        embedding: &Embedding,
        sample_path: Option<&Path>,
    ) -> Result<VisitorId, Box<dyn std::error::Error>> {
        self.conn.execute(
            "INSERT INTO visitors (embedding, sample_image_path) VALUES (?1, ?2)",
            params![
                embedding.to_bytes(),
                sample_path.map(|p| p.to_string_lossy().into_owned())
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn record_visit(&mut self, id: VisitorId) -> Result<(), Box<dyn std::error::Error>> {
        let updated = self.conn.execute(
            "UPDATE visitors
             SET visit_count = visit_count + 1, last_seen = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![id],
        )?;
        if updated == 0 {
            return Err(format!("visitor {id} not found").into());
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<(VisitorId, Embedding)>, Box<dyn std::error::Error>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, embedding FROM visitors ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let id: VisitorId = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((id, blob))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, blob) = row?;
            let embedding = Embedding::from_bytes(&blob)
                .map_err(|source| StoreError::CorruptEmbedding { id, source })?;
            out.push((id, embedding));
        }
        Ok(out)
    }

    fn count(&self) -> Result<u64, Box<dyn std::error::Error>> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM visitors", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteVisitorStore {
        SqliteVisitorStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut s = store();
        let a = s.create(&Embedding::new(vec![1.0, 2.0]), None).unwrap();
        let b = s.create(&Embedding::new(vec![3.0, 4.0]), None).unwrap();
        assert!(b > a);
        assert_eq!(s.count().unwrap(), 2);
    }

    #[test]
    fn test_list_all_round_trips_embeddings() {
        let mut s = store();
        let original = Embedding::new(vec![0.25, -1.5, 3.0]);
        let id = s.create(&original, None).unwrap();

        let all = s.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, id);
        assert_eq!(all[0].1.as_slice(), original.as_slice());
    }

    #[test]
    fn test_list_all_ordered_by_enrollment() {
        let mut s = store();
        let a = s.create(&Embedding::new(vec![1.0]), None).unwrap();
        let b = s.create(&Embedding::new(vec![2.0]), None).unwrap();
        let ids: Vec<_> = s.list_all().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_record_visit_increments_count() {
        let mut s = store();
        let id = s.create(&Embedding::new(vec![1.0]), None).unwrap();
        s.record_visit(id).unwrap();
        s.record_visit(id).unwrap();

        let visits: i64 = s
            .conn
            .query_row(
                "SELECT visit_count FROM visitors WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(visits, 3);
    }

    #[test]
    fn test_record_visit_unknown_id_is_error() {
        let mut s = store();
        assert!(s.record_visit(99).is_err());
    }

    #[test]
    fn test_sample_path_persisted() {
        let mut s = store();
        let id = s
            .create(
                &Embedding::new(vec![1.0]),
                Some(Path::new("/tmp/sample.jpg")),
            )
            .unwrap();

        let path: Option<String> = s
            .conn
            .query_row(
                "SELECT sample_image_path FROM visitors WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(path.as_deref(), Some("/tmp/sample.jpg"));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitors.db");

        let id = {
            let mut s = SqliteVisitorStore::open(&path).unwrap();
            s.create(&Embedding::new(vec![1.0, 2.0]), None).unwrap()
        };

        let s = SqliteVisitorStore::open(&path).unwrap();
        assert_eq!(s.count().unwrap(), 1);
        assert_eq!(s.list_all().unwrap()[0].0, id);
    }

    #[test]
    fn test_corrupt_blob_fails_load() {
        let mut s = store();
        s.create(&Embedding::new(vec![1.0]), None).unwrap();
        // Truncate the blob to a misaligned length.
        s.conn
            .execute("UPDATE visitors SET embedding = x'000000'", [])
            .unwrap();
        assert!(s.list_all().is_err());
    }
}
