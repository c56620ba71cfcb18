use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::api::schema::DocumentRecord;
use crate::api::{ClientError, Result};

/// SQLite copy of the last document listing the backend returned.
///
/// The backend owns the documents; this cache is replaced wholesale on every
/// successful listing and is never edited row by row.
pub struct DocumentCache {
    conn: Mutex<Connection>,
}

impl DocumentCache {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cached_documents (
                position      INTEGER PRIMARY KEY,
                document_id   TEXT,
                file_name     TEXT,
                total_chunks  INTEGER,
                upload_date   TEXT,
                file_size     INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_cached_documents_id ON cached_documents(document_id);

            CREATE TABLE IF NOT EXISTS cache_meta (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Replace the cached listing, preserving server order.
    pub fn replace_all(&self, documents: &[DocumentRecord]) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cached_documents", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cached_documents
                 (position, document_id, file_name, total_chunks, upload_date, file_size)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, doc) in documents.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    doc.id(),
                    doc.file_name,
                    doc.total_chunks.map(|n| n as i64),
                    doc.upload_date,
                    doc.file_size.map(|n| n as i64),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO cache_meta (key, value) VALUES ('refreshed_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::debug!(count = documents.len(), "Document cache replaced");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<DocumentRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT document_id, file_name, total_chunks, upload_date, file_size
             FROM cached_documents ORDER BY position",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Find a document by full id or by an unambiguous id prefix (listings
    /// only show the first 8 characters).
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();
        let exact = conn
            .query_row(
                "SELECT document_id, file_name, total_chunks, upload_date, file_size
                 FROM cached_documents WHERE document_id = ?1",
                params![id_or_prefix],
                Self::row_to_record,
            )
            .optional()?;
        if exact.is_some() {
            return Ok(exact);
        }

        let mut stmt = conn.prepare(
            "SELECT document_id, file_name, total_chunks, upload_date, file_size
             FROM cached_documents WHERE substr(document_id, 1, length(?1)) = ?1
             LIMIT 2",
        )?;
        let mut matches = stmt
            .query_map(params![id_or_prefix], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(ClientError::validation(format!(
                "Document id '{id_or_prefix}' is ambiguous; use more characters"
            ))),
        }
    }

    /// When the listing was last replaced (RFC 3339), if ever.
    pub fn refreshed_at(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = 'refreshed_at'",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
        Ok(DocumentRecord {
            document_id: row.get(0)?,
            legacy_id: None,
            file_name: row.get(1)?,
            total_chunks: row.get::<_, Option<i64>>(2)?.map(|n| n as u64),
            upload_date: row.get(3)?,
            file_size: row.get::<_, Option<i64>>(4)?.map(|n| n as u64),
        })
    }
}
