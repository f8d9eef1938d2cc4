//! SQLite storage backend

use super::traits::{
    DocumentPatch, DocumentStore, OpenStore, StatusGuard, StorageError, StorageResult,
};
use crate::document::{Document, DocumentId, DocumentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const DOCUMENT_COLUMNS: &str =
    "id, title, file_path, status, analysis_json, review_json, creation_date, updated_date";

/// Raw column values of one `documents` row
type DocumentRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

/// SQLite-backed document store
///
/// Thread-safe via internal mutex on the connection. Several stores may open
/// the same database file; status guards are part of the `UPDATE` statement
/// itself, so they stay atomic across connections.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                file_path TEXT NOT NULL,
                status TEXT NOT NULL,
                analysis_json TEXT,
                review_json TEXT,
                creation_date TEXT NOT NULL,
                updated_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_status
                ON documents(status);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn parse_date(value: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    /// Deserialize a document from database columns
    fn row_to_document(row: DocumentRow) -> StorageResult<Document> {
        let (id, title, file_path, status, analysis, review, created, updated) = row;
        Ok(Document {
            id: id
                .parse()
                .map_err(|e| StorageError::InvalidValue(format!("document id '{}': {}", id, e)))?,
            title,
            file_path,
            status: status.parse().map_err(StorageError::InvalidValue)?,
            analysis: analysis.as_deref().map(serde_json::from_str).transpose()?,
            review: review.as_deref().map(serde_json::from_str).transpose()?,
            creation_date: Self::parse_date(&created)?,
            updated_date: Self::parse_date(&updated)?,
        })
    }

    fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn optional_json<T: serde::Serialize>(value: &Option<T>) -> StorageResult<SqlValue> {
        Ok(match value {
            Some(v) => SqlValue::Text(serde_json::to_string(v)?),
            None => SqlValue::Null,
        })
    }

    /// Build the `SET` list and bound values for a patch
    fn patch_to_sql(patch: &DocumentPatch) -> StorageResult<(Vec<&'static str>, Vec<SqlValue>)> {
        let mut columns = vec!["updated_date = ?"];
        let mut values = vec![SqlValue::Text(patch.updated_date.to_rfc3339())];

        if let Some(status) = patch.status {
            columns.push("status = ?");
            values.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(analysis) = &patch.analysis {
            columns.push("analysis_json = ?");
            values.push(Self::optional_json(analysis)?);
        }
        if let Some(review) = &patch.review {
            columns.push("review_json = ?");
            values.push(Self::optional_json(review)?);
        }

        Ok((columns, values))
    }

    /// Append a status guard to a statement already filtered by id
    fn push_guard(sql: &mut String, values: &mut Vec<SqlValue>, guard: StatusGuard) {
        let (clause, status) = match guard {
            StatusGuard::Is(status) => (" AND status = ?", status),
            StatusGuard::IsNot(status) => (" AND status != ?", status),
        };
        sql.push_str(clause);
        values.push(SqlValue::Text(status.as_str().to_string()));
    }

    fn execute_patch(
        &self,
        id: &DocumentId,
        guard: Option<StatusGuard>,
        patch: &DocumentPatch,
    ) -> StorageResult<bool> {
        let (columns, mut values) = Self::patch_to_sql(patch)?;
        let mut sql = format!("UPDATE documents SET {} WHERE id = ?", columns.join(", "));
        values.push(SqlValue::Text(id.to_string()));

        if let Some(guard) = guard {
            Self::push_guard(&mut sql, &mut values, guard);
        }

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(&sql, params_from_iter(values))?;
        Ok(rows > 0)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, document: &Document) -> StorageResult<()> {
        let analysis = Self::optional_json(&document.analysis)?;
        let review = Self::optional_json(&document.review)?;

        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            &format!(
                "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                DOCUMENT_COLUMNS
            ),
            params![
                document.id.to_string(),
                document.title,
                document.file_path,
                document.status.as_str(),
                analysis,
                review,
                document.creation_date.to_rfc3339(),
                document.updated_date.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateDocument(document.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        let row = {
            let conn = self.conn.lock().unwrap();
            conn.query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id.to_string()],
                Self::read_row,
            )
            .optional()?
        };

        row.map(Self::row_to_document).transpose()
    }

    async fn list(&self) -> StorageResult<Vec<Document>> {
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM documents ORDER BY creation_date DESC",
                DOCUMENT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], Self::read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn conditional_update(
        &self,
        id: &DocumentId,
        guard: StatusGuard,
        patch: &DocumentPatch,
    ) -> StorageResult<bool> {
        self.execute_patch(id, Some(guard), patch)
    }

    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> StorageResult<bool> {
        self.execute_patch(id, None, patch)
    }

    async fn conditional_delete(&self, id: &DocumentId, guard: StatusGuard) -> StorageResult<bool> {
        let mut sql = String::from("DELETE FROM documents WHERE id = ?");
        let mut values = vec![SqlValue::Text(id.to_string())];
        Self::push_guard(&mut sql, &mut values, guard);

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(&sql, params_from_iter(values))?;
        Ok(rows > 0)
    }
}
