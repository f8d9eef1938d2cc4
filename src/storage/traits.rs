//! Storage trait definitions

use crate::analysis::AnalysisResult;
use crate::document::{Document, DocumentId, DocumentStatus, Review};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document already exists: {0}")]
    DuplicateDocument(DocumentId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Condition on the current status, evaluated atomically with a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGuard {
    /// Apply only if the status equals this value
    Is(DocumentStatus),
    /// Apply only if the status differs from this value
    IsNot(DocumentStatus),
}

impl StatusGuard {
    pub fn admits(&self, status: DocumentStatus) -> bool {
        match self {
            StatusGuard::Is(expected) => status == *expected,
            StatusGuard::IsNot(excluded) => status != *excluded,
        }
    }
}

/// Fields to change on a document
///
/// `None` leaves a field untouched. `analysis: Some(None)` clears the stored
/// analysis. `updated_date` is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPatch {
    pub status: Option<DocumentStatus>,
    pub analysis: Option<Option<AnalysisResult>>,
    pub review: Option<Option<Review>>,
    pub updated_date: DateTime<Utc>,
}

impl Default for DocumentPatch {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self {
            status: None,
            analysis: None,
            review: None,
            updated_date: Utc::now(),
        }
    }

    pub fn status(status: DocumentStatus) -> Self {
        Self::new().with_status(status)
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis = Some(Some(analysis));
        self
    }

    pub fn clear_analysis(mut self) -> Self {
        self.analysis = Some(None);
        self
    }

    pub fn with_review(mut self, review: Review) -> Self {
        self.review = Some(Some(review));
        self
    }

    pub fn clear_review(mut self) -> Self {
        self.review = Some(None);
        self
    }

    /// Apply the patch to an in-memory record
    pub fn apply_to(&self, document: &mut Document) {
        if let Some(status) = self.status {
            document.status = status;
        }
        if let Some(analysis) = &self.analysis {
            document.analysis = analysis.clone();
        }
        if let Some(review) = &self.review {
            document.review = review.clone();
        }
        document.updated_date = self.updated_date;
    }
}

/// Document accessor used by the analysis lifecycle
///
/// Every method re-reads or writes the backing store; implementations must not
/// cache documents across calls. `conditional_update` must evaluate the guard
/// and apply the patch as one atomic step, so that of two racing callers at
/// most one sees the guard satisfied.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document
    async fn insert(&self, document: &Document) -> StorageResult<()>;

    /// Load a document by ID
    async fn find(&self, id: &DocumentId) -> StorageResult<Option<Document>>;

    /// All documents, newest first
    async fn list(&self) -> StorageResult<Vec<Document>>;

    /// Apply `patch` only if the current status satisfies `guard`.
    ///
    /// Returns whether the patch was applied. A missing document is reported
    /// as `false`.
    async fn conditional_update(
        &self,
        id: &DocumentId,
        guard: StatusGuard,
        patch: &DocumentPatch,
    ) -> StorageResult<bool>;

    /// Apply `patch` unconditionally. Returns whether the document exists.
    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> StorageResult<bool>;

    /// Delete a document only if its current status satisfies `guard`.
    ///
    /// Returns whether a row was removed. A missing document is reported as
    /// `false`.
    async fn conditional_delete(&self, id: &DocumentId, guard: StatusGuard) -> StorageResult<bool>;

    /// Compare-and-set on the status field alone
    async fn conditional_update_status(
        &self,
        id: &DocumentId,
        guard: StatusGuard,
        new_status: DocumentStatus,
    ) -> StorageResult<bool> {
        self.conditional_update(id, guard, &DocumentPatch::status(new_status))
            .await
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: DocumentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
