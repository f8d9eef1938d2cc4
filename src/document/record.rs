//! The document record and its identifier

use super::status::DocumentStatus;
use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random DocumentId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A reviewer's decision on a completed analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

impl Review {
    pub fn new(approved: bool, notes: Option<String>) -> Self {
        Self {
            approved,
            notes,
            reviewed_at: Utc::now(),
        }
    }

    /// Status a document moves to once this review is committed
    pub fn resulting_status(&self) -> DocumentStatus {
        if self.approved {
            DocumentStatus::Approved
        } else {
            DocumentStatus::Reviewed
        }
    }
}

/// A document record
///
/// `file_path` is relative to the content store root and never changes after
/// creation. `analysis` is replaced when a run completes and cleared when one
/// fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub file_path: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub review: Option<Review>,
    pub creation_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Document {
    /// Create a new `draft` document
    pub fn new_draft(title: impl Into<String>, file_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            title: title.into(),
            file_path: file_path.into(),
            status: DocumentStatus::Draft,
            analysis: None,
            review: None,
            creation_date: now,
            updated_date: now,
        }
    }

    /// Override the generated id (useful when the id is part of the stored file name)
    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }
}
