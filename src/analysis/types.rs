//! Core types for document analysis

use super::normalize::EntityKey;
use crate::document::{DocumentId, DocumentStatus, Review};
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A mention in the text and its semantic type label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// The text as it appears in the document
    pub surface: String,
    /// The concept (type) the mention belongs to, e.g. "Person"
    pub concept: String,
}

impl Entity {
    pub fn new(surface: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            concept: concept.into(),
        }
    }

    /// Identity of this entity for deduplication
    pub fn key(&self) -> EntityKey {
        EntityKey::of(self)
    }
}

/// A subject-predicate-argument triple plus the passage that licenses it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub subject: Entity,
    pub predicate: String,
    pub argument: Entity,
    #[serde(default)]
    pub context: String,
}

impl Relation {
    pub fn new(
        subject: Entity,
        predicate: impl Into<String>,
        argument: Entity,
        context: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            argument,
            context: context.into(),
        }
    }
}

/// Unified result of one analysis run
///
/// `entities` holds no two entries with the same [`EntityKey`]; their order is
/// not meaningful. `relations` keeps extraction order and is never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set of entity identities, for order-insensitive comparison
    pub fn entity_keys(&self) -> HashSet<EntityKey> {
        self.entities.iter().map(EntityKey::of).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// What a reader sees of a document's analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    /// A run is in flight; no result is available yet
    InProgress,
    /// The last run failed; a new run may be started
    Failed,
    /// A finished result, possibly with a committed review
    Ready {
        result: AnalysisResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        review: Option<Review>,
    },
}

/// Read-side view returned by `get_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisView {
    pub document_id: DocumentId,
    pub status: DocumentStatus,
    #[serde(flatten)]
    pub state: AnalysisState,
    pub last_updated: DateTime<Utc>,
}

impl AnalysisView {
    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, AnalysisState::InProgress)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            AnalysisState::Ready { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Errors surfaced by the analysis lifecycle
///
/// Messages are safe to show to callers; extraction internals are logged,
/// never carried here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(
        "document {document_id} was found, but its file '{path}' could not be located; \
         it may have been moved or deleted"
    )]
    FileMissing { document_id: DocumentId, path: String },

    #[error("analysis failed for document {0}")]
    ExtractionFailed(DocumentId),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AnalysisError {
    pub(crate) fn document_not_found(id: &DocumentId) -> Self {
        Self::NotFound(format!("document {} not found", id))
    }

    /// HTTP-equivalent status code for the API boundary
    pub fn status_code(&self) -> u16 {
        match self {
            AnalysisError::NotFound(_) => 404,
            AnalysisError::Conflict(_) => 409,
            AnalysisError::FileMissing { .. } => 424,
            AnalysisError::ExtractionFailed(_) => 408,
            AnalysisError::Storage(_) => 500,
        }
    }

    /// Whether the caller may sensibly try the same request again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Conflict(_) | AnalysisError::ExtractionFailed(_)
        )
    }
}

/// Result type for analysis lifecycle operations
pub type AnalysisOutcome<T> = Result<T, AnalysisError>;
