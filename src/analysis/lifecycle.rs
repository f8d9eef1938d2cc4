//! Analysis lifecycle: legal status transitions of a document
//!
//! All coordination between concurrent callers goes through guarded writes
//! on the document store. Nothing here reads a status and then writes based
//! on it; the read after a rejected write only picks the error to report.

use super::types::{AnalysisError, AnalysisOutcome, AnalysisResult, AnalysisState, AnalysisView};
use crate::content::ContentStore;
use crate::document::{Document, DocumentId, DocumentStatus, Review};
use crate::storage::{DocumentPatch, DocumentStore, StatusGuard};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Status transitions for document analysis
#[derive(Clone)]
pub struct AnalysisLifecycle {
    store: Arc<dyn DocumentStore>,
}

impl AnalysisLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Claim the document for an analysis run (`* -> submitted`).
    ///
    /// Fails with `Conflict` if a run is already in flight. The analysis
    /// field is left untouched.
    pub async fn begin_analysis(&self, id: &DocumentId) -> AnalysisOutcome<()> {
        let claimed = self
            .store
            .conditional_update_status(
                id,
                StatusGuard::IsNot(DocumentStatus::Submitted),
                DocumentStatus::Submitted,
            )
            .await?;

        if claimed {
            info!(document_id = %id, "analysis submitted");
            return Ok(());
        }

        match self.store.find(id).await? {
            None => Err(AnalysisError::document_not_found(id)),
            Some(_) => Err(AnalysisError::Conflict(
                "analysis already in progress for this document".to_string(),
            )),
        }
    }

    /// Store a finished result (`submitted -> completed`).
    ///
    /// Any earlier review is dropped; it belonged to a previous result.
    pub async fn complete_analysis(
        &self,
        id: &DocumentId,
        result: AnalysisResult,
    ) -> AnalysisOutcome<()> {
        let entities = result.entities.len();
        let relations = result.relations.len();
        let patch = DocumentPatch::status(DocumentStatus::Completed)
            .with_analysis(result)
            .clear_review();

        if !self.store.update(id, &patch).await? {
            return Err(AnalysisError::document_not_found(id));
        }

        info!(document_id = %id, entities, relations, "analysis completed");
        Ok(())
    }

    /// Record a failed run (`submitted -> failed`), clearing any analysis.
    ///
    /// `cause` is logged in full and not returned.
    pub async fn fail_analysis(
        &self,
        id: &DocumentId,
        cause: &(dyn Display + Sync),
    ) -> AnalysisOutcome<()> {
        error!(document_id = %id, cause = %cause, "analysis failed");

        let patch = DocumentPatch::status(DocumentStatus::Failed)
            .clear_analysis()
            .clear_review();

        if !self.store.update(id, &patch).await? {
            warn!(document_id = %id, "failed document no longer exists");
            return Err(AnalysisError::document_not_found(id));
        }
        Ok(())
    }

    /// Current analysis view of a document.
    ///
    /// An in-flight document yields an `InProgress` view rather than an
    /// error. A document that was never analysed yields `NotFound`.
    pub async fn get_analysis(&self, id: &DocumentId) -> AnalysisOutcome<AnalysisView> {
        let document = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AnalysisError::document_not_found(id))?;
        view_of(document)
    }

    /// Commit a reviewer's decision on a completed analysis.
    ///
    /// `completed -> approved` when `approved`, `completed -> reviewed`
    /// otherwise. `Conflict` while a run is in flight or once a decision was
    /// already committed; `NotFound` when there is no analysis to review.
    pub async fn commit_analysis(
        &self,
        id: &DocumentId,
        approved: bool,
        notes: Option<String>,
    ) -> AnalysisOutcome<AnalysisView> {
        let review = Review::new(approved, notes);
        let patch = DocumentPatch::status(review.resulting_status()).with_review(review);

        let committed = self
            .store
            .conditional_update(id, StatusGuard::Is(DocumentStatus::Completed), &patch)
            .await?;

        let document = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AnalysisError::document_not_found(id))?;

        if committed {
            info!(document_id = %id, approved, "analysis committed");
            return view_of(document);
        }

        Err(match document.status {
            status if status.is_in_flight() => AnalysisError::Conflict(
                "analysis is still in progress for this document".to_string(),
            ),
            status if status.is_decided() => AnalysisError::Conflict(format!(
                "analysis was already committed as {}",
                status
            )),
            DocumentStatus::Completed => AnalysisError::Conflict(
                "document changed while committing; retry".to_string(),
            ),
            _ => AnalysisError::NotFound("document analysis not found".to_string()),
        })
    }

    /// Delete a document together with its stored file.
    ///
    /// Refused with `Conflict` while an analysis run holds the document. The
    /// row goes first; a file that cannot be removed afterwards is only
    /// logged.
    pub async fn delete_document(
        &self,
        id: &DocumentId,
        content: &dyn ContentStore,
    ) -> AnalysisOutcome<Document> {
        let document = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AnalysisError::document_not_found(id))?;

        let deleted = self
            .store
            .conditional_delete(id, StatusGuard::IsNot(DocumentStatus::Submitted))
            .await?;
        if !deleted {
            return Err(match self.store.find(id).await? {
                None => AnalysisError::document_not_found(id),
                Some(_) => AnalysisError::Conflict(
                    "cannot delete a document while its analysis is in progress".to_string(),
                ),
            });
        }

        let path = content.resolve(&document);
        if let Err(e) = content.remove(&path).await {
            warn!(document_id = %id, path = %path.display(), error = %e, "deleted document left its file behind");
        }
        info!(document_id = %id, "document deleted");
        Ok(document)
    }
}

fn view_of(document: Document) -> AnalysisOutcome<AnalysisView> {
    let state = match document.status {
        DocumentStatus::Draft => {
            return Err(AnalysisError::NotFound(
                "document analysis not found".to_string(),
            ))
        }
        DocumentStatus::Submitted => AnalysisState::InProgress,
        DocumentStatus::Failed => AnalysisState::Failed,
        DocumentStatus::Completed | DocumentStatus::Approved | DocumentStatus::Reviewed => {
            match document.analysis {
                Some(result) => AnalysisState::Ready {
                    result,
                    review: document.review,
                },
                None => {
                    return Err(AnalysisError::NotFound(
                        "document analysis not found".to_string(),
                    ))
                }
            }
        }
    };

    Ok(AnalysisView {
        document_id: document.id,
        status: document.status,
        state,
        last_updated: document.updated_date,
    })
}
