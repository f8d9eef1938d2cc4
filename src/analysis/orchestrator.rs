//! Analysis orchestrator: one end-to-end analysis run
//!
//! A run claims the document, checks its file, runs extraction, merges the
//! passes and records the outcome. Once a run has claimed a document, it always leaves
//! it `completed` or `failed`, including when extraction panics or the
//! caller drops the run future.

use super::lifecycle::AnalysisLifecycle;
use super::merger::ResultMerger;
use super::types::{AnalysisError, AnalysisOutcome, AnalysisView};
use crate::content::ContentStore;
use crate::document::{Document, DocumentId};
use crate::extraction::{ExtractionError, ExtractionOutput, ExtractionPipeline};
use crate::storage::DocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

/// Drives analysis runs against a document store
pub struct AnalysisOrchestrator {
    store: Arc<dyn DocumentStore>,
    content: Arc<dyn ContentStore>,
    pipeline: Arc<dyn ExtractionPipeline>,
    lifecycle: AnalysisLifecycle,
    merger: ResultMerger,
    /// Upper bound on a single extraction; `None` waits indefinitely
    extraction_timeout: Option<Duration>,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        content: Arc<dyn ContentStore>,
        pipeline: Arc<dyn ExtractionPipeline>,
    ) -> Self {
        Self {
            lifecycle: AnalysisLifecycle::new(store.clone()),
            store,
            content,
            pipeline,
            merger: ResultMerger,
            extraction_timeout: None,
        }
    }

    /// Bound each extraction; a run exceeding it fails the analysis
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = Some(timeout);
        self
    }

    /// Analyse a document and return it in its final state.
    ///
    /// Errors:
    /// - `NotFound` if the document does not exist
    /// - `Conflict` if another run holds the document; nothing is changed
    /// - `FileMissing` if the stored file is gone; the document is `failed`
    /// - `ExtractionFailed` for any extraction error; the document is `failed`
    /// - `Storage` if recording the outcome fails
    pub async fn run_analysis(&self, id: &DocumentId) -> AnalysisOutcome<Document> {
        let document = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AnalysisError::document_not_found(id))?;

        self.lifecycle.begin_analysis(id).await?;
        let mut guard = InFlightGuard::arm(self.lifecycle.clone(), *id);

        let path = self.content.resolve(&document);
        if !self.content.exists(&path).await {
            let cause = format!("file not found at {}", path.display());
            self.lifecycle.fail_analysis(id, &cause).await?;
            guard.disarm();
            return Err(AnalysisError::FileMissing {
                document_id: *id,
                path: document.file_path,
            });
        }

        info!(document_id = %id, path = %path.display(), "running extraction");
        match self.extract(path, &mut guard).await {
            Ok(output) => {
                let result = self.merger.merge(&output);
                self.lifecycle.complete_analysis(id, result).await?;
            }
            Err(e) => {
                self.lifecycle.fail_analysis(id, &e).await?;
                guard.disarm();
                return Err(AnalysisError::ExtractionFailed(*id));
            }
        }
        guard.disarm();

        self.store
            .find(id)
            .await?
            .ok_or_else(|| AnalysisError::document_not_found(id))
    }

    pub async fn get_analysis(&self, id: &DocumentId) -> AnalysisOutcome<AnalysisView> {
        self.lifecycle.get_analysis(id).await
    }

    pub async fn commit_analysis(
        &self,
        id: &DocumentId,
        approved: bool,
        notes: Option<String>,
    ) -> AnalysisOutcome<AnalysisView> {
        self.lifecycle.commit_analysis(id, approved, notes).await
    }

    /// Delete a document and its stored file; see
    /// [`AnalysisLifecycle::delete_document`]
    pub async fn delete_document(&self, id: &DocumentId) -> AnalysisOutcome<Document> {
        self.lifecycle
            .delete_document(id, self.content.as_ref())
            .await
    }

    /// Run the pipeline on its own task so a panic surfaces as an error
    async fn extract(
        &self,
        path: PathBuf,
        guard: &mut InFlightGuard,
    ) -> Result<ExtractionOutput, ExtractionError> {
        let pipeline = self.pipeline.clone();
        let mut task = tokio::spawn(async move { pipeline.run(&path).await });
        guard.track(task.abort_handle());

        let joined = match self.extraction_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    return Err(ExtractionError::Timeout(limit));
                }
            },
            None => task.await,
        };

        let output = joined.map_err(|e| {
            if e.is_panic() {
                ExtractionError::Aborted("extraction task panicked".to_string())
            } else {
                ExtractionError::Aborted(e.to_string())
            }
        })??;

        debug!(passes = output.len(), "extraction finished");
        Ok(output)
    }
}

/// Marks a claimed document failed if the run ends without recording an
/// outcome (the run future was dropped, or the final write errored).
struct InFlightGuard {
    lifecycle: AnalysisLifecycle,
    id: DocumentId,
    extraction: Option<AbortHandle>,
    armed: bool,
}

impl InFlightGuard {
    fn arm(lifecycle: AnalysisLifecycle, id: DocumentId) -> Self {
        Self {
            lifecycle,
            id,
            extraction: None,
            armed: true,
        }
    }

    fn track(&mut self, task: AbortHandle) {
        self.extraction = Some(task);
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(task) = self.extraction.take() {
            task.abort();
        }

        warn!(document_id = %self.id, "analysis run interrupted; marking document failed");
        let lifecycle = self.lifecycle.clone();
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = lifecycle.fail_analysis(&id, &"analysis run interrupted").await {
                        error!(document_id = %id, error = %e, "could not mark interrupted analysis failed");
                    }
                });
            }
            Err(_) => {
                error!(document_id = %id, "no runtime to record interrupted analysis; document left submitted");
            }
        }
    }
}
