//! Content store: where uploaded files live
//!
//! Documents only carry a path relative to the store root. The analysis
//! orchestrator resolves it here and checks the file is still present before
//! handing it to the extraction pipeline.

use crate::document::{Document, DocumentId};
use crate::storage::{DocumentStore, StorageError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Locates the stored payload of a document
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Absolute path of the document's stored file
    fn resolve(&self, document: &Document) -> PathBuf;

    /// Whether a file exists at `path`
    async fn exists(&self, path: &Path) -> bool;

    /// Remove the file at `path`. A file that is already gone is not an error.
    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Files stored under a single upload directory
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into the upload directory under a name unique to `id`.
    /// Returns the stored path relative to the root.
    pub async fn import(&self, id: &DocumentId, source: &Path) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let stored = format!("{}_{}", id, name);
        tokio::fs::copy(source, self.root.join(&stored)).await?;
        Ok(stored)
    }
}

#[async_trait]
impl ContentStore for UploadDir {
    fn resolve(&self, document: &Document) -> PathBuf {
        self.root.join(&document.file_path)
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Errors from registering a new document
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("cannot store upload: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Import `source` into `uploads` and insert a draft document for it.
///
/// If the insert fails the imported copy is removed again, so no file is
/// left without a document.
pub async fn register_document(
    store: &dyn DocumentStore,
    uploads: &UploadDir,
    id: DocumentId,
    source: &Path,
    title: impl Into<String>,
) -> Result<Document, RegisterError> {
    let stored = uploads.import(&id, source).await?;
    let document = Document::new_draft(title, stored).with_id(id);

    if let Err(e) = store.insert(&document).await {
        let path = uploads.resolve(&document);
        if let Err(cleanup) = uploads.remove(&path).await {
            warn!(path = %path.display(), error = %cleanup, "could not remove orphaned upload");
        }
        return Err(e.into());
    }
    Ok(document)
}
