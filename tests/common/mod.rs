//! Common test utilities for docanalysis integration tests
//!
//! A `Workspace` is a throwaway upload directory plus a SQLite database file,
//! so tests can open several stores on the same data.

#![allow(dead_code)]

#[cfg(not(feature = "real_llm"))]
pub mod mock_llm;

use docanalysis::extraction::{FramePipeline, LlmClient};
use docanalysis::{
    register_document, AnalysisOrchestrator, Document, DocumentId, DocumentStore, OpenStore,
    SqliteStore, UploadDir,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

#[cfg(not(feature = "real_llm"))]
pub use mock_llm::{mario_client, GatedClient};

pub struct Workspace {
    dir: TempDir,
    pub store: Arc<SqliteStore>,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = SqliteStore::open(dir.path().join("docs.db")).expect("open store");
        Self {
            dir,
            store: Arc::new(store),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("docs.db")
    }

    pub fn uploads(&self) -> UploadDir {
        UploadDir::new(self.dir.path().join("uploads"))
    }

    /// Open another connection to the same database
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::open(self.db_path()).expect("reopen store")
    }

    /// Store `content` as an upload and register a draft document for it
    pub async fn register(&self, name: &str, content: &str) -> DocumentId {
        let source_dir = self.dir.path().join("incoming");
        std::fs::create_dir_all(&source_dir).expect("create incoming dir");
        let source = source_dir.join(name);
        std::fs::write(&source, content).expect("write source file");

        register_document(self.store.as_ref(), &self.uploads(), DocumentId::new(), &source, name)
            .await
            .expect("register document")
            .id
    }

    /// Whether the stored file of a document is still in the upload dir
    pub fn upload_exists(&self, document: &Document) -> bool {
        self.uploads().root().join(&document.file_path).is_file()
    }

    /// Delete the stored file of a registered document
    pub async fn remove_upload(&self, id: &DocumentId) {
        let document = self.store.find(id).await.unwrap().expect("document exists");
        std::fs::remove_file(self.uploads().root().join(&document.file_path))
            .expect("remove upload");
    }

    pub fn orchestrator(&self, client: impl LlmClient + 'static) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            self.store.clone(),
            Arc::new(self.uploads()),
            Arc::new(FramePipeline::new(Arc::new(client))),
        )
    }
}
