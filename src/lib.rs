//! docanalysis: document analysis lifecycle
//!
//! Registers uploaded documents, runs LLM-backed entity and relation
//! extraction on them, and tracks each document through analysis and review.
//!
//! # Core Concepts
//!
//! - **Documents**: a stored file plus its status (`draft`, `submitted`, `completed`, ...)
//! - **Extraction**: one or more LLM passes producing raw entities and relations
//! - **Analysis**: the merged, deduplicated result of a run, reviewed by a human
//!
//! # Example
//!
//! ```
//! use docanalysis::{Document, DocumentStatus};
//!
//! let document = Document::new_draft("Quarterly report", "report.txt");
//! assert_eq!(document.status, DocumentStatus::Draft);
//! ```

pub mod analysis;
pub mod config;
pub mod content;
mod document;
pub mod extraction;
pub mod storage;

pub use analysis::{
    AnalysisError, AnalysisLifecycle, AnalysisOrchestrator, AnalysisOutcome, AnalysisResult,
    AnalysisState, AnalysisView, Entity, EntityKey, Relation, ResultMerger,
};
pub use config::{Config, ConfigError};
pub use content::{register_document, ContentStore, RegisterError, UploadDir};
pub use document::{Document, DocumentId, DocumentStatus, Review};
pub use extraction::{ExtractionError, ExtractionOutput, ExtractionPipeline, FramePipeline, PassOutput};
pub use storage::{DocumentStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
