//! Document analysis lifecycle
//!
//! Turns a registered document into a reviewed analysis:
//!
//! - **EntityKey**: identity of an extracted entity (surface + concept)
//! - **ResultMerger**: folds per-pass extraction output into one [`AnalysisResult`]
//! - **AnalysisLifecycle**: guarded status transitions on the document store
//! - **AnalysisOrchestrator**: one end-to-end run with guaranteed cleanup
//!
//! # Status transitions
//!
//! ```text
//! draft|completed|failed|approved|reviewed --begin--> submitted
//! submitted --complete--> completed
//! submitted --fail--> failed
//! completed --commit(approve)--> approved
//! completed --commit(reject)--> reviewed
//! ```
//!
//! At most one run is in flight per document: `begin` is a single guarded
//! write that refuses documents already `submitted`.
//!
//! # Example
//!
//! ```ignore
//! use docanalysis::analysis::AnalysisOrchestrator;
//! use docanalysis::content::UploadDir;
//! use docanalysis::extraction::{FramePipeline, MockClient};
//! use docanalysis::storage::{OpenStore, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::open(&db_path)?);
//! let pipeline = Arc::new(FramePipeline::new(Arc::new(MockClient::new())));
//! let orchestrator = AnalysisOrchestrator::new(store, Arc::new(UploadDir::new("uploads")), pipeline);
//!
//! let document = orchestrator.run_analysis(&id).await?;
//! orchestrator.commit_analysis(&id, true, None).await?;
//! ```

mod lifecycle;
mod merger;
mod normalize;
mod orchestrator;
mod types;

pub use lifecycle::AnalysisLifecycle;
pub use merger::ResultMerger;
pub use normalize::EntityKey;
pub use orchestrator::AnalysisOrchestrator;
pub use types::{
    AnalysisError, AnalysisOutcome, AnalysisResult, AnalysisState, AnalysisView, Entity, Relation,
};
