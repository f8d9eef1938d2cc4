//! Extraction: turning a stored file into raw entities and relations
//!
//! The analysis orchestrator only depends on the [`ExtractionPipeline`] trait.
//! [`FramePipeline`] is the LLM-backed implementation: it reads the document
//! text and runs one completion per [`ExtractionFrame`] (by default a
//! relation-centric and a situation-centric pass).

mod frames;
mod llm;
mod pipeline;
mod types;

pub use frames::{default_frames, frames_from_yaml, load_frames, ExtractionFrame, FrameError};
pub use llm::{CompletionRequest, LlmClient, LlmError, LlmSettings, MockClient, OpenRouterClient};
pub use pipeline::{ExtractionError, ExtractionPipeline, FramePipeline};
pub use types::{DecodeReport, ExtractionOutput, PassOutput};
