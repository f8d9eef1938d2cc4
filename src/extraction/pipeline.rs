//! Extraction pipeline: file path in, per-pass entities and relations out

use super::frames::{default_frames, ExtractionFrame};
use super::llm::{CompletionRequest, LlmClient, LlmError};
use super::types::{ExtractionOutput, PassOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Errors raised by an extraction pipeline
///
/// These carry internal detail (paths, model errors) and are meant for logs.
/// The orchestrator never forwards them to callers.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("pass '{pass}' failed: {source}")]
    Llm {
        pass: String,
        #[source]
        source: LlmError,
    },

    #[error("pass '{pass}' returned invalid JSON: {message}")]
    InvalidResponse { pass: String, message: String },

    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("extraction aborted: {0}")]
    Aborted(String),
}

/// The extraction collaborator driven by the analysis orchestrator
///
/// Implementations may take a long time (LLM latency) and may fail in any
/// way; the orchestrator treats every error the same.
#[async_trait]
pub trait ExtractionPipeline: Send + Sync {
    async fn run(&self, path: &Path) -> Result<ExtractionOutput, ExtractionError>;
}

/// File extensions the pipeline can read as text
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Normalize whitespace: trim lines, drop repeated blank lines
fn clean_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut blank_run = 0;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }
    cleaned.trim().to_string()
}

/// Read a document's text, refusing formats we cannot convert
async fn read_text(path: &Path) -> Result<String, ExtractionError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ExtractionError::UnsupportedFormat(if extension.is_empty() {
            "(no extension)".to_string()
        } else {
            format!(".{}", extension)
        }));
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractionError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(clean_text(&raw))
}

/// Decode one pass reply. A reply that is valid JSON but not an object
/// yields an absent pass.
fn decode_reply(pass: &str, reply: &str) -> Result<Option<PassOutput>, ExtractionError> {
    let body: Value =
        serde_json::from_str(reply).map_err(|e| ExtractionError::InvalidResponse {
            pass: pass.to_string(),
            message: e.to_string(),
        })?;

    if !body.is_object() {
        warn!(pass, "pass reply is not a JSON object; treating pass as absent");
        return Ok(None);
    }

    let (output, report) = PassOutput::decode(&body);
    if !report.is_clean() {
        warn!(
            pass,
            rejected_entities = report.rejected_entities,
            rejected_relations = report.rejected_relations,
            malformed_collections = report.malformed_collections,
            "dropped malformed records"
        );
    }
    Ok(Some(output))
}

/// LLM-backed pipeline running one completion per frame
///
/// Passes run concurrently; the output keeps frame order. Any pass failure
/// fails the whole run.
pub struct FramePipeline {
    client: Arc<dyn LlmClient>,
    frames: Vec<ExtractionFrame>,
}

impl FramePipeline {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_frames(client, default_frames())
    }

    pub fn with_frames(client: Arc<dyn LlmClient>, frames: Vec<ExtractionFrame>) -> Self {
        Self { client, frames }
    }

    pub fn frames(&self) -> &[ExtractionFrame] {
        &self.frames
    }
}

#[async_trait]
impl ExtractionPipeline for FramePipeline {
    async fn run(&self, path: &Path) -> Result<ExtractionOutput, ExtractionError> {
        let text = read_text(path).await?;
        debug!(path = %path.display(), chars = text.len(), passes = self.frames.len(), "running extraction passes");

        let mut tasks = JoinSet::new();
        for (index, frame) in self.frames.iter().enumerate() {
            let client = self.client.clone();
            let request = CompletionRequest {
                pass: frame.name.clone(),
                prompt: frame.render(&text),
            };
            tasks.spawn(async move {
                let reply = client.complete(&request).await;
                (index, request.pass, reply)
            });
        }

        let mut slots: Vec<Option<(String, Option<PassOutput>)>> = vec![None; self.frames.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, pass, reply) =
                joined.map_err(|e| ExtractionError::Aborted(e.to_string()))?;
            let reply = reply.map_err(|source| ExtractionError::Llm {
                pass: pass.clone(),
                source,
            })?;
            let decoded = decode_reply(&pass, &reply)?;
            slots[index] = Some((pass, decoded));
        }

        let mut output = ExtractionOutput::new();
        for (pass, decoded) in slots.into_iter().flatten() {
            output.push(pass, decoded);
        }
        Ok(output)
    }
}
