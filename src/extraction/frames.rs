//! Extraction frames: the per-pass configuration steering an LLM pass
//!
//! A frame's category data is opaque here; it is rendered into the prompt
//! verbatim and never interpreted.

use serde::{Deserialize, Serialize};
use std::path::Path;

const RELATIONS_PROMPT: &str = r#"Extract entities and the relations between them from the text below.
Classify each entity with one of the concepts of this frame:
{{ frame }}

Text: {{ text }}

Return JSON:
{
  "entities": [{"surface": "entity text", "concept": "Concept"}],
  "relations": [
    {
      "subject": {"surface": "text", "concept": "Concept"},
      "predicate": "relationship",
      "argument": {"surface": "text", "concept": "Concept"},
      "context": "sentence stating the relationship"
    }
  ]
}"#;

const SITUATIONS_PROMPT: &str = r#"Identify the situations (events, states, actions) described in the text below,
and the participants playing a role in each. Use the roles and concepts of this frame:
{{ frame }}

Text: {{ text }}

Return JSON:
{
  "entities": [{"surface": "participant text", "concept": "Concept"}],
  "relations": [
    {
      "subject": {"surface": "situation text", "concept": "Situation"},
      "predicate": "role",
      "argument": {"surface": "participant text", "concept": "Concept"},
      "context": "passage describing the situation"
    }
  ]
}"#;

/// Configuration of one extraction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionFrame {
    /// Pass name; also the key of the pass in the pipeline output
    pub name: String,
    /// Prompt template with `{{ text }}` and `{{ frame }}` placeholders
    pub prompt: String,
    /// Concept/role categories for this pass
    #[serde(default)]
    pub categories: serde_yaml::Value,
}

impl ExtractionFrame {
    pub fn new(
        name: impl Into<String>,
        prompt: impl Into<String>,
        categories: serde_yaml::Value,
    ) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            categories,
        }
    }

    /// Relation-centric pass over people, places, organizations and concepts
    pub fn relations() -> Self {
        Self::new(
            "relations",
            RELATIONS_PROMPT,
            string_list(&["Person", "Place", "Organization", "Event", "Concept"]),
        )
    }

    /// Event/situation-centric pass
    pub fn situations() -> Self {
        Self::new(
            "situations",
            SITUATIONS_PROMPT,
            string_list(&["Agent", "Patient", "Location", "Time", "Instrument"]),
        )
    }

    /// Render the prompt for a document text
    pub fn render(&self, text: &str) -> String {
        let frame = serde_yaml::to_string(&self.categories).unwrap_or_default();
        self.prompt
            .replace("{{ frame }}", frame.trim_end())
            .replace("{{ text }}", text)
    }
}

fn string_list(items: &[&str]) -> serde_yaml::Value {
    serde_yaml::Value::Sequence(
        items
            .iter()
            .map(|s| serde_yaml::Value::String((*s).to_string()))
            .collect(),
    )
}

/// Errors loading a frame file
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("cannot read frame file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frame file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("frame file defines no passes")]
    Empty,
    #[error("duplicate pass name '{0}'")]
    DuplicateName(String),
}

#[derive(Deserialize)]
struct FrameFile {
    passes: Vec<ExtractionFrame>,
}

/// The default pass list: relations, then situations
pub fn default_frames() -> Vec<ExtractionFrame> {
    vec![ExtractionFrame::relations(), ExtractionFrame::situations()]
}

/// Parse a YAML document of the form `passes: [{name, prompt, categories}, ...]`
pub fn frames_from_yaml(source: &str) -> Result<Vec<ExtractionFrame>, FrameError> {
    let file: FrameFile = serde_yaml::from_str(source)?;
    if file.passes.is_empty() {
        return Err(FrameError::Empty);
    }
    let mut names = std::collections::HashSet::new();
    for frame in &file.passes {
        if !names.insert(frame.name.as_str()) {
            return Err(FrameError::DuplicateName(frame.name.clone()));
        }
    }
    Ok(file.passes)
}

/// Load frames from a YAML file
pub fn load_frames(path: &Path) -> Result<Vec<ExtractionFrame>, FrameError> {
    let source = std::fs::read_to_string(path)?;
    frames_from_yaml(&source)
}
