//! Canned LLM replies for integration tests
//!
//! Used when the `real_llm` feature is disabled.

use async_trait::async_trait;
use docanalysis::extraction::{CompletionRequest, LlmClient, LlmError, MockClient};
use std::sync::Arc;
use tokio::sync::Semaphore;

const RELATIONS_REPLY: &str = r#"{
  "entities": [
    {"surface": "Mario", "concept": "Person"},
    {"surface": "Rome", "concept": "Place"}
  ],
  "relations": [
    {
      "subject": {"surface": "Mario", "concept": "Person"},
      "predicate": "lives_in",
      "argument": {"surface": "Rome", "concept": "Place"},
      "context": "Mario lives in Rome."
    }
  ]
}"#;

// Same Mario entity with its keys in the other order, same relation again.
const SITUATIONS_REPLY: &str = r#"{
  "entities": [
    {"concept": "Person", "surface": "Mario"},
    {"surface": "living", "concept": "Situation"}
  ],
  "relations": [
    {
      "subject": {"surface": "Mario", "concept": "Person"},
      "predicate": "lives_in",
      "argument": {"surface": "Rome", "concept": "Place"},
      "context": "Mario lives in Rome."
    }
  ]
}"#;

/// Both default passes answer about Mario living in Rome
pub fn mario_client() -> MockClient {
    MockClient::new()
        .with_reply("relations", RELATIONS_REPLY)
        .with_reply("situations", SITUATIONS_REPLY)
}

/// Holds every completion until the test opens the gate
pub struct GatedClient {
    gate: Arc<Semaphore>,
    inner: MockClient,
}

impl GatedClient {
    pub fn new(inner: MockClient) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: gate.clone(),
                inner,
            },
            gate,
        )
    }
}

#[async_trait]
impl LlmClient for GatedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        self.inner.complete(request).await
    }
}
