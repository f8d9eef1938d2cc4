//! Result merger for combining outputs from multiple extraction passes
//!
//! Entities are deduplicated by [`EntityKey`]; relations are concatenated
//! as-is, since their context passage distinguishes otherwise equal triples.

use super::normalize::EntityKey;
use super::types::{AnalysisResult, Entity};
use crate::extraction::ExtractionOutput;
use std::collections::HashSet;

/// Merges extraction passes into one [`AnalysisResult`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMerger;

impl ResultMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge all passes of one pipeline run.
    ///
    /// Absent passes contribute nothing. For duplicate entities the first one
    /// seen (in pass declaration order) is kept.
    pub fn merge(&self, output: &ExtractionOutput) -> AnalysisResult {
        let mut seen: HashSet<EntityKey> = HashSet::new();
        let mut entities: Vec<Entity> = Vec::new();
        let mut relations = Vec::new();

        for (_, pass) in output.passes() {
            let Some(pass) = pass else {
                continue;
            };

            for entity in &pass.entities {
                if seen.insert(EntityKey::of(entity)) {
                    entities.push(entity.clone());
                }
            }

            relations.extend(pass.relations.iter().cloned());
        }

        AnalysisResult {
            entities,
            relations,
        }
    }
}
