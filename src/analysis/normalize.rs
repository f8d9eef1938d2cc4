//! Canonical identity for extracted entities
//!
//! Two entities are the same iff their trimmed `surface` and `concept` are
//! equal. Nothing else about a record takes part in identity.

use super::types::Entity;
use serde_json::Value;

/// Hashable identity of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    surface: String,
    concept: String,
}

impl EntityKey {
    pub fn new(surface: &str, concept: &str) -> Self {
        Self {
            surface: surface.trim().to_string(),
            concept: concept.trim().to_string(),
        }
    }

    pub fn of(entity: &Entity) -> Self {
        Self::new(&entity.surface, &entity.concept)
    }

    /// Key for a raw JSON record.
    ///
    /// Key order and any fields other than `surface`/`concept` are ignored.
    /// Returns `None` when either field is missing or not a string.
    pub fn from_record(record: &Value) -> Option<Self> {
        let surface = record.get("surface")?.as_str()?;
        let concept = record.get("concept")?.as_str()?;
        Some(Self::new(surface, concept))
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }
}

impl From<&Entity> for EntityKey {
    fn from(entity: &Entity) -> Self {
        Self::of(entity)
    }
}
