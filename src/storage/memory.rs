//! In-memory storage backend

use super::traits::{DocumentPatch, DocumentStore, StatusGuard, StorageError, StorageResult};
use crate::document::{Document, DocumentId};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Document store backed by a `DashMap`
///
/// Guarded updates run while holding the entry's shard lock, which makes the
/// check-and-set atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<DocumentId, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, document: &Document) -> StorageResult<()> {
        match self.documents.entry(document.id) {
            Entry::Occupied(_) => Err(StorageError::DuplicateDocument(document.id)),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                Ok(())
            }
        }
    }

    async fn find(&self, id: &DocumentId) -> StorageResult<Option<Document>> {
        Ok(self.documents.get(id).map(|doc| doc.value().clone()))
    }

    async fn list(&self) -> StorageResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        docs.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
        Ok(docs)
    }

    async fn conditional_update(
        &self,
        id: &DocumentId,
        guard: StatusGuard,
        patch: &DocumentPatch,
    ) -> StorageResult<bool> {
        let Some(mut doc) = self.documents.get_mut(id) else {
            return Ok(false);
        };
        if !guard.admits(doc.status) {
            return Ok(false);
        }
        patch.apply_to(&mut doc);
        Ok(true)
    }

    async fn update(&self, id: &DocumentId, patch: &DocumentPatch) -> StorageResult<bool> {
        match self.documents.get_mut(id) {
            Some(mut doc) => {
                patch.apply_to(&mut doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn conditional_delete(&self, id: &DocumentId, guard: StatusGuard) -> StorageResult<bool> {
        Ok(self
            .documents
            .remove_if(id, |_, doc| guard.admits(doc.status))
            .is_some())
    }
}
