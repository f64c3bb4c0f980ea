// ./infrastructure/src/persistence/in_memory_store.rs
use application::{ApplicationError, DocumentStore, StoredDocument};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};

/// `DocumentStore` kept entirely in process memory.
///
/// Preserves insertion order per collection and assigns sequential text
/// identifiers, standing in for the external datastore in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    // Collection name -> documents in insertion order
    collections: Arc<DashMap<String, Vec<StoredDocument>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{n:024x}")
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[instrument(skip(self, document))]
    async fn insert(&self, collection: &str, document: Value) -> Result<(), ApplicationError> {
        let Value::Object(fields) = document else {
            return Err(ApplicationError::Storage(
                "Document must be a JSON object".to_string(),
            ));
        };
        let stored = StoredDocument {
            id: Some(self.assign_id()),
            fields,
        };
        debug!(collection = %collection, id = ?stored.id, "Storing document in memory");
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(stored);
        Ok(())
    }

    #[instrument(skip(self, filter))]
    async fn find(
        &self,
        collection: &str,
        filter: Value,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, ApplicationError> {
        let matches_filter = |doc: &StoredDocument| match &filter {
            Value::Object(conditions) => conditions
                .iter()
                .all(|(key, expected)| doc.fields.get(key) == Some(expected)),
            Value::Null => true,
            _ => false,
        };

        let mut documents: Vec<StoredDocument> = self
            .collections
            .get(collection)
            .map(|entry| entry.iter().filter(|doc| matches_filter(doc)).cloned().collect())
            .unwrap_or_default();

        // Mirrors the datastore's limit semantics: zero means unbounded,
        // negative caps at the magnitude.
        let cap = limit.unsigned_abs() as usize;
        if cap > 0 {
            documents.truncate(cap);
        }
        debug!(collection = %collection, count = documents.len(), "Fetched documents from memory");
        Ok(documents)
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<String>, ApplicationError> {
        Ok(self
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }
}
