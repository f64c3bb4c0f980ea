// ./infrastructure/src/persistence/mongo_store.rs
use application::{ApplicationError, DocumentStore, StoredDocument};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document};
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::{debug, instrument};

/// `DocumentStore` backed by a MongoDB database.
///
/// The driver connects lazily: constructing the store validates the
/// connection string but does not probe reachability. Concurrent use is
/// safe; the handle is read-only after construction.
#[derive(Debug, Clone)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Parses the connection string and selects `database_name`.
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, ApplicationError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| ApplicationError::Storage(format!("Invalid connection string: {e}")))?;
        Ok(Self::new(client.database(database_name)))
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    #[instrument(skip(self, document))]
    async fn insert(&self, collection: &str, document: Value) -> Result<(), ApplicationError> {
        debug!(collection = %collection, "Inserting document");
        let document = bson::to_document(&document)
            .map_err(|e| ApplicationError::Storage(format!("Failed to encode document: {e}")))?;
        self.database
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self, filter))]
    async fn find(
        &self,
        collection: &str,
        filter: Value,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, ApplicationError> {
        debug!(collection = %collection, limit, "Fetching documents");
        let filter = bson::to_document(&filter)
            .map_err(|e| ApplicationError::Storage(format!("Failed to encode filter: {e}")))?;
        let documents: Vec<Document> = self
            .database
            .collection::<Document>(collection)
            .find(filter)
            .limit(limit)
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))?;

        Ok(documents.into_iter().map(into_stored).collect())
    }

    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<String>, ApplicationError> {
        self.database
            .list_collection_names()
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))
    }
}

/// Splits off the datastore-assigned `_id`, rendered as text, and converts
/// the remaining fields to plain JSON.
fn into_stored(mut document: Document) -> StoredDocument {
    let id = document.remove("_id").map(|id| match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    });
    let fields = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        // A BSON document always converts to a JSON object.
        _ => serde_json::Map::new(),
    };
    StoredDocument { id, fields }
}
