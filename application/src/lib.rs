use async_trait::async_trait;
use domain::{Message, Project};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// --- Collection Names ---

/// Collection holding the portfolio project records.
pub const PROJECT_COLLECTION: &str = "project";
/// Collection receiving contact-form submissions.
pub const MESSAGE_COLLECTION: &str = "message";

/// Acknowledgment returned for every accepted contact submission.
pub const CONTACT_ACK: &str = "Thanks for reaching out, I'll get back to you soon.";

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// A datastore operation failed. The wrapped detail is for internal
    /// logging only; HTTP responses carry a generic message instead.
    #[error("Storage operation failed: {0}")]
    Storage(String),
}

// --- Infrastructure Interface (Trait) ---

/// A document fetched from the datastore.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Datastore-assigned identifier, rendered as plain text.
    pub id: Option<String>,
    /// The remaining fields of the document.
    pub fields: Map<String, Value>,
}

/// Interface to the external document datastore.
///
/// The datastore assigns document identifiers itself; `find` hands them
/// back already rendered as text so callers never see driver types.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts one document into a named collection.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), ApplicationError>;
    /// Fetches up to `limit` documents matching `filter`, in whatever
    /// order the datastore returns them.
    async fn find(
        &self,
        collection: &str,
        filter: Value,
        limit: i64,
    ) -> Result<Vec<StoredDocument>, ApplicationError>;
    /// Lists the names of all collections in the datastore.
    async fn list_collections(&self) -> Result<Vec<String>, ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// Query parameters accepted by the project listing endpoint.
#[derive(Deserialize, Debug)]
pub struct ProjectsQuery {
    /// Maximum number of records to return. Range is not validated.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

// Function to provide default limit for serde
fn default_limit() -> i64 {
    12
}

/// A project record as surfaced by the listing endpoint: the datastore's
/// fields plus the identifier under `id`.
#[derive(Serialize, Debug, Clone)]
pub struct ProjectRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Serialize, Debug)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectRecord>,
}

/// Plain acknowledgment body, used by the root and contact endpoints.
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Human-readable status report for the diagnostics endpoint.
#[derive(Serialize, Debug)]
pub struct DiagnosticsReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

// --- Application Services (Use Cases) ---

/// Service for listing portfolio projects.
pub struct ProjectService {
    store: Option<Arc<dyn DocumentStore>>,
}

impl ProjectService {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    /// Lists up to `limit` project records from the datastore.
    ///
    /// Without a datastore the fixed sample set is returned as-is; `limit`
    /// only constrains datastore reads.
    #[instrument(skip(self))]
    pub async fn list_projects(&self, limit: i64) -> Result<Vec<ProjectRecord>, ApplicationError> {
        let Some(store) = &self.store else {
            debug!("No datastore configured; returning sample projects");
            return Ok(sample_records());
        };

        let documents = store
            .find(PROJECT_COLLECTION, Value::Object(Map::new()), limit)
            .await?;
        info!(count = documents.len(), "Fetched project records");

        Ok(documents
            .into_iter()
            .map(|doc| ProjectRecord {
                id: doc.id,
                fields: doc.fields,
            })
            .collect())
    }
}

/// The three illustrative records served when no datastore is configured.
fn sample_projects() -> Vec<Project> {
    vec![
        Project {
            title: "Realtime anomaly monitor".to_string(),
            summary: "Detect anomalies on IoT feeds; Kafka + Prophet + fast dashboards."
                .to_string(),
            tags: vec![
                "Time-series".to_string(),
                "Streaming".to_string(),
                "Dash".to_string(),
            ],
            url: None,
            repo: None,
        },
        Project {
            title: "Generative report assistant".to_string(),
            summary: "Retrieves domain docs and drafts analyst-ready summaries.".to_string(),
            tags: vec!["LLM".to_string(), "RAG".to_string(), "LangChain".to_string()],
            url: None,
            repo: None,
        },
        Project {
            title: "Marketing mix modeling".to_string(),
            summary: "Media ROI attribution with uncertainty-aware recommendations.".to_string(),
            tags: vec!["Bayesian".to_string(), "PyMC".to_string()],
            url: None,
            repo: None,
        },
    ]
}

fn sample_records() -> Vec<ProjectRecord> {
    sample_projects()
        .iter()
        .map(|project| {
            // Serializing our own record kind cannot fail.
            let value = serde_json::to_value(project).expect("Project serializes to JSON");
            let Value::Object(fields) = value else {
                unreachable!("Project serializes to a JSON object");
            };
            ProjectRecord { id: None, fields }
        })
        .collect()
}

/// Service for accepting contact-form submissions.
pub struct ContactService {
    store: Option<Arc<dyn DocumentStore>>,
}

impl ContactService {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { store }
    }

    /// Persists a message when a datastore is configured. Without one the
    /// submission is acknowledged and dropped.
    #[instrument(skip(self, message), fields(sender = %message.email))]
    pub async fn submit(&self, message: Message) -> Result<(), ApplicationError> {
        let Some(store) = &self.store else {
            info!("No datastore configured; contact message acknowledged without persisting");
            return Ok(());
        };

        let document = serde_json::to_value(&message)
            .map_err(|e| ApplicationError::Storage(format!("Failed to serialize message: {e}")))?;
        store.insert(MESSAGE_COLLECTION, document).await?;
        info!("Contact message stored");
        Ok(())
    }
}

// At most this many collection names appear in a diagnostics report.
const MAX_REPORTED_COLLECTIONS: usize = 10;
// Enumeration failures are embedded into the status string, truncated.
const MAX_REPORTED_ERROR_CHARS: usize = 80;

/// Service backing the diagnostics endpoint.
///
/// The env-var flags are captured once at startup; they describe the
/// configuration the process was launched with.
pub struct DiagnosticsService {
    store: Option<Arc<dyn DocumentStore>>,
    database_url_set: bool,
    database_name_set: bool,
}

impl DiagnosticsService {
    pub fn new(
        store: Option<Arc<dyn DocumentStore>>,
        database_url_set: bool,
        database_name_set: bool,
    ) -> Self {
        Self {
            store,
            database_url_set,
            database_name_set,
        }
    }

    /// Builds the status report. Never fails: a collection-enumeration
    /// error degrades into the `database` status string.
    #[instrument(skip(self))]
    pub async fn report(&self) -> DiagnosticsReport {
        let connected = self.store.is_some();
        let mut report = DiagnosticsReport {
            backend: "✅ Running".to_string(),
            database: if connected {
                "✅ Connected".to_string()
            } else {
                "❌ Not Available".to_string()
            },
            database_url: if self.database_url_set {
                "✅ Set".to_string()
            } else {
                "❌ Not Set".to_string()
            },
            database_name: if self.database_name_set {
                "✅ Set".to_string()
            } else {
                "❌ Not Set".to_string()
            },
            connection_status: if connected {
                "Connected".to_string()
            } else {
                "Not Connected".to_string()
            },
            collections: Vec::new(),
        };

        if let Some(store) = &self.store {
            match store.list_collections().await {
                Ok(mut names) => {
                    names.truncate(MAX_REPORTED_COLLECTIONS);
                    report.collections = names;
                }
                Err(e) => {
                    warn!("Failed to enumerate collections for diagnostics: {}", e);
                    let detail: String =
                        e.to_string().chars().take(MAX_REPORTED_ERROR_CHARS).collect();
                    report.database = format!("⚠️  Connected but Error: {detail}");
                }
            }
        }

        report
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use domain::EmailAddress;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records inserts and serves canned finds/listings.
    struct FakeStore {
        inserted: Mutex<Vec<(String, Value)>>,
        documents: Vec<StoredDocument>,
        collections: Result<Vec<String>, String>,
    }

    impl Default for FakeStore {
        fn default() -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                documents: Vec::new(),
                collections: Ok(Vec::new()),
            }
        }
    }

    impl FakeStore {
        fn with_documents(documents: Vec<StoredDocument>) -> Self {
            Self {
                documents,
                ..Self::default()
            }
        }

        fn with_collections(collections: Result<Vec<String>, String>) -> Self {
            Self {
                collections,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        async fn insert(&self, collection: &str, document: Value) -> Result<(), ApplicationError> {
            self.inserted
                .lock()
                .unwrap()
                .push((collection.to_string(), document));
            Ok(())
        }

        async fn find(
            &self,
            _collection: &str,
            _filter: Value,
            limit: i64,
        ) -> Result<Vec<StoredDocument>, ApplicationError> {
            let mut documents = self.documents.clone();
            if limit >= 0 {
                documents.truncate(limit as usize);
            }
            Ok(documents)
        }

        async fn list_collections(&self) -> Result<Vec<String>, ApplicationError> {
            self.collections
                .clone()
                .map_err(ApplicationError::Storage)
        }
    }

    /// A store whose every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn insert(&self, _: &str, _: Value) -> Result<(), ApplicationError> {
            Err(ApplicationError::Storage("connection reset".to_string()))
        }
        async fn find(
            &self,
            _: &str,
            _: Value,
            _: i64,
        ) -> Result<Vec<StoredDocument>, ApplicationError> {
            Err(ApplicationError::Storage("connection reset".to_string()))
        }
        async fn list_collections(&self) -> Result<Vec<String>, ApplicationError> {
            Err(ApplicationError::Storage("connection reset".to_string()))
        }
    }

    fn contact_message() -> Message {
        Message {
            name: "Jane".to_string(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            subject: Some("Hello".to_string()),
            message: "I'd like to talk about a project.".to_string(),
        }
    }

    #[tokio::test]
    async fn listing_without_store_returns_samples_for_any_limit() {
        let service = ProjectService::new(None);
        let baseline = service.list_projects(12).await.unwrap();
        assert_eq!(baseline.len(), 3);
        assert_eq!(
            baseline[0].fields["title"],
            json!("Realtime anomaly monitor")
        );
        assert!(baseline.iter().all(|record| record.id.is_none()));

        for limit in [0, -5, 1, 10_000] {
            let records = service.list_projects(limit).await.unwrap();
            assert_eq!(records.len(), baseline.len(), "limit {limit} changed the samples");
        }
    }

    #[tokio::test]
    async fn listing_with_store_surfaces_id_and_fields() {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!("Weather dashboard"));
        fields.insert("summary".to_string(), json!("Live conditions."));
        let store: Arc<dyn DocumentStore> = Arc::new(FakeStore::with_documents(vec![
            StoredDocument {
                id: Some("65f0aa00deadbeef00000001".to_string()),
                fields: fields.clone(),
            },
        ]));

        let service = ProjectService::new(Some(store));
        let records = service.list_projects(12).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].id.as_deref(),
            Some("65f0aa00deadbeef00000001")
        );
        assert_eq!(records[0].fields, fields);
    }

    #[tokio::test]
    async fn submit_without_store_persists_nothing() {
        let service = ContactService::new(None);
        assert!(service.submit(contact_message()).await.is_ok());
    }

    #[tokio::test]
    async fn submit_with_store_inserts_into_message_collection() {
        let store = Arc::new(FakeStore::default());
        let service = ContactService::new(Some(store.clone() as Arc<dyn DocumentStore>));
        service.submit(contact_message()).await.unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        let (collection, document) = &inserted[0];
        assert_eq!(collection, MESSAGE_COLLECTION);
        assert_eq!(document["email"], json!("jane@example.com"));
        assert_eq!(document["message"], json!("I'd like to talk about a project."));
    }

    #[tokio::test]
    async fn submit_failure_is_a_storage_error() {
        let service = ContactService::new(Some(Arc::new(BrokenStore) as Arc<dyn DocumentStore>));
        let result = service.submit(contact_message()).await;
        assert!(matches!(result, Err(ApplicationError::Storage(_))));
    }

    #[tokio::test]
    async fn diagnostics_without_store_reports_not_connected() {
        // Env flags being set must not change the connection verdict.
        let service = DiagnosticsService::new(None, true, true);
        let report = service.report().await;
        assert_eq!(report.backend, "✅ Running");
        assert_eq!(report.database, "❌ Not Available");
        assert_eq!(report.connection_status, "Not Connected");
        assert_eq!(report.database_url, "✅ Set");
        assert_eq!(report.database_name, "✅ Set");
        assert!(report.collections.is_empty());
    }

    #[tokio::test]
    async fn diagnostics_with_store_caps_collection_names() {
        let names: Vec<String> = (0..15).map(|i| format!("collection_{i}")).collect();
        let store: Arc<dyn DocumentStore> = Arc::new(FakeStore::with_collections(Ok(names)));
        let service = DiagnosticsService::new(Some(store), true, true);
        let report = service.report().await;
        assert_eq!(report.database, "✅ Connected");
        assert_eq!(report.connection_status, "Connected");
        assert_eq!(report.collections.len(), 10);
        assert_eq!(report.collections[0], "collection_0");
    }

    #[tokio::test]
    async fn diagnostics_truncates_enumeration_errors() {
        let long_error = "x".repeat(200);
        let store: Arc<dyn DocumentStore> = Arc::new(FakeStore::with_collections(Err(long_error)));
        let service = DiagnosticsService::new(Some(store), true, true);
        let report = service.report().await;
        assert!(report.database.starts_with("⚠️  Connected but Error: "));
        assert!(report.collections.is_empty());
        // 80 chars of detail at most.
        let detail = report
            .database
            .strip_prefix("⚠️  Connected but Error: ")
            .unwrap();
        assert!(detail.chars().count() <= 80);
    }
}
