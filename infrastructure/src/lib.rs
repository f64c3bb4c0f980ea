// Module declarations
pub mod connection;
pub mod persistence;

// Re-export all implementations
pub use connection::{connect_from_env, DATABASE_NAME_VAR, DATABASE_URL_VAR};
pub use persistence::{InMemoryDocumentStore, MongoDocumentStore};
