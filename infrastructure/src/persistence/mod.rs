pub mod in_memory_store;
pub mod mongo_store;

// Re-export both store implementations
pub use in_memory_store::InMemoryDocumentStore;
pub use mongo_store::MongoDocumentStore;
