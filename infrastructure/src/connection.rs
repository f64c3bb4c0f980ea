// ./infrastructure/src/connection.rs
use crate::persistence::MongoDocumentStore;
use std::env;
use tracing::{info, warn};

/// Environment variable holding the MongoDB connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable holding the database name.
pub const DATABASE_NAME_VAR: &str = "DATABASE_NAME";

/// Builds the storage adapter from `DATABASE_URL` and `DATABASE_NAME`.
///
/// Returns `None` when either variable is unset or the connection string
/// does not parse; callers then run in the no-storage fallback mode. The
/// driver connects lazily, so reachability is not probed here.
pub async fn connect_from_env() -> Option<MongoDocumentStore> {
    let (Ok(url), Ok(name)) = (env::var(DATABASE_URL_VAR), env::var(DATABASE_NAME_VAR)) else {
        info!(
            "{} or {} not set; running without a datastore",
            DATABASE_URL_VAR, DATABASE_NAME_VAR
        );
        return None;
    };

    match MongoDocumentStore::connect(&url, &name).await {
        Ok(store) => {
            info!(database = %name, "Storage adapter initialized");
            Some(store)
        }
        Err(e) => {
            warn!("Failed to initialize storage adapter, continuing without one: {}", e);
            None
        }
    }
}
