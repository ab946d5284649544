//! Warehouse collaborator traits used by the lineage engine
//!
//! Each trait is a single capability so that the engine can be driven by a
//! live warehouse, the in-memory [`MockWarehouse`](crate::MockWarehouse), or
//! a hand-written test double.

use snowlineage_core::{LineageEdge, ObjectType, QuerySpec};

/// Errors that can occur when talking to a warehouse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Supplies the session's current database
#[async_trait::async_trait]
pub trait CurrentDatabaseProvider: Send + Sync {
    /// The ambient default database, or `None` if the session has none
    async fn current_database(&self) -> Result<Option<String>, FetchError>;
}

/// Looks up an object's kind in the warehouse catalog
#[async_trait::async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Raw `TABLE_TYPE` for the object (e.g. `BASE TABLE`, `VIEW`)
    ///
    /// Returns `Ok(None)` when the catalog has no such object.
    async fn table_type(
        &self,
        database: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<String>, FetchError>;
}

/// A table or view found while browsing a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub name: String,
    pub object_type: ObjectType,
}

/// Lists what can be analyzed, for pickers and the `list` command
///
/// Every list comes back sorted by name.
#[async_trait::async_trait]
pub trait CatalogBrowser: Send + Sync {
    /// Databases visible to the session
    async fn list_databases(&self) -> Result<Vec<String>, FetchError>;

    /// Schemas in a database
    async fn list_schemas(&self, database: &str) -> Result<Vec<String>, FetchError>;

    /// Tables and views in a schema, optionally restricted to one kind
    async fn list_objects(
        &self,
        database: &str,
        schema: &str,
        kind: Option<ObjectType>,
    ) -> Result<Vec<CatalogObject>, FetchError>;
}

/// Runs a lineage traversal
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute the query and return its rows in result order
    async fn execute(&self, query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError>;
}

/// Closures returning an optional database act as providers
///
/// Handy when the current database is already known, e.g. from config.
#[async_trait::async_trait]
impl<F> CurrentDatabaseProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn current_database(&self) -> Result<Option<String>, FetchError> {
        Ok(self())
    }
}

/// Classify a driver error message into a [`FetchError`]
pub fn classify_error(context: &str, message: String) -> FetchError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient privileges") || lower.contains("permission") {
        FetchError::PermissionDenied(format!("{}: {}", context, message))
    } else if lower.contains("does not exist") || lower.contains("not found") {
        FetchError::ObjectNotFound(format!("{}: {}", context, message))
    } else if lower.contains("authentication") || lower.contains("incorrect username or password") {
        FetchError::AuthenticationError(message)
    } else {
        FetchError::QueryError(message)
    }
}
