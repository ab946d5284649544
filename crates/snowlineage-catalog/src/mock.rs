//! Mock warehouse for testing
//!
//! This warehouse answers current-database, catalog and lineage requests from
//! in-memory tables without connecting anywhere. It's useful for:
//! - Unit testing the resolver and aggregator
//! - Demos without real credentials
//! - Simulating permission errors and missing objects
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snowlineage_catalog::MockWarehouseBuilder;
//! use snowlineage_core::{Direction, LineageEdge};
//!
//! let warehouse = MockWarehouseBuilder::new()
//!     .with_current_database("PROD")
//!     .with_table("PROD", "SALES", "ORDERS")
//!     .with_edges("PROD.SALES.ORDERS", Direction::Upstream, vec![
//!         LineageEdge::between(1, "TABLE", "RAW.PUBLIC.ORDERS", "TABLE", "PROD.SALES.ORDERS"),
//!     ])
//!     .build();
//! ```

use crate::adapter::{
    CatalogBrowser, CatalogLookup, CatalogObject, CurrentDatabaseProvider, FetchError, QueryExecutor,
};
use snowlineage_core::{Direction, LineageEdge, ObjectType, QuerySpec};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type CatalogKey = (String, String, String);

#[derive(Default)]
struct MockState {
    /// Current database, if any
    current_database: Option<String>,

    /// Error returned by `current_database`
    current_database_error: Option<FetchError>,

    /// Raw TABLE_TYPE values by (database, schema, name)
    catalog: BTreeMap<CatalogKey, String>,

    /// Catalog errors by FQN
    catalog_errors: HashMap<String, FetchError>,

    /// Lineage rows by FQN and direction
    edges: HashMap<(String, Direction), Vec<LineageEdge>>,

    /// Execution errors by FQN and direction
    execution_errors: HashMap<(String, Direction), FetchError>,

    /// Every query executed, in order
    executed: Vec<QuerySpec>,

    /// Every catalog lookup, as FQN, in order
    lookups: Vec<String>,
}

/// In-memory warehouse implementing all three collaborator traits
///
/// Clones share state, so a test can keep a handle for assertions after
/// passing the warehouse to the engine.
#[derive(Clone, Default)]
pub struct MockWarehouse {
    state: Arc<RwLock<MockState>>,
    latency_ms: u64,
}

impl MockWarehouse {
    /// Create an empty mock warehouse with no current database
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session's current database
    pub async fn set_current_database(&self, database: Option<&str>) {
        self.state.write().await.current_database = database.map(str::to_string);
    }

    /// Register an object with a raw catalog type (`BASE TABLE`, `VIEW`, ...)
    pub async fn add_object(&self, database: &str, schema: &str, name: &str, table_type: &str) {
        self.state
            .write()
            .await
            .catalog
            .insert(catalog_key(database, schema, name), table_type.to_string());
    }

    /// Set the rows returned for a lineage query
    pub async fn add_edges(&self, object_fqn: &str, direction: Direction, edges: Vec<LineageEdge>) {
        self.state
            .write()
            .await
            .edges
            .insert((object_fqn.to_string(), direction), edges);
    }

    /// Make lineage queries for an object fail
    pub async fn add_execution_error(&self, object_fqn: &str, direction: Direction, error: FetchError) {
        self.state
            .write()
            .await
            .execution_errors
            .insert((object_fqn.to_string(), direction), error);
    }

    /// Make the catalog lookup for an object fail
    pub async fn add_catalog_error(&self, object_fqn: &str, error: FetchError) {
        self.state
            .write()
            .await
            .catalog_errors
            .insert(object_fqn.to_string(), error);
    }

    /// Queries executed so far
    pub async fn executed_queries(&self) -> Vec<QuerySpec> {
        self.state.read().await.executed.clone()
    }

    /// Catalog lookups performed so far (as FQNs)
    pub async fn catalog_lookups(&self) -> Vec<String> {
        self.state.read().await.lookups.clone()
    }

    /// Forget the execution and lookup logs
    pub async fn clear_logs(&self) {
        let mut state = self.state.write().await;
        state.executed.clear();
        state.lookups.clear();
    }

    /// Simulate latency if configured
    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

fn fqn(database: &str, schema: &str, name: &str) -> String {
    format!("{}.{}.{}", database, schema, name)
}

fn catalog_key(database: &str, schema: &str, name: &str) -> CatalogKey {
    (database.to_string(), schema.to_string(), name.to_string())
}

#[async_trait::async_trait]
impl CurrentDatabaseProvider for MockWarehouse {
    async fn current_database(&self) -> Result<Option<String>, FetchError> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        if let Some(error) = &state.current_database_error {
            return Err(error.clone());
        }
        Ok(state.current_database.clone())
    }
}

#[async_trait::async_trait]
impl CatalogLookup for MockWarehouse {
    async fn table_type(
        &self,
        database: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<String>, FetchError> {
        self.simulate_latency().await;

        let key = fqn(database, schema, name);
        let mut state = self.state.write().await;
        state.lookups.push(key.clone());

        if let Some(error) = state.catalog_errors.get(&key) {
            return Err(error.clone());
        }
        Ok(state.catalog.get(&catalog_key(database, schema, name)).cloned())
    }
}

#[async_trait::async_trait]
impl CatalogBrowser for MockWarehouse {
    async fn list_databases(&self) -> Result<Vec<String>, FetchError> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        let databases: BTreeSet<&String> = state.catalog.keys().map(|(db, _, _)| db).collect();
        Ok(databases.into_iter().cloned().collect())
    }

    async fn list_schemas(&self, database: &str) -> Result<Vec<String>, FetchError> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        let schemas: BTreeSet<&String> = state
            .catalog
            .keys()
            .filter(|(db, _, _)| db == database)
            .map(|(_, schema, _)| schema)
            .collect();
        Ok(schemas.into_iter().cloned().collect())
    }

    async fn list_objects(
        &self,
        database: &str,
        schema: &str,
        kind: Option<ObjectType>,
    ) -> Result<Vec<CatalogObject>, FetchError> {
        self.simulate_latency().await;

        let state = self.state.read().await;
        let objects = state
            .catalog
            .iter()
            .filter(|((db, sc, _), _)| db == database && sc == schema)
            .filter_map(|((_, _, name), table_type)| {
                let object_type = ObjectType::from_catalog(table_type)?;
                Some(CatalogObject {
                    name: name.clone(),
                    object_type,
                })
            })
            .filter(|object| kind.map_or(true, |kind| object.object_type == kind))
            .collect();
        Ok(objects)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for MockWarehouse {
    async fn execute(&self, query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError> {
        self.simulate_latency().await;

        let key = (query.fqn(), query.direction);
        let mut state = self.state.write().await;
        state.executed.push(query.clone());

        if let Some(error) = state.execution_errors.get(&key) {
            return Err(error.clone());
        }
        Ok(state.edges.get(&key).cloned().unwrap_or_default())
    }
}

/// Builder for creating a MockWarehouse
///
/// # Example
///
/// ```rust,ignore
/// let warehouse = MockWarehouseBuilder::new()
///     .with_current_database("PROD")
///     .with_view("PROD", "SALES", "ORDERS_V")
///     .with_execution_error("PROD.SALES.ORDERS_V", Direction::Downstream,
///         FetchError::PermissionDenied("Insufficient privileges".into()))
///     .build();
/// ```
#[derive(Default)]
pub struct MockWarehouseBuilder {
    state: MockState,
    latency_ms: u64,
}

impl MockWarehouseBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session's current database
    pub fn with_current_database(mut self, database: &str) -> Self {
        self.state.current_database = Some(database.to_string());
        self
    }

    /// Make the current-database lookup fail
    pub fn with_current_database_error(mut self, error: FetchError) -> Self {
        self.state.current_database_error = Some(error);
        self
    }

    /// Register a base table
    pub fn with_table(self, database: &str, schema: &str, name: &str) -> Self {
        self.with_object(database, schema, name, "BASE TABLE")
    }

    /// Register a view
    pub fn with_view(self, database: &str, schema: &str, name: &str) -> Self {
        self.with_object(database, schema, name, "VIEW")
    }

    /// Register an object with an arbitrary raw catalog type
    pub fn with_object(mut self, database: &str, schema: &str, name: &str, table_type: &str) -> Self {
        self.state
            .catalog
            .insert(catalog_key(database, schema, name), table_type.to_string());
        self
    }

    /// Make the catalog lookup for an object fail
    pub fn with_catalog_error(mut self, object_fqn: &str, error: FetchError) -> Self {
        self.state.catalog_errors.insert(object_fqn.to_string(), error);
        self
    }

    /// Set the rows returned for a lineage query
    pub fn with_edges(mut self, object_fqn: &str, direction: Direction, edges: Vec<LineageEdge>) -> Self {
        self.state
            .edges
            .insert((object_fqn.to_string(), direction), edges);
        self
    }

    /// Make lineage queries for an object fail in one direction
    pub fn with_execution_error(mut self, object_fqn: &str, direction: Direction, error: FetchError) -> Self {
        self.state
            .execution_errors
            .insert((object_fqn.to_string(), direction), error);
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Build the MockWarehouse
    pub fn build(self) -> MockWarehouse {
        MockWarehouse {
            state: Arc::new(RwLock::new(self.state)),
            latency_ms: self.latency_ms,
        }
    }
}
