//! Snowflake warehouse using INFORMATION_SCHEMA and SNOWFLAKE.CORE.GET_LINEAGE
//!
//! This warehouse answers all three collaborator traits against a live
//! Snowflake account. It requires appropriate privileges:
//! - USAGE on the databases and schemas being analyzed
//! - SELECT on INFORMATION_SCHEMA views
//! - access to SNOWFLAKE.CORE lineage functions (typically ACCOUNTADMIN or a
//!   role granted the SNOWFLAKE.GOVERNANCE_VIEWER database role)
//!
//! ## Authentication Methods
//!
//! 1. Password authentication (username/password)
//! 2. Key-pair authentication (private key PEM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let warehouse = SnowflakeWarehouse::with_password(
//!     "xy12345.us-east-1",
//!     "username",
//!     "password"
//! )
//! .with_warehouse("COMPUTE_WH")
//! .with_role("ANALYST")
//! .build()?;
//! ```
//!
//! Reference: https://docs.snowflake.com/en/sql-reference/functions/get_lineage-snowflake-core

use crate::adapter::{
    CatalogBrowser, CatalogLookup, CatalogObject, CurrentDatabaseProvider, FetchError, QueryExecutor,
};
use snowlineage_core::query::{quote_identifier, quote_literal};
use snowlineage_core::{LineageEdge, ObjectType, QuerySpec};

#[cfg(feature = "snowflake")]
use crate::adapter::classify_error;

#[cfg(feature = "snowflake")]
use snowflake_api::{QueryResult, SnowflakeApi};

#[cfg(feature = "snowflake")]
use arrow_array::cast::AsArray;

#[cfg(feature = "snowflake")]
use arrow_array::types::{Decimal128Type, Int16Type, Int32Type, Int64Type, Int8Type};

#[cfg(feature = "snowflake")]
use arrow_array::{Array, RecordBatch};

/// Snowflake authentication credentials
#[derive(Clone)]
pub enum SnowflakeCredentials {
    /// Password-based authentication
    Password(String),
    /// Key-pair authentication (PEM format private key)
    PrivateKey(String),
}

/// Builder for SnowflakeWarehouse
#[cfg_attr(not(feature = "snowflake"), allow(dead_code))]
pub struct SnowflakeWarehouseBuilder {
    account: String,
    username: String,
    credentials: SnowflakeCredentials,
    warehouse: Option<String>,
    role: Option<String>,
    database: Option<String>,
}

impl SnowflakeWarehouseBuilder {
    /// Create new builder with password authentication
    pub fn with_password(
        account: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            username: username.into(),
            credentials: SnowflakeCredentials::Password(password.into()),
            warehouse: None,
            role: None,
            database: None,
        }
    }

    /// Create new builder with key-pair authentication
    pub fn with_key_pair(
        account: impl Into<String>,
        username: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            username: username.into(),
            credentials: SnowflakeCredentials::PrivateKey(private_key_pem.into()),
            warehouse: None,
            role: None,
            database: None,
        }
    }

    /// Set the warehouse to use
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Set the role to use
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the session's default database
    ///
    /// This is what two-part identifiers resolve against.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Account identifier this builder connects to
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Build the warehouse client
    #[cfg(feature = "snowflake")]
    pub fn build(self) -> Result<SnowflakeWarehouse, FetchError> {
        let api = match &self.credentials {
            SnowflakeCredentials::Password(password) => {
                SnowflakeApi::with_password_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    self.database.as_deref(),
                    None, // schema
                    &self.username,
                    self.role.as_deref(),
                    password,
                )
                .map_err(|e| FetchError::AuthenticationError(format!(
                    "Failed to authenticate with Snowflake: {}",
                    e
                )))?
            }
            SnowflakeCredentials::PrivateKey(private_key_pem) => {
                SnowflakeApi::with_certificate_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    self.database.as_deref(),
                    None, // schema
                    &self.username,
                    self.role.as_deref(),
                    private_key_pem,
                )
                .map_err(|e| FetchError::AuthenticationError(format!(
                    "Failed to authenticate with key-pair: {}",
                    e
                )))?
            }
        };

        Ok(SnowflakeWarehouse {
            api,
            account: self.account,
        })
    }

    /// Build without snowflake feature
    #[cfg(not(feature = "snowflake"))]
    pub fn build(self) -> Result<SnowflakeWarehouse, FetchError> {
        Err(FetchError::ConfigError(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string()
        ))
    }
}

/// Snowflake-backed current database, catalog and lineage executor
pub struct SnowflakeWarehouse {
    #[cfg(feature = "snowflake")]
    api: SnowflakeApi,

    account: String,
}

impl SnowflakeWarehouse {
    /// Create a new Snowflake warehouse with password authentication (returns builder)
    pub fn with_password(
        account: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SnowflakeWarehouseBuilder {
        SnowflakeWarehouseBuilder::with_password(account, username, password)
    }

    /// Create a new Snowflake warehouse with key-pair authentication (returns builder)
    pub fn with_key_pair(
        account: impl Into<String>,
        username: impl Into<String>,
        private_key_pem: impl Into<String>,
    ) -> SnowflakeWarehouseBuilder {
        SnowflakeWarehouseBuilder::with_key_pair(account, username, private_key_pem)
    }

    /// Account identifier
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Query returning the session's current database
    pub fn current_database_sql() -> &'static str {
        "SELECT CURRENT_DATABASE() AS CURRENT_DATABASE"
    }

    /// Query returning an object's TABLE_TYPE
    pub fn table_type_sql(database: &str, schema: &str, name: &str) -> String {
        format!(
            r#"SELECT TABLE_TYPE
FROM {}.INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = {}
  AND TABLE_NAME = {}"#,
            quote_identifier(database),
            quote_literal(schema),
            quote_literal(name),
        )
    }

    /// `SHOW` command listing databases
    pub fn show_databases_sql() -> &'static str {
        "SHOW DATABASES"
    }

    /// `SHOW` command listing the schemas of a database
    pub fn show_schemas_sql(database: &str) -> String {
        format!("SHOW SCHEMAS IN DATABASE {}", quote_identifier(database))
    }

    /// Reads the `name` column of the previous `SHOW` command
    ///
    /// `SHOW` output is not guaranteed to arrive as Arrow, a `SELECT` over
    /// `RESULT_SCAN` is.
    pub fn scan_names_sql() -> &'static str {
        r#"SELECT "name" AS NAME FROM TABLE(RESULT_SCAN(LAST_QUERY_ID())) ORDER BY NAME"#
    }

    /// Query listing tables and views in a schema
    pub fn list_objects_sql(database: &str, schema: &str, kind: Option<ObjectType>) -> String {
        let type_filter = match kind {
            Some(ObjectType::Table) => "TABLE_TYPE = 'BASE TABLE'",
            Some(ObjectType::View) => "TABLE_TYPE = 'VIEW'",
            None => "TABLE_TYPE IN ('BASE TABLE', 'VIEW')",
        };

        format!(
            r#"SELECT TABLE_NAME, TABLE_TYPE
FROM {}.INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = {}
  AND {}
ORDER BY TABLE_NAME"#,
            quote_identifier(database),
            quote_literal(schema),
            type_filter,
        )
    }

    /// Run a `SHOW` command and read back its `name` column
    #[cfg(feature = "snowflake")]
    async fn show_names(&self, context: &str, show_sql: &str) -> Result<Vec<String>, FetchError> {
        self.api.exec(show_sql)
            .await
            .map_err(|e| classify_error(context, e.to_string()))?;

        let batches = self.query_batches(context, Self::scan_names_sql()).await?;
        string_column(&batches, "NAME")
    }

    /// Test the connection to the warehouse
    #[cfg(feature = "snowflake")]
    pub async fn test_connection(&self) -> Result<(), FetchError> {
        self.api.exec("SELECT 1")
            .await
            .map_err(|e| FetchError::QueryError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "snowflake"))]
    pub async fn test_connection(&self) -> Result<(), FetchError> {
        Err(not_compiled())
    }

    /// Run a query and return its Arrow batches (empty for no rows)
    #[cfg(feature = "snowflake")]
    async fn query_batches(&self, context: &str, sql: &str) -> Result<Vec<RecordBatch>, FetchError> {
        let result = self.api.exec(sql)
            .await
            .map_err(|e| classify_error(context, e.to_string()))?;

        match result {
            QueryResult::Arrow(batches) => Ok(batches),
            QueryResult::Empty => Ok(Vec::new()),
            QueryResult::Json(_) => Err(FetchError::InvalidResponse(
                "Unexpected JSON result format".to_string()
            )),
        }
    }
}

#[cfg(not(feature = "snowflake"))]
fn not_compiled() -> FetchError {
    FetchError::ConfigError(
        "Snowflake support not compiled. Rebuild with: cargo build --features snowflake".to_string()
    )
}

/// Read a string cell, treating SQL NULL as empty
#[cfg(feature = "snowflake")]
fn string_cell(batch: &RecordBatch, column: &str, row: usize) -> Result<Option<String>, FetchError> {
    let index = batch.schema().index_of(column)
        .map_err(|_| FetchError::InvalidResponse(format!("Missing {} column", column)))?;
    let array = batch.column(index).as_string_opt::<i32>()
        .ok_or_else(|| FetchError::InvalidResponse(format!("{} is not a string column", column)))?;

    if array.is_null(row) {
        Ok(None)
    } else {
        Ok(Some(array.value(row).to_string()))
    }
}

/// Read an integer cell of any width Snowflake chooses for NUMBER(38,0)
#[cfg(feature = "snowflake")]
fn integer_cell(batch: &RecordBatch, column: &str, row: usize) -> Result<i64, FetchError> {
    let index = batch.schema().index_of(column)
        .map_err(|_| FetchError::InvalidResponse(format!("Missing {} column", column)))?;
    let array = batch.column(index);

    if array.is_null(row) {
        return Err(FetchError::InvalidResponse(format!("NULL {} at row {}", column, row)));
    }

    let value = if let Some(a) = array.as_primitive_opt::<Int64Type>() {
        a.value(row)
    } else if let Some(a) = array.as_primitive_opt::<Int32Type>() {
        i64::from(a.value(row))
    } else if let Some(a) = array.as_primitive_opt::<Int16Type>() {
        i64::from(a.value(row))
    } else if let Some(a) = array.as_primitive_opt::<Int8Type>() {
        i64::from(a.value(row))
    } else if let Some(a) = array.as_primitive_opt::<Decimal128Type>() {
        i64::try_from(a.value(row))
            .map_err(|_| FetchError::InvalidResponse(format!("{} out of range", column)))?
    } else {
        return Err(FetchError::InvalidResponse(format!(
            "{} has unsupported type {}",
            column,
            array.data_type()
        )));
    };

    Ok(value)
}

/// Decode `GET_LINEAGE` rows in result order
#[cfg(feature = "snowflake")]
fn decode_edges(batches: &[RecordBatch]) -> Result<Vec<LineageEdge>, FetchError> {
    let mut edges = Vec::new();

    for batch in batches {
        for row in 0..batch.num_rows() {
            let text = |column: &str| -> Result<String, FetchError> {
                Ok(string_cell(batch, column, row)?.unwrap_or_default())
            };

            let distance = integer_cell(batch, "DISTANCE", row)?;
            let distance = u32::try_from(distance)
                .map_err(|_| FetchError::InvalidResponse(format!("Invalid DISTANCE {}", distance)))?;

            edges.push(LineageEdge {
                distance,
                source_domain: text("SOURCE_OBJECT_DOMAIN")?,
                source_database: text("SOURCE_OBJECT_DATABASE")?,
                source_schema: text("SOURCE_OBJECT_SCHEMA")?,
                source_name: text("SOURCE_OBJECT_NAME")?,
                target_domain: text("TARGET_OBJECT_DOMAIN")?,
                target_database: text("TARGET_OBJECT_DATABASE")?,
                target_schema: text("TARGET_OBJECT_SCHEMA")?,
                target_name: text("TARGET_OBJECT_NAME")?,
            });
        }
    }

    Ok(edges)
}

/// Every non-null value of a string column, in row order
#[cfg(feature = "snowflake")]
fn string_column(batches: &[RecordBatch], column: &str) -> Result<Vec<String>, FetchError> {
    let mut values = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            if let Some(value) = string_cell(batch, column, row)? {
                values.push(value);
            }
        }
    }
    Ok(values)
}

/// Decode `TABLE_NAME`/`TABLE_TYPE` rows, skipping kinds lineage can't take
#[cfg(feature = "snowflake")]
fn decode_objects(batches: &[RecordBatch]) -> Result<Vec<CatalogObject>, FetchError> {
    let mut objects = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            let name = string_cell(batch, "TABLE_NAME", row)?;
            let table_type = string_cell(batch, "TABLE_TYPE", row)?;

            if let (Some(name), Some(object_type)) =
                (name, table_type.as_deref().and_then(ObjectType::from_catalog))
            {
                objects.push(CatalogObject { name, object_type });
            }
        }
    }
    Ok(objects)
}

/// First non-null value of a string column, if any
#[cfg(feature = "snowflake")]
fn first_string(batches: &[RecordBatch], column: &str) -> Result<Option<String>, FetchError> {
    for batch in batches {
        if batch.num_rows() > 0 {
            return string_cell(batch, column, 0);
        }
    }
    Ok(None)
}

#[async_trait::async_trait]
impl CurrentDatabaseProvider for SnowflakeWarehouse {
    #[cfg(feature = "snowflake")]
    async fn current_database(&self) -> Result<Option<String>, FetchError> {
        let batches = self
            .query_batches("CURRENT_DATABASE()", Self::current_database_sql())
            .await?;
        Ok(first_string(&batches, "CURRENT_DATABASE")?.filter(|db| !db.trim().is_empty()))
    }

    #[cfg(not(feature = "snowflake"))]
    async fn current_database(&self) -> Result<Option<String>, FetchError> {
        Err(not_compiled())
    }
}

#[async_trait::async_trait]
impl CatalogLookup for SnowflakeWarehouse {
    #[cfg(feature = "snowflake")]
    async fn table_type(
        &self,
        database: &str,
        schema: &str,
        name: &str,
    ) -> Result<Option<String>, FetchError> {
        let context = format!("{}.{}.{}", database, schema, name);
        let sql = Self::table_type_sql(database, schema, name);
        let batches = self.query_batches(&context, &sql).await?;
        first_string(&batches, "TABLE_TYPE")
    }

    #[cfg(not(feature = "snowflake"))]
    async fn table_type(
        &self,
        _database: &str,
        _schema: &str,
        _name: &str,
    ) -> Result<Option<String>, FetchError> {
        Err(not_compiled())
    }
}

#[async_trait::async_trait]
impl CatalogBrowser for SnowflakeWarehouse {
    #[cfg(feature = "snowflake")]
    async fn list_databases(&self) -> Result<Vec<String>, FetchError> {
        self.show_names("SHOW DATABASES", Self::show_databases_sql()).await
    }

    #[cfg(feature = "snowflake")]
    async fn list_schemas(&self, database: &str) -> Result<Vec<String>, FetchError> {
        self.show_names(database, &Self::show_schemas_sql(database)).await
    }

    #[cfg(feature = "snowflake")]
    async fn list_objects(
        &self,
        database: &str,
        schema: &str,
        kind: Option<ObjectType>,
    ) -> Result<Vec<CatalogObject>, FetchError> {
        let context = format!("{}.{}", database, schema);
        let sql = Self::list_objects_sql(database, schema, kind);
        let batches = self.query_batches(&context, &sql).await?;
        decode_objects(&batches)
    }

    #[cfg(not(feature = "snowflake"))]
    async fn list_databases(&self) -> Result<Vec<String>, FetchError> {
        Err(not_compiled())
    }

    #[cfg(not(feature = "snowflake"))]
    async fn list_schemas(&self, _database: &str) -> Result<Vec<String>, FetchError> {
        Err(not_compiled())
    }

    #[cfg(not(feature = "snowflake"))]
    async fn list_objects(
        &self,
        _database: &str,
        _schema: &str,
        _kind: Option<ObjectType>,
    ) -> Result<Vec<CatalogObject>, FetchError> {
        Err(not_compiled())
    }
}

#[async_trait::async_trait]
impl QueryExecutor for SnowflakeWarehouse {
    #[cfg(feature = "snowflake")]
    async fn execute(&self, query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError> {
        let batches = self.query_batches(&query.fqn(), &query.to_sql()).await?;
        decode_edges(&batches)
    }

    #[cfg(not(feature = "snowflake"))]
    async fn execute(&self, _query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError> {
        Err(not_compiled())
    }
}
