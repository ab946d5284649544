//! Warehouse collaborators for lineage analysis
//!
//! The lineage engine talks to a warehouse through three narrow traits:
//! [`CurrentDatabaseProvider`], [`CatalogLookup`] and [`QueryExecutor`].
//! [`CatalogBrowser`] lists databases, schemas and objects for pickers.
//! This crate defines them and ships two implementations.
//!
//! ## Features
//!
//! Enable warehouse support via Cargo features:
//! - `snowflake` - Snowflake support (`SNOWFLAKE.CORE.GET_LINEAGE`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use snowlineage_catalog::{SnowflakeWarehouse, CatalogLookup};
//!
//! let warehouse = SnowflakeWarehouse::with_password("xy12345", "user", "pass")
//!     .with_role("ANALYST")
//!     .build()?;
//! let kind = warehouse.table_type("PROD", "SALES", "ORDERS").await?;
//! ```

pub mod adapter;
pub mod mock;
pub mod snowflake;

pub use adapter::{CatalogBrowser, CatalogLookup, CatalogObject, CurrentDatabaseProvider, FetchError, QueryExecutor, classify_error};
pub use mock::{MockWarehouse, MockWarehouseBuilder};
pub use snowflake::{SnowflakeWarehouse, SnowflakeWarehouseBuilder, SnowflakeCredentials};
