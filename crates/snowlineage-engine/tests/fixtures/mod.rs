//! Test fixtures for lineage engine integration tests
//!
//! A small sales warehouse: raw tables feed `PROD.SALES.ORDERS`, which feeds
//! a reporting view and a mart table.

#![allow(dead_code)]

use snowlineage_catalog::{FetchError, MockWarehouse, MockWarehouseBuilder, QueryExecutor};
use snowlineage_core::{Direction, LineageEdge, QuerySpec};

/// Rows feeding `PROD.SALES.ORDERS`, in lineage order
pub fn orders_upstream() -> Vec<LineageEdge> {
    vec![
        LineageEdge::between(1, "TABLE", "RAW.SHOP.CUSTOMERS", "TABLE", "PROD.SALES.ORDERS"),
        LineageEdge::between(1, "TABLE", "RAW.SHOP.ORDERS", "TABLE", "PROD.SALES.ORDERS"),
        LineageEdge::between(2, "STAGE", "RAW.SHOP.LANDING", "TABLE", "RAW.SHOP.ORDERS"),
    ]
}

/// Rows fed by `PROD.SALES.ORDERS`, in lineage order
pub fn orders_downstream() -> Vec<LineageEdge> {
    vec![
        LineageEdge::between(1, "TABLE", "PROD.SALES.ORDERS", "TABLE", "PROD.MART.DAILY_REVENUE"),
        LineageEdge::between(1, "TABLE", "PROD.SALES.ORDERS", "VIEW", "PROD.SALES.ORDERS_V"),
    ]
}

/// Rows fed by `PROD.SALES.ORDERS_V`
pub fn orders_view_downstream() -> Vec<LineageEdge> {
    vec![LineageEdge::between(
        1,
        "VIEW",
        "PROD.SALES.ORDERS_V",
        "VIEW",
        "PROD.REPORTING.ORDERS_DASHBOARD",
    )]
}

/// Sales warehouse with `PROD` as the session database
pub fn sales_warehouse() -> MockWarehouse {
    sales_builder().with_current_database("PROD").build()
}

/// Sales warehouse whose session has no current database
pub fn sales_warehouse_without_database() -> MockWarehouse {
    sales_builder().build()
}

fn sales_builder() -> MockWarehouseBuilder {
    MockWarehouseBuilder::new()
        .with_table("PROD", "SALES", "ORDERS")
        .with_view("PROD", "SALES", "ORDERS_V")
        .with_table("PROD", "MART", "DAILY_REVENUE")
        .with_edges("PROD.SALES.ORDERS", Direction::Upstream, orders_upstream())
        .with_edges("PROD.SALES.ORDERS", Direction::Downstream, orders_downstream())
        .with_edges("PROD.SALES.ORDERS_V", Direction::Downstream, orders_view_downstream())
}

/// Executor that answers every query with the same rows
pub struct EchoExecutor {
    pub rows: Vec<LineageEdge>,
}

#[async_trait::async_trait]
impl QueryExecutor for EchoExecutor {
    async fn execute(&self, _query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError> {
        Ok(self.rows.clone())
    }
}

/// Executor that fails every query
pub struct FailingExecutor;

#[async_trait::async_trait]
impl QueryExecutor for FailingExecutor {
    async fn execute(&self, query: &QuerySpec) -> Result<Vec<LineageEdge>, FetchError> {
        Err(FetchError::NetworkError(format!("connection reset while querying {}", query.fqn())))
    }
}
