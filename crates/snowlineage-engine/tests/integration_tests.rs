//! Integration tests for the lineage engine
//!
//! Everything runs against the in-memory warehouse or small hand-written
//! executors, so no credentials are needed:
//!
//! ```bash
//! cargo test -p snowlineage-engine --test integration_tests
//! ```

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use snowlineage_catalog::{FetchError, MockWarehouseBuilder};
use snowlineage_core::{BatchSummary, Direction, LineageEdge, LineageError, LineageSummary, ObjectType};
use snowlineage_engine::{analyze_multiple, analyze_single, resolve};

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_schema_qualified_uses_current_database() {
    let warehouse = sales_warehouse();

    let reference = resolve("SALES.ORDERS", &warehouse).await.unwrap();
    assert_eq!(reference.fqn(), "PROD.SALES.ORDERS");
}

#[tokio::test]
async fn test_fully_qualified_independent_of_provider() {
    let with_db = sales_warehouse();
    let without_db = sales_warehouse_without_database();

    let a = resolve("prod.sales.orders", &with_db).await.unwrap();
    let b = resolve("prod.sales.orders", &without_db).await.unwrap();
    assert_eq!(a, b);
}

// =============================================================================
// Single object
// =============================================================================

#[tokio::test]
async fn test_single_table_lineage() {
    let warehouse = sales_warehouse();

    let result = analyze_single("SALES.ORDERS", 2, &warehouse, &warehouse, &warehouse)
        .await
        .unwrap();

    assert_eq!(result.object.fqn(), "PROD.SALES.ORDERS");
    assert_eq!(result.object_type, ObjectType::Table);
    assert_eq!(result.upstream, orders_upstream());
    assert_eq!(result.downstream, orders_downstream());

    let summary = LineageSummary::from_result(&result);
    assert_eq!(summary.upstream_objects, 3);
    assert_eq!(summary.downstream_objects, 2);
    assert_eq!(summary.max_upstream_distance, 2);
    assert_eq!(summary.max_downstream_distance, 1);
}

#[tokio::test]
async fn test_single_passes_type_and_distance_to_queries() {
    let warehouse = sales_warehouse();

    analyze_single("PROD.SALES.ORDERS_V", 4, &warehouse, &warehouse, &warehouse)
        .await
        .unwrap();

    let queries = warehouse.executed_queries().await;
    assert_eq!(queries.len(), 2);
    for query in &queries {
        assert_eq!(query.fqn(), "PROD.SALES.ORDERS_V");
        assert_eq!(query.object_type, ObjectType::View);
        assert_eq!(query.max_distance, 4);
    }
    assert_eq!(queries[0].direction, Direction::Upstream);
    assert_eq!(queries[1].direction, Direction::Downstream);
}

#[tokio::test]
async fn test_single_resolution_failure_executes_nothing() {
    let warehouse = sales_warehouse();

    let result = analyze_single("PROD.SALES.MISSING", 1, &warehouse, &warehouse, &warehouse).await;
    assert!(matches!(result, Err(LineageError::NotFound { .. })));

    let result = analyze_single("A.B.C.D", 1, &warehouse, &warehouse, &warehouse).await;
    assert!(matches!(result, Err(LineageError::InvalidFormat { .. })));

    assert!(warehouse.executed_queries().await.is_empty());
}

#[tokio::test]
async fn test_single_execution_failure() {
    let warehouse = sales_warehouse();

    let result = analyze_single("SALES.ORDERS", 1, &warehouse, &warehouse, &FailingExecutor).await;
    match result {
        Err(LineageError::ExecutionError {
            object,
            direction,
            message,
        }) => {
            assert_eq!(object, "PROD.SALES.ORDERS");
            assert_eq!(direction, Direction::Upstream);
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected ExecutionError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_echo_executor_keeps_rows() {
    let warehouse = sales_warehouse();
    let echo = EchoExecutor {
        rows: orders_upstream(),
    };

    let result = analyze_single("PROD.SALES.ORDERS", 2, &warehouse, &warehouse, &echo)
        .await
        .unwrap();

    assert_eq!(result.upstream, orders_upstream());
    assert_eq!(result.upstream.len(), 3);

    // Every target is named ORDERS, so downstream ordering falls back to
    // distance and keeps the echoed order within a distance.
    assert_eq!(result.downstream, orders_upstream());
}

#[tokio::test]
async fn test_echo_executor_rows_sorted_per_direction() {
    let warehouse = sales_warehouse();
    let echo = EchoExecutor {
        rows: vec![
            LineageEdge::between(2, "TABLE", "RAW.SHOP.A", "TABLE", "PROD.SALES.B"),
            LineageEdge::between(1, "TABLE", "RAW.SHOP.Z", "VIEW", "PROD.SALES.A"),
            LineageEdge::between(1, "TABLE", "RAW.SHOP.M", "TABLE", "PROD.SALES.C"),
        ],
    };

    let result = analyze_single("PROD.SALES.ORDERS", 2, &warehouse, &warehouse, &echo)
        .await
        .unwrap();

    let sources: Vec<&str> = result.upstream.iter().map(|e| e.source_name.as_str()).collect();
    assert_eq!(sources, vec!["M", "Z", "A"]);

    let targets: Vec<&str> = result.downstream.iter().map(|e| e.target_name.as_str()).collect();
    assert_eq!(targets, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn test_distance_bounds() {
    let warehouse = sales_warehouse();

    for distance in [0, 6] {
        let result = analyze_single("SALES.ORDERS", distance, &warehouse, &warehouse, &warehouse).await;
        assert_eq!(
            result,
            Err(LineageError::InvalidDistance {
                distance,
                min: 1,
                max: 5,
            })
        );
    }

    for distance in 1..=5 {
        let result = analyze_single("SALES.ORDERS", distance, &warehouse, &warehouse, &warehouse).await;
        assert!(result.is_ok(), "distance {} rejected", distance);
    }
}

// =============================================================================
// Batches
// =============================================================================

#[tokio::test]
async fn test_batch_continues_past_failures() {
    let warehouse = sales_warehouse();
    let objects = ["PROD.SALES.ORDERS", "PROD.SALES.MISSING", "prod.sales.orders_v"];

    let batch = analyze_multiple(&objects, 1, &warehouse, &warehouse, &warehouse)
        .await
        .unwrap();

    assert_eq!(batch.failed_objects(), vec!["PROD.SALES.MISSING"]);
    assert_eq!(batch.processed, 3);
    assert!(!batch.cancelled);

    let queried: Vec<&str> = batch.records.iter().map(|r| r.queried_object.as_str()).collect();
    assert_eq!(
        queried,
        vec![
            "PROD.SALES.ORDERS",
            "PROD.SALES.ORDERS",
            "PROD.SALES.ORDERS",
            "PROD.SALES.ORDERS",
            "PROD.SALES.ORDERS",
            "PROD.SALES.ORDERS_V",
        ]
    );

    let orders: Vec<Direction> = batch
        .records_for("PROD.SALES.ORDERS")
        .map(|r| r.direction)
        .collect();
    assert_eq!(
        orders,
        vec![
            Direction::Upstream,
            Direction::Upstream,
            Direction::Upstream,
            Direction::Downstream,
            Direction::Downstream,
        ]
    );

    let summary = BatchSummary::from_batch(&batch, objects.len());
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total_records, 6);
    assert_eq!(summary.upstream_records, 3);
    assert_eq!(summary.downstream_records, 3);
}

#[tokio::test]
async fn test_batch_without_current_database() {
    let warehouse = MockWarehouseBuilder::new()
        .with_table("A", "B", "C")
        .with_table("PROD", "X", "Y")
        .with_edges(
            "A.B.C",
            Direction::Upstream,
            vec![snowlineage_core::LineageEdge::between(1, "TABLE", "A.B.SRC", "TABLE", "A.B.C")],
        )
        .build();

    let batch = analyze_multiple(&["A.B.C", "X.Y"], 1, &warehouse, &warehouse, &warehouse)
        .await
        .unwrap();

    assert_eq!(batch.failed_objects(), vec!["X.Y"]);
    assert_eq!(
        batch.failed[0].error,
        LineageError::AmbiguousDatabase {
            input: "X.Y".into()
        }
    );
    assert_eq!(batch.records.len(), 1);
    assert!(batch.records.iter().all(|r| r.queried_object == "A.B.C"));
}

#[tokio::test]
async fn test_batch_keeps_raw_failed_input() {
    let warehouse = sales_warehouse();

    let batch = analyze_multiple(&["  bad  ", "SALES.ORDERS"], 1, &warehouse, &warehouse, &warehouse)
        .await
        .unwrap();

    assert_eq!(batch.failed_objects(), vec!["  bad  "]);
    assert_eq!(batch.failed[0].error.code(), "INVALID_FORMAT");
    assert!(batch.records.iter().all(|r| r.queried_object == "SALES.ORDERS"));
}

#[tokio::test]
async fn test_batch_does_not_deduplicate() {
    let warehouse = sales_warehouse();

    let batch = analyze_multiple(
        &["PROD.SALES.ORDERS", "PROD.SALES.ORDERS"],
        1,
        &warehouse,
        &warehouse,
        &warehouse,
    )
    .await
    .unwrap();

    assert_eq!(batch.records.len(), 10);
    assert_eq!(warehouse.executed_queries().await.len(), 4);
}

#[tokio::test]
async fn test_batch_execution_failure_is_recorded() {
    let warehouse = MockWarehouseBuilder::new()
        .with_table("PROD", "SALES", "ORDERS")
        .with_view("PROD", "SALES", "ORDERS_V")
        .with_edges("PROD.SALES.ORDERS_V", Direction::Downstream, orders_view_downstream())
        .with_execution_error(
            "PROD.SALES.ORDERS",
            Direction::Upstream,
            FetchError::PermissionDenied("Insufficient privileges".into()),
        )
        .build();

    let batch = analyze_multiple(
        &["PROD.SALES.ORDERS", "PROD.SALES.ORDERS_V"],
        1,
        &warehouse,
        &warehouse,
        &warehouse,
    )
    .await
    .unwrap();

    assert_eq!(batch.failed_objects(), vec!["PROD.SALES.ORDERS"]);
    assert!(matches!(
        batch.failed[0].error,
        LineageError::ExecutionError {
            direction: Direction::Upstream,
            ..
        }
    ));
    assert_eq!(batch.records.len(), 1);
    assert_eq!(batch.records[0].queried_object, "PROD.SALES.ORDERS_V");
}

#[tokio::test]
async fn test_batch_level_errors() {
    let warehouse = sales_warehouse();

    let empty: Vec<String> = Vec::new();
    let result = analyze_multiple(&empty, 1, &warehouse, &warehouse, &warehouse).await;
    assert_eq!(result, Err(LineageError::EmptyBatch));

    let result = analyze_multiple(&["SALES.ORDERS"], 9, &warehouse, &warehouse, &warehouse).await;
    assert!(matches!(result, Err(LineageError::InvalidDistance { .. })));
    assert!(warehouse.catalog_lookups().await.is_empty());
}
