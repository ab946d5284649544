//! Single-object and batch lineage analysis
//!
//! Every collaborator call is awaited in turn. Nothing is spawned and the
//! accumulators live on the running call.

use std::ops::ControlFlow;

use snowlineage_catalog::{CatalogLookup, CurrentDatabaseProvider, QueryExecutor};
use snowlineage_core::{
    sort_edges, BatchResult, Direction, LineageEdge, LineageError, LineageResult, ObjectFailure,
    ObjectReference, ObjectType, TaggedEdge,
};
use tracing::{debug, info, warn};

use crate::query_builder::{build_query, validate_distance};
use crate::resolver::{resolve, resolve_type};

/// Progress notification sent before each batch object is analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    /// Zero-based position in the input
    pub index: usize,

    /// Number of objects in the batch
    pub total: usize,

    /// Raw identifier as given
    pub object: &'a str,
}

/// Analyze upstream and downstream lineage of one object
///
/// Both directions are always queried once the object resolves. If either
/// query fails the first failure is returned and no partial result is built.
pub async fn analyze_single(
    raw: &str,
    max_distance: u32,
    provider: &dyn CurrentDatabaseProvider,
    catalog: &dyn CatalogLookup,
    executor: &dyn QueryExecutor,
) -> Result<LineageResult, LineageError> {
    validate_distance(max_distance)?;

    let object = resolve(raw, provider).await?;
    let object_type = resolve_type(&object, catalog).await?;
    info!(object = %object, object_type = object_type.as_str(), "Analyzing lineage");

    let upstream = fetch_direction(&object, object_type, Direction::Upstream, max_distance, executor).await;
    let downstream =
        fetch_direction(&object, object_type, Direction::Downstream, max_distance, executor).await;

    match (upstream, downstream) {
        (Ok(upstream), Ok(downstream)) => {
            info!(
                object = %object,
                upstream = upstream.len(),
                downstream = downstream.len(),
                "Lineage analysis complete"
            );
            Ok(LineageResult {
                object,
                object_type,
                upstream,
                downstream,
            })
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

/// Analyze a list of objects, collecting failures instead of stopping
pub async fn analyze_multiple<S: AsRef<str>>(
    raws: &[S],
    max_distance: u32,
    provider: &dyn CurrentDatabaseProvider,
    catalog: &dyn CatalogLookup,
    executor: &dyn QueryExecutor,
) -> Result<BatchResult, LineageError> {
    analyze_multiple_with(raws, max_distance, provider, catalog, executor, |_| {
        ControlFlow::Continue(())
    })
    .await
}

/// Like [`analyze_multiple`], reporting progress before each object
///
/// Returning [`ControlFlow::Break`] from `on_progress` stops the batch. The
/// records and failures gathered so far are returned with `cancelled` set.
pub async fn analyze_multiple_with<S, F>(
    raws: &[S],
    max_distance: u32,
    provider: &dyn CurrentDatabaseProvider,
    catalog: &dyn CatalogLookup,
    executor: &dyn QueryExecutor,
    mut on_progress: F,
) -> Result<BatchResult, LineageError>
where
    S: AsRef<str>,
    F: FnMut(BatchProgress<'_>) -> ControlFlow<()>,
{
    if raws.is_empty() {
        return Err(LineageError::EmptyBatch);
    }
    validate_distance(max_distance)?;

    let total = raws.len();
    let mut batch = BatchResult::default();

    for (index, raw) in raws.iter().enumerate() {
        let raw = raw.as_ref();

        if on_progress(BatchProgress { index, total, object: raw }).is_break() {
            info!(processed = batch.processed, total, "Batch cancelled");
            batch.cancelled = true;
            break;
        }

        match analyze_object(raw, max_distance, provider, catalog, executor).await {
            Ok(records) => batch.records.extend(records),
            Err(error) => {
                warn!(object = raw, code = error.code(), error = %error, "Skipping object");
                batch.failed.push(ObjectFailure {
                    object: raw.to_string(),
                    error,
                });
            }
        }
        batch.processed += 1;
    }

    info!(
        processed = batch.processed,
        failed = batch.failed.len(),
        records = batch.records.len(),
        "Batch analysis complete"
    );
    Ok(batch)
}

/// Records for one batch object, upstream first
async fn analyze_object(
    raw: &str,
    max_distance: u32,
    provider: &dyn CurrentDatabaseProvider,
    catalog: &dyn CatalogLookup,
    executor: &dyn QueryExecutor,
) -> Result<Vec<TaggedEdge>, LineageError> {
    let object = resolve(raw, provider).await?;
    let object_type = resolve_type(&object, catalog).await?;
    info!(object = %object, object_type = object_type.as_str(), "Analyzing lineage");

    let queried_object = raw.trim().to_uppercase();
    let mut records = Vec::new();

    for direction in Direction::ALL {
        let edges = fetch_direction(&object, object_type, direction, max_distance, executor).await?;
        records.extend(edges.into_iter().map(|edge| TaggedEdge {
            queried_object: queried_object.clone(),
            direction,
            edge,
        }));
    }

    Ok(records)
}

/// Run one traversal and put its rows in lineage order
async fn fetch_direction(
    object: &ObjectReference,
    object_type: ObjectType,
    direction: Direction,
    max_distance: u32,
    executor: &dyn QueryExecutor,
) -> Result<Vec<LineageEdge>, LineageError> {
    let query = build_query(object, object_type, direction, max_distance)?;
    debug!(object = %object, direction = direction.as_str(), max_distance, "Executing lineage query");

    let mut edges = executor
        .execute(&query)
        .await
        .map_err(|e| LineageError::ExecutionError {
            object: object.fqn(),
            direction,
            message: e.to_string(),
        })?;

    sort_edges(direction, &mut edges);
    debug!(object = %object, direction = direction.as_str(), rows = edges.len(), "Lineage query returned");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snowlineage_catalog::{FetchError, MockWarehouseBuilder};

    #[tokio::test]
    async fn invalid_distance_skips_collaborators() {
        let warehouse = MockWarehouseBuilder::new().with_table("A", "B", "C").build();

        let result = analyze_single("A.B.C", 0, &warehouse, &warehouse, &warehouse).await;
        assert!(matches!(result, Err(LineageError::InvalidDistance { .. })));
        assert!(warehouse.catalog_lookups().await.is_empty());
        assert!(warehouse.executed_queries().await.is_empty());
    }

    #[tokio::test]
    async fn single_attempts_both_directions_on_failure() {
        let warehouse = MockWarehouseBuilder::new()
            .with_table("A", "B", "C")
            .with_execution_error("A.B.C", Direction::Upstream, FetchError::QueryError("boom".into()))
            .build();

        let result = analyze_single("A.B.C", 1, &warehouse, &warehouse, &warehouse).await;
        assert_eq!(
            result,
            Err(LineageError::ExecutionError {
                object: "A.B.C".into(),
                direction: Direction::Upstream,
                message: "Query failed: boom".into(),
            })
        );

        let directions: Vec<Direction> = warehouse
            .executed_queries()
            .await
            .into_iter()
            .map(|q| q.direction)
            .collect();
        assert_eq!(directions, vec![Direction::Upstream, Direction::Downstream]);
    }

    #[tokio::test]
    async fn single_reorders_executor_rows() {
        let warehouse = MockWarehouseBuilder::new()
            .with_view("A", "B", "C")
            .with_edges(
                "A.B.C",
                Direction::Downstream,
                vec![
                    LineageEdge::between(2, "TABLE", "A.B.C", "TABLE", "A.B.AAA"),
                    LineageEdge::between(1, "VIEW", "A.B.C", "TABLE", "A.B.ZZZ"),
                    LineageEdge::between(1, "VIEW", "A.B.C", "TABLE", "A.B.MMM"),
                ],
            )
            .build();

        let result = analyze_single("a.b.c", 3, &warehouse, &warehouse, &warehouse)
            .await
            .unwrap();

        let names: Vec<&str> = result
            .downstream
            .iter()
            .map(|e| e.related_name(Direction::Downstream))
            .collect();
        assert_eq!(names, vec!["MMM", "ZZZ", "AAA"]);
        assert_eq!(result.object_type, ObjectType::View);
        assert!(result.upstream.is_empty());
    }

    #[tokio::test]
    async fn empty_batch_rejected() {
        let warehouse = MockWarehouseBuilder::new().build();
        let raws: [&str; 0] = [];

        let result = analyze_multiple(&raws, 1, &warehouse, &warehouse, &warehouse).await;
        assert_eq!(result, Err(LineageError::EmptyBatch));
    }

    #[tokio::test]
    async fn downstream_failure_drops_object_records() {
        let warehouse = MockWarehouseBuilder::new()
            .with_table("A", "B", "C")
            .with_edges(
                "A.B.C",
                Direction::Upstream,
                vec![LineageEdge::between(1, "TABLE", "A.B.SRC", "TABLE", "A.B.C")],
            )
            .with_execution_error(
                "A.B.C",
                Direction::Downstream,
                FetchError::PermissionDenied("nope".into()),
            )
            .build();

        let batch = analyze_multiple(&["A.B.C"], 1, &warehouse, &warehouse, &warehouse)
            .await
            .unwrap();

        assert!(batch.records.is_empty());
        assert_eq!(batch.failed_objects(), vec!["A.B.C"]);
        assert_eq!(batch.failed[0].error.code(), "EXECUTION_ERROR");
        assert_eq!(batch.processed, 1);
    }

    #[tokio::test]
    async fn progress_can_cancel() {
        let warehouse = MockWarehouseBuilder::new()
            .with_table("A", "B", "ONE")
            .with_table("A", "B", "TWO")
            .build();

        let mut seen = Vec::new();
        let batch = analyze_multiple_with(
            &["A.B.ONE", "A.B.TWO"],
            1,
            &warehouse,
            &warehouse,
            &warehouse,
            |progress| {
                seen.push((progress.index, progress.total, progress.object.to_string()));
                if progress.index == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        )
        .await
        .unwrap();

        assert!(batch.cancelled);
        assert_eq!(batch.processed, 1);
        assert_eq!(
            seen,
            vec![(0, 2, "A.B.ONE".to_string()), (1, 2, "A.B.TWO".to_string())]
        );
        assert_eq!(warehouse.catalog_lookups().await, vec!["A.B.ONE".to_string()]);
    }
}
