use csv::WriterBuilder;
use snowlineage_core::{BatchResult, Direction, LineageEdge, ObjectReference};

use crate::ExportError;

/// Header of the consolidated multi-object table
pub const BATCH_COLUMNS: [&str; 11] = [
    "QUERIED_OBJECT",
    "LINEAGE_DIRECTION",
    "DISTANCE",
    "SOURCE_OBJECT_DOMAIN",
    "SOURCE_OBJECT_DATABASE",
    "SOURCE_OBJECT_SCHEMA",
    "SOURCE_OBJECT_NAME",
    "TARGET_OBJECT_DOMAIN",
    "TARGET_OBJECT_DATABASE",
    "TARGET_OBJECT_SCHEMA",
    "TARGET_OBJECT_NAME",
];

/// Rows of a single lineage direction as CSV
pub fn edges_csv(edges: &[LineageEdge]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    writer.write_record(LineageEdge::COLUMNS)?;
    for edge in edges {
        writer.write_record(edge.values())?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))
}

/// Consolidated multi-object records as CSV
pub fn batch_csv(batch: &BatchResult) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    writer.write_record(BATCH_COLUMNS)?;
    for record in &batch.records {
        let mut row = vec![
            record.queried_object.clone(),
            record.direction.as_str().to_string(),
        ];
        row.extend(record.edge.values());
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))
}

/// Download name for one direction of an object's lineage,
/// e.g. `upstream_lineage_PROD_SALES_ORDERS.csv`
pub fn lineage_file_name(direction: Direction, object: &ObjectReference) -> String {
    format!(
        "{}_lineage_{}.csv",
        direction.as_str().to_lowercase(),
        object.fqn().replace('.', "_")
    )
}
