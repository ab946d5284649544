//! Lineage edges and analysis results

use crate::error::LineageError;
use crate::object::{Direction, ObjectReference, ObjectType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One row returned by `GET_LINEAGE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LineageEdge {
    /// Hops from the queried object
    pub distance: u32,

    #[serde(rename = "SOURCE_OBJECT_DOMAIN")]
    pub source_domain: String,
    #[serde(rename = "SOURCE_OBJECT_DATABASE")]
    pub source_database: String,
    #[serde(rename = "SOURCE_OBJECT_SCHEMA")]
    pub source_schema: String,
    #[serde(rename = "SOURCE_OBJECT_NAME")]
    pub source_name: String,

    #[serde(rename = "TARGET_OBJECT_DOMAIN")]
    pub target_domain: String,
    #[serde(rename = "TARGET_OBJECT_DATABASE")]
    pub target_database: String,
    #[serde(rename = "TARGET_OBJECT_SCHEMA")]
    pub target_schema: String,
    #[serde(rename = "TARGET_OBJECT_NAME")]
    pub target_name: String,
}

impl LineageEdge {
    /// Column names in result order
    pub const COLUMNS: [&'static str; 9] = [
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

    /// Build an edge from fully-qualified source and target names
    ///
    /// Both names must be `DATABASE.SCHEMA.NAME`; missing leading parts are
    /// left empty. Mostly useful for fixtures.
    pub fn between(
        distance: u32,
        source_domain: &str,
        source: &str,
        target_domain: &str,
        target: &str,
    ) -> Self {
        let (source_database, source_schema, source_name) = split_fqn(source);
        let (target_database, target_schema, target_name) = split_fqn(target);

        Self {
            distance,
            source_domain: source_domain.to_string(),
            source_database,
            source_schema,
            source_name,
            target_domain: target_domain.to_string(),
            target_database,
            target_schema,
            target_name,
        }
    }

    /// Name of the object on the far side of the edge for a direction
    ///
    /// Upstream rows describe what feeds the queried object, so the related
    /// object is the source; downstream rows relate to the target.
    pub fn related_name(&self, direction: Direction) -> &str {
        match direction {
            Direction::Upstream => &self.source_name,
            Direction::Downstream => &self.target_name,
        }
    }

    /// Fully qualified source name
    pub fn source_fqn(&self) -> String {
        format!("{}.{}.{}", self.source_database, self.source_schema, self.source_name)
    }

    /// Fully qualified target name
    pub fn target_fqn(&self) -> String {
        format!("{}.{}.{}", self.target_database, self.target_schema, self.target_name)
    }

    /// Row values in [`LineageEdge::COLUMNS`] order
    pub fn values(&self) -> [String; 9] {
        [
            self.distance.to_string(),
            self.source_domain.clone(),
            self.source_database.clone(),
            self.source_schema.clone(),
            self.source_name.clone(),
            self.target_domain.clone(),
            self.target_database.clone(),
            self.target_schema.clone(),
            self.target_name.clone(),
        ]
    }
}

fn split_fqn(fqn: &str) -> (String, String, String) {
    let mut parts: Vec<&str> = fqn.rsplitn(3, '.').collect();
    parts.reverse();
    match parts.as_slice() {
        [database, schema, name] => (database.to_string(), schema.to_string(), name.to_string()),
        [schema, name] => (String::new(), schema.to_string(), name.to_string()),
        _ => (String::new(), String::new(), fqn.to_string()),
    }
}

/// Compare two edges by distance, then by the related object's name
pub fn lineage_order(direction: Direction, a: &LineageEdge, b: &LineageEdge) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| a.related_name(direction).cmp(b.related_name(direction)))
}

/// Stable-sort edges into the order `GET_LINEAGE` queries request
///
/// Rows already in order are left untouched, so ties keep the order in which
/// the executor returned them.
pub fn sort_edges(direction: Direction, edges: &mut [LineageEdge]) {
    edges.sort_by(|a, b| lineage_order(direction, a, b));
}

/// Lineage of a single object in both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageResult {
    /// The resolved object
    pub object: ObjectReference,

    /// Its kind as reported by the catalog
    pub object_type: ObjectType,

    /// Objects feeding into `object`
    pub upstream: Vec<LineageEdge>,

    /// Objects derived from `object`
    pub downstream: Vec<LineageEdge>,
}

impl LineageResult {
    /// Edges for one direction
    pub fn edges(&self, direction: Direction) -> &[LineageEdge] {
        match direction {
            Direction::Upstream => &self.upstream,
            Direction::Downstream => &self.downstream,
        }
    }

    /// True when neither direction returned anything
    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty() && self.downstream.is_empty()
    }
}

/// An edge from a multi-object analysis, tagged with what produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEdge {
    /// Raw identifier as entered, trimmed and upper-cased
    #[serde(rename = "QUERIED_OBJECT")]
    pub queried_object: String,

    /// Which query produced the edge
    #[serde(rename = "LINEAGE_DIRECTION")]
    pub direction: Direction,

    /// The edge itself, unmodified
    #[serde(flatten)]
    pub edge: LineageEdge,
}

/// A batch object that could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFailure {
    /// Raw identifier as supplied
    pub object: String,

    /// Why it failed
    pub error: LineageError,
}

/// Consolidated result of a multi-object analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Records of every successful object, in input order
    pub records: Vec<TaggedEdge>,

    /// Objects that failed, in input order
    pub failed: Vec<ObjectFailure>,

    /// Number of objects attempted (successes plus failures)
    pub processed: usize,

    /// Set when the caller stopped the batch early
    pub cancelled: bool,
}

impl BatchResult {
    /// Raw identifiers of failed objects, in input order
    pub fn failed_objects(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.object.as_str()).collect()
    }

    /// Number of objects that were analyzed successfully
    pub fn success_count(&self) -> usize {
        self.processed.saturating_sub(self.failed.len())
    }

    /// Records produced by one queried object
    pub fn records_for<'a>(&'a self, queried_object: &'a str) -> impl Iterator<Item = &'a TaggedEdge> + 'a {
        self.records
            .iter()
            .filter(move |r| r.queried_object == queried_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(distance: u32, source: &str, target: &str) -> LineageEdge {
        LineageEdge::between(distance, "TABLE", source, "TABLE", target)
    }

    #[test]
    fn between_splits_names() {
        let e = edge(1, "RAW.PUBLIC.ORDERS", "PROD.SALES.ORDERS");
        assert_eq!(e.source_database, "RAW");
        assert_eq!(e.source_schema, "PUBLIC");
        assert_eq!(e.source_name, "ORDERS");
        assert_eq!(e.target_fqn(), "PROD.SALES.ORDERS");
    }

    #[test]
    fn related_name_depends_on_direction() {
        let e = edge(1, "RAW.PUBLIC.SRC", "PROD.SALES.DST");
        assert_eq!(e.related_name(Direction::Upstream), "SRC");
        assert_eq!(e.related_name(Direction::Downstream), "DST");
    }

    #[test]
    fn sort_is_by_distance_then_related_name() {
        let mut edges = vec![
            edge(2, "DB.S.A", "DB.S.T"),
            edge(1, "DB.S.Z", "DB.S.T"),
            edge(1, "DB.S.B", "DB.S.T"),
        ];
        sort_edges(Direction::Upstream, &mut edges);

        let names: Vec<&str> = edges.iter().map(|e| e.source_name.as_str()).collect();
        assert_eq!(names, vec!["B", "Z", "A"]);
    }

    #[test]
    fn sort_keeps_ties_in_arrival_order() {
        let first = LineageEdge::between(1, "TABLE", "DB.S.SRC", "VIEW", "DB.S.X");
        let second = LineageEdge::between(1, "VIEW", "DB.S.SRC", "TABLE", "DB.S.Y");
        let mut edges = vec![first.clone(), second.clone()];

        sort_edges(Direction::Upstream, &mut edges);
        assert_eq!(edges, vec![first, second]);
    }

    #[test]
    fn tagged_edge_serializes_flat() {
        let tagged = TaggedEdge {
            queried_object: "PROD.SALES.ORDERS".into(),
            direction: Direction::Upstream,
            edge: edge(1, "RAW.PUBLIC.ORDERS", "PROD.SALES.ORDERS"),
        };
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["QUERIED_OBJECT"], "PROD.SALES.ORDERS");
        assert_eq!(json["LINEAGE_DIRECTION"], "UPSTREAM");
        assert_eq!(json["DISTANCE"], 1);
        assert_eq!(json["SOURCE_OBJECT_NAME"], "ORDERS");
    }

    #[test]
    fn batch_counts() {
        let batch = BatchResult {
            records: vec![],
            failed: vec![ObjectFailure {
                object: "X.Y".into(),
                error: LineageError::AmbiguousDatabase { input: "X.Y".into() },
            }],
            processed: 3,
            cancelled: false,
        };
        assert_eq!(batch.success_count(), 2);
        assert_eq!(batch.failed_objects(), vec!["X.Y"]);
    }
}
