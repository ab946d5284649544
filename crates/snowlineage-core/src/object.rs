//! Warehouse object identity: references, kinds and lineage directions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully-qualified, upper-cased `DATABASE.SCHEMA.NAME` reference
///
/// Fields are private so every instance goes through [`ObjectReference::new`],
/// which enforces the non-empty, upper-case invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    database: String,
    schema: String,
    name: String,
}

impl ObjectReference {
    /// Create a reference, trimming and upper-casing each part
    ///
    /// Returns `None` if any part is empty after trimming.
    pub fn new(database: &str, schema: &str, name: &str) -> Option<Self> {
        let database = normalize_part(database)?;
        let schema = normalize_part(schema)?;
        let name = normalize_part(name)?;

        Some(Self {
            database,
            schema,
            name,
        })
    }

    /// Database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Schema name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Object (table or view) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.name)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

fn normalize_part(part: &str) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Kind of object the lineage function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    Table,
    View,
}

impl ObjectType {
    /// Literal passed to `GET_LINEAGE` as the object domain
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
        }
    }

    /// Map an `INFORMATION_SCHEMA.TABLES.TABLE_TYPE` value
    ///
    /// `BASE TABLE` and `TABLE` map to [`ObjectType::Table`], `VIEW` to
    /// [`ObjectType::View`]. Everything else (external tables, temporary
    /// tables, unknown values) is not a lineage-capable kind.
    pub fn from_catalog(table_type: &str) -> Option<Self> {
        match table_type.trim().to_uppercase().as_str() {
            "BASE TABLE" | "TABLE" => Some(Self::Table),
            "VIEW" => Some(Self::View),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lineage traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Objects the queried object is derived from
    Upstream,

    /// Objects derived from the queried object
    Downstream,
}

impl Direction {
    /// Both directions, in reporting order
    pub const ALL: [Direction; 2] = [Direction::Upstream, Direction::Downstream];

    /// Literal passed to `GET_LINEAGE`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "UPSTREAM",
            Self::Downstream => "DOWNSTREAM",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_normalized() {
        let reference = ObjectReference::new(" prod ", "sales", "Orders").unwrap();
        assert_eq!(reference.database(), "PROD");
        assert_eq!(reference.schema(), "SALES");
        assert_eq!(reference.name(), "ORDERS");
        assert_eq!(reference.fqn(), "PROD.SALES.ORDERS");
        assert_eq!(reference.to_string(), "PROD.SALES.ORDERS");
    }

    #[test]
    fn reference_rejects_empty_parts() {
        assert!(ObjectReference::new("", "SALES", "ORDERS").is_none());
        assert!(ObjectReference::new("PROD", "  ", "ORDERS").is_none());
        assert!(ObjectReference::new("PROD", "SALES", "").is_none());
    }

    #[test]
    fn catalog_type_mapping() {
        assert_eq!(ObjectType::from_catalog("BASE TABLE"), Some(ObjectType::Table));
        assert_eq!(ObjectType::from_catalog("TABLE"), Some(ObjectType::Table));
        assert_eq!(ObjectType::from_catalog("view"), Some(ObjectType::View));
        assert_eq!(ObjectType::from_catalog("EXTERNAL TABLE"), None);
        assert_eq!(ObjectType::from_catalog(""), None);
    }

    #[test]
    fn direction_literals() {
        assert_eq!(Direction::Upstream.as_str(), "UPSTREAM");
        assert_eq!(Direction::Downstream.to_string(), "DOWNSTREAM");

        let json = serde_json::to_string(&Direction::Upstream).unwrap();
        assert_eq!(json, "\"UPSTREAM\"");
    }
}
