//! Lineage query specification and its `GET_LINEAGE` rendering

use crate::object::{Direction, ObjectReference, ObjectType};
use serde::{Deserialize, Serialize};

/// Smallest traversal distance accepted
pub const MIN_DISTANCE: u32 = 1;

/// Largest traversal distance accepted
pub const MAX_DISTANCE: u32 = 5;

/// Everything needed to run one lineage traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Object to start from
    pub object: ObjectReference,

    /// Its kind (the function needs it to pick the object domain)
    pub object_type: ObjectType,

    /// Which way to traverse
    pub direction: Direction,

    /// Maximum number of hops, within [`MIN_DISTANCE`]..=[`MAX_DISTANCE`]
    pub max_distance: u32,
}

impl QuerySpec {
    /// Fully qualified name of the queried object
    pub fn fqn(&self) -> String {
        self.object.fqn()
    }

    /// Column the result is ordered by after `DISTANCE`
    pub fn order_column(&self) -> &'static str {
        match self.direction {
            Direction::Upstream => "SOURCE_OBJECT_NAME",
            Direction::Downstream => "TARGET_OBJECT_NAME",
        }
    }

    /// Render the `SNOWFLAKE.CORE.GET_LINEAGE` query
    pub fn to_sql(&self) -> String {
        format!(
            r#"SELECT
    DISTANCE,
    SOURCE_OBJECT_DOMAIN,
    SOURCE_OBJECT_DATABASE,
    SOURCE_OBJECT_SCHEMA,
    SOURCE_OBJECT_NAME,
    TARGET_OBJECT_DOMAIN,
    TARGET_OBJECT_DATABASE,
    TARGET_OBJECT_SCHEMA,
    TARGET_OBJECT_NAME
FROM TABLE (SNOWFLAKE.CORE.GET_LINEAGE(
    {},
    {},
    {},
    {}
))
ORDER BY DISTANCE, {}"#,
            quote_literal(&self.fqn()),
            quote_literal(self.object_type.as_str()),
            quote_literal(self.direction.as_str()),
            self.max_distance,
            self.order_column(),
        )
    }
}

/// Quote a SQL string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote a SQL identifier, doubling embedded double quotes
pub fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(direction: Direction) -> QuerySpec {
        QuerySpec {
            object: ObjectReference::new("PROD", "SALES", "ORDERS").unwrap(),
            object_type: ObjectType::Table,
            direction,
            max_distance: 3,
        }
    }

    #[test]
    fn upstream_sql() {
        let sql = spec(Direction::Upstream).to_sql();
        assert!(sql.contains("SNOWFLAKE.CORE.GET_LINEAGE("));
        assert!(sql.contains("'PROD.SALES.ORDERS',"));
        assert!(sql.contains("'TABLE',"));
        assert!(sql.contains("'UPSTREAM',"));
        assert!(sql.contains("    3\n"));
        assert!(sql.ends_with("ORDER BY DISTANCE, SOURCE_OBJECT_NAME"));
    }

    #[test]
    fn downstream_sql_orders_by_target() {
        let sql = spec(Direction::Downstream).to_sql();
        assert!(sql.contains("'DOWNSTREAM',"));
        assert!(sql.ends_with("ORDER BY DISTANCE, TARGET_OBJECT_NAME"));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(quote_literal("O'BRIEN"), "'O''BRIEN'");
        assert_eq!(quote_identifier("MY\"DB"), "\"MY\"\"DB\"");

        let spec = QuerySpec {
            object: ObjectReference::new("PROD", "SALES", "O'BRIEN").unwrap(),
            object_type: ObjectType::View,
            direction: Direction::Upstream,
            max_distance: 1,
        };
        assert!(spec.to_sql().contains("'PROD.SALES.O''BRIEN'"));
    }
}
