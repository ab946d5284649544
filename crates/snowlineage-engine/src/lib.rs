//! SnowLineage Engine
//!
//! Resolves user-typed object names, builds lineage traversals and drives
//! them through the warehouse collaborators, one object or a whole batch.

pub mod resolver;
pub mod query_builder;
pub mod analyzer;

pub use resolver::{parse_identifier, resolve, resolve_type, ParsedIdentifier};
pub use query_builder::{build_query, validate_distance};
pub use analyzer::{analyze_single, analyze_multiple, analyze_multiple_with, BatchProgress};
