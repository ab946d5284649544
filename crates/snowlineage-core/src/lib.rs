//! SnowLineage Core
//!
//! Domain model shared by the resolver, the warehouse adapters and the
//! exporters. Error codes and the report schema are part of the public API.

pub mod object;
pub mod error;
pub mod lineage;
pub mod query;
pub mod summary;
pub mod report;
pub mod config;

pub use object::{ObjectReference, ObjectType, Direction};
pub use error::LineageError;
pub use lineage::{LineageEdge, LineageResult, TaggedEdge, BatchResult, ObjectFailure, sort_edges};
pub use query::{QuerySpec, MIN_DISTANCE, MAX_DISTANCE};
pub use summary::{LineageSummary, BatchSummary, ObjectSummary};
pub use report::{LineageReport, ReportVersion, Analysis, FailureEntry};
pub use config::{Config, ConfigError, AnalysisConfig, WarehouseConfig};
