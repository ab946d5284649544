//! Lineage report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use crate::lineage::{BatchResult, LineageResult, TaggedEdge};
use crate::summary::{BatchSummary, LineageSummary};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A failed batch object as written to the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Raw identifier as supplied
    pub object: String,

    /// Stable error code
    pub code: String,

    /// Human-readable message
    pub message: String,
}

/// Report payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Analysis {
    /// One object, both directions
    Single {
        summary: LineageSummary,
        result: LineageResult,
    },

    /// Many objects, consolidated
    Batch {
        summary: BatchSummary,
        records: Vec<TaggedEdge>,
        failures: Vec<FailureEntry>,
        cancelled: bool,
    },
}

/// Lineage report (lineage-report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Traversal distance the analysis used
    pub max_distance: u32,

    /// Analysis payload
    pub analysis: Analysis,
}

impl LineageReport {
    /// Report for a single-object analysis
    pub fn from_single(result: LineageResult, max_distance: u32) -> Self {
        let summary = LineageSummary::from_result(&result);
        Self::new(max_distance, Analysis::Single { summary, result })
    }

    /// Report for a multi-object analysis
    pub fn from_batch(batch: BatchResult, requested: usize, max_distance: u32) -> Self {
        let summary = BatchSummary::from_batch(&batch, requested);
        let failures = batch
            .failed
            .iter()
            .map(|f| FailureEntry {
                object: f.object.clone(),
                code: f.error.code().to_string(),
                message: f.error.to_string(),
            })
            .collect();

        Self::new(
            max_distance,
            Analysis::Batch {
                summary,
                records: batch.records,
                failures,
                cancelled: batch.cancelled,
            },
        )
    }

    fn new(max_distance: u32, analysis: Analysis) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            max_distance,
            analysis,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
