//! Summary statistics over lineage results

use crate::lineage::{BatchResult, LineageResult};
use crate::object::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Headline numbers for a single-object analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageSummary {
    /// Distinct upstream source objects (by name)
    pub upstream_objects: usize,

    /// Distinct downstream target objects (by name)
    pub downstream_objects: usize,

    /// Deepest upstream edge, 0 when none
    pub max_upstream_distance: u32,

    /// Deepest downstream edge, 0 when none
    pub max_downstream_distance: u32,
}

impl LineageSummary {
    /// Compute the summary of a result
    pub fn from_result(result: &LineageResult) -> Self {
        let distinct = |direction: Direction| {
            result
                .edges(direction)
                .iter()
                .map(|e| e.related_name(direction))
                .collect::<BTreeSet<_>>()
                .len()
        };
        let max_distance = |direction: Direction| {
            result
                .edges(direction)
                .iter()
                .map(|e| e.distance)
                .max()
                .unwrap_or(0)
        };

        Self {
            upstream_objects: distinct(Direction::Upstream),
            downstream_objects: distinct(Direction::Downstream),
            max_upstream_distance: max_distance(Direction::Upstream),
            max_downstream_distance: max_distance(Direction::Downstream),
        }
    }
}

/// Record counts for one queried object in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub queried_object: String,
    pub upstream: usize,
    pub downstream: usize,
    pub total: usize,
}

/// Headline numbers for a multi-object analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Objects requested by the caller
    pub requested: usize,

    /// Objects analyzed successfully
    pub successful: usize,

    /// Objects that failed
    pub failed: usize,

    /// Total lineage records
    pub total_records: usize,

    /// Records from upstream queries
    pub upstream_records: usize,

    /// Records from downstream queries
    pub downstream_records: usize,

    /// Distinct source object names across all records
    pub unique_sources: usize,

    /// Distinct target object names across all records
    pub unique_targets: usize,

    /// Per queried object, in first-seen order
    pub per_object: Vec<ObjectSummary>,
}

impl BatchSummary {
    /// Compute the summary of a batch
    ///
    /// `requested` is the number of objects the caller asked for, which can
    /// exceed `batch.processed` when the batch was cancelled.
    pub fn from_batch(batch: &BatchResult, requested: usize) -> Self {
        let mut per_object: Vec<ObjectSummary> = Vec::new();
        let mut sources = BTreeSet::new();
        let mut targets = BTreeSet::new();
        let mut upstream_records = 0;
        let mut downstream_records = 0;

        for record in &batch.records {
            sources.insert(record.edge.source_name.as_str());
            targets.insert(record.edge.target_name.as_str());

            let index = match per_object
                .iter()
                .position(|o| o.queried_object == record.queried_object)
            {
                Some(index) => index,
                None => {
                    per_object.push(ObjectSummary {
                        queried_object: record.queried_object.clone(),
                        upstream: 0,
                        downstream: 0,
                        total: 0,
                    });
                    per_object.len() - 1
                }
            };

            let entry = &mut per_object[index];
            match record.direction {
                Direction::Upstream => {
                    entry.upstream += 1;
                    upstream_records += 1;
                }
                Direction::Downstream => {
                    entry.downstream += 1;
                    downstream_records += 1;
                }
            }
            entry.total += 1;
        }

        Self {
            requested,
            successful: batch.success_count(),
            failed: batch.failed.len(),
            total_records: batch.records.len(),
            upstream_records,
            downstream_records,
            unique_sources: sources.len(),
            unique_targets: targets.len(),
            per_object,
        }
    }
}
