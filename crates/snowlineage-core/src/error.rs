//! Lineage analysis errors
//!
//! Each variant carries a stable code (see [`LineageError::code`]) that is
//! written into JSON reports. NEVER rename or remove codes - add new ones.

use crate::object::Direction;
use serde::{Deserialize, Serialize};

/// Errors produced while resolving and analyzing an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineageError {
    /// Identifier is not `SCHEMA.OBJECT` or `DATABASE.SCHEMA.OBJECT`
    #[error("Invalid object name '{input}': expected 'SCHEMA.OBJECT_NAME' or 'DATABASE.SCHEMA.OBJECT_NAME'")]
    InvalidFormat { input: String },

    /// Two-part identifier given but the session has no current database
    #[error("Could not determine current database for '{input}'; provide 'DATABASE.SCHEMA.OBJECT_NAME'")]
    AmbiguousDatabase { input: String },

    /// Object is missing, inaccessible, or not a table/view
    #[error("Could not determine if '{object}' is a TABLE or VIEW, or object does not exist{}", reason_suffix(.reason))]
    NotFound {
        object: String,
        reason: Option<String>,
    },

    /// Traversal distance outside the accepted range
    #[error("Invalid distance {distance}: must be between {min} and {max}")]
    InvalidDistance { distance: u32, min: u32, max: u32 },

    /// The query executor failed (permission, connectivity, ...)
    #[error("Error fetching {direction} lineage for '{object}': {message}")]
    ExecutionError {
        object: String,
        direction: Direction,
        message: String,
    },

    /// A batch was requested with no objects
    #[error("No objects to analyze")]
    EmptyBatch,
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" ({})", reason),
        None => String::new(),
    }
}

impl LineageError {
    /// Stable string identifier for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::AmbiguousDatabase { .. } => "AMBIGUOUS_DATABASE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidDistance { .. } => "INVALID_DISTANCE",
            Self::ExecutionError { .. } => "EXECUTION_ERROR",
            Self::EmptyBatch => "EMPTY_BATCH",
        }
    }

    /// Whether the error happened before any lineage query was issued
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat { .. } | Self::AmbiguousDatabase { .. } | Self::NotFound { .. }
        )
    }
}
