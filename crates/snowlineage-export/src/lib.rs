//! SnowLineage Export
//!
//! Reads object lists (plain text, CSV or Excel uploads) and writes lineage results
//! as CSV or Excel workbooks.

mod error;
pub mod input;
pub mod csv;
pub mod xlsx;

pub use error::ExportError;
pub use input::{parse_object_list, parse_objects_csv, parse_objects_xlsx, template_csv, template_rows, template_xlsx, TemplateRow};
pub use crate::csv::{batch_csv, edges_csv, lineage_file_name};
pub use xlsx::batch_xlsx;
