//! Object list input and upload templates

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Reader};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use rust_xlsxwriter::Workbook;

use crate::ExportError;

/// Columns an uploaded object file must contain
pub const REQUIRED_COLUMNS: [&str; 3] = ["DATABASE_NAME", "SCHEMA_NAME", "OBJECT_NAME"];

/// Column order of the upload template
pub const TEMPLATE_COLUMNS: [&str; 4] = ["DATABASE_NAME", "SCHEMA_NAME", "OBJECT_TYPE", "OBJECT_NAME"];

/// Worksheet name used by the Excel template
pub const TEMPLATE_SHEET: &str = "Lineage_Objects";

/// One row of the upload template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    pub database: &'static str,
    pub schema: &'static str,
    pub object_type: &'static str,
    pub name: &'static str,
}

impl TemplateRow {
    fn values(&self) -> [&'static str; 4] {
        [self.database, self.schema, self.object_type, self.name]
    }
}

/// Split pasted text into identifiers, one per line
pub fn parse_object_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read `DATABASE.SCHEMA.OBJECT` identifiers from an uploaded CSV file
///
/// The header must name every column in [`REQUIRED_COLUMNS`]; any other
/// column (such as `OBJECT_TYPE`) is ignored. Rows whose three name cells are
/// all blank are skipped.
pub fn parse_objects_csv<R: Read>(reader: R) -> Result<Vec<String>, ExportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let positions = required_positions(&headers)?;

    let mut objects = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = positions.iter().map(|&i| record.get(i).unwrap_or(""));
        objects.extend(object_name(cells));
    }

    Ok(objects)
}

/// Read identifiers from the first sheet of an uploaded Excel workbook
///
/// Accepts `.xlsx` and legacy `.xls`. The first row is the header; column
/// rules match [`parse_objects_csv`].
pub fn parse_objects_xlsx(bytes: &[u8]) -> Result<Vec<String>, ExportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| ExportError::Xlsx(err.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExportError::Xlsx("Workbook has no worksheets".to_string()))?
        .map_err(|err| ExportError::Xlsx(err.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    let positions = required_positions(&headers)?;

    let mut objects = Vec::new();
    for row in rows {
        let cells: Vec<String> = positions
            .iter()
            .map(|&i| row.get(i).map(|cell| cell.to_string()).unwrap_or_default())
            .collect();
        objects.extend(object_name(cells.iter().map(String::as_str)));
    }

    Ok(objects)
}

/// Positions of [`REQUIRED_COLUMNS`] in a header row
fn required_positions(headers: &[String]) -> Result<Vec<usize>, ExportError> {
    let position = |column: &str| headers.iter().position(|h| h.trim() == column);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| position(column).is_none())
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ExportError::MissingColumns(missing));
    }

    Ok(REQUIRED_COLUMNS.iter().filter_map(|c| position(c)).collect())
}

/// Join name cells with dots; `None` when every cell is blank
fn object_name<'a>(cells: impl Iterator<Item = &'a str>) -> Option<String> {
    let parts: Vec<&str> = cells.map(str::trim).collect();
    if parts.iter().all(|p| p.is_empty()) {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Sample rows shipped in the upload template
pub fn template_rows() -> Vec<TemplateRow> {
    vec![
        TemplateRow {
            database: "SNOWFLAKE_SAMPLE_DATA",
            schema: "TPCH_SF1",
            object_type: "TABLE",
            name: "CUSTOMER",
        },
        TemplateRow {
            database: "SNOWFLAKE_SAMPLE_DATA",
            schema: "TPCH_SF1",
            object_type: "VIEW",
            name: "CUSTOMER_VIEW",
        },
    ]
}

/// Upload template as CSV bytes
pub fn template_csv() -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    writer.write_record(TEMPLATE_COLUMNS)?;
    for row in template_rows() {
        writer.write_record(row.values())?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))
}

/// Upload template as an Excel workbook
pub fn template_xlsx() -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;

    for (col, header) in TEMPLATE_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (index, row) in template_rows().iter().enumerate() {
        for (col, value) in row.values().iter().enumerate() {
            sheet.write_string((index + 1) as u32, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
