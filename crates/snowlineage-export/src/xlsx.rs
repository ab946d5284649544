use rust_xlsxwriter::{Workbook, Worksheet};
use snowlineage_core::BatchResult;

use crate::csv::BATCH_COLUMNS;
use crate::ExportError;

/// Worksheet holding the consolidated records
pub const BATCH_SHEET: &str = "Lineage_Analysis";

/// Consolidated multi-object records as an Excel workbook
pub fn batch_xlsx(batch: &BatchResult) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(BATCH_SHEET)?;
    write_batch_sheet(sheet, batch)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_batch_sheet(sheet: &mut Worksheet, batch: &BatchResult) -> Result<(), ExportError> {
    write_row(sheet, 0, 0, &BATCH_COLUMNS)?;

    for (index, record) in batch.records.iter().enumerate() {
        let row = (index + 1) as u32;
        let edge = &record.edge;

        write_row(
            sheet,
            row,
            0,
            &[
                &sanitize_xlsx_value(&record.queried_object),
                record.direction.as_str(),
            ],
        )?;
        sheet.write_number(row, 2, edge.distance)?;
        write_row(
            sheet,
            row,
            3,
            &[
                &sanitize_xlsx_value(&edge.source_domain),
                &sanitize_xlsx_value(&edge.source_database),
                &sanitize_xlsx_value(&edge.source_schema),
                &sanitize_xlsx_value(&edge.source_name),
                &sanitize_xlsx_value(&edge.target_domain),
                &sanitize_xlsx_value(&edge.target_database),
                &sanitize_xlsx_value(&edge.target_schema),
                &sanitize_xlsx_value(&edge.target_name),
            ],
        )?;
    }

    Ok(())
}

fn write_row(sheet: &mut Worksheet, row: u32, first_col: u16, values: &[&str]) -> Result<(), ExportError> {
    for (offset, value) in values.iter().enumerate() {
        sheet.write_string(row, first_col + offset as u16, *value)?;
    }
    Ok(())
}

/// Quote values a spreadsheet would otherwise evaluate as a formula
fn sanitize_xlsx_value(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", value),
        _ => value.to_string(),
    }
}
