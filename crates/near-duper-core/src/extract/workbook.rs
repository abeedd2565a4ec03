use crate::error::ExtractionError;
use crate::model::{CellValue, Row, Table};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::trace;

/// Sheet name given to the single table of a CSV file, so a CSV export
/// lines up with the default first sheet of a workbook.
pub const CSV_SHEET_NAME: &str = "Sheet1";

pub fn workbook_table(path: &Path) -> Result<Table, ExtractionError> {
    let mut workbook = open_workbook_auto(path)?;
    let mut table = Table::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows: Vec<Row> = range
            .rows()
            .map(|cells| cells.iter().map(cell_value).collect::<Row>())
            .filter(has_content)
            .collect();
        trace!("Sheet '{}' of {}: {} rows", name, path.display(), rows.len());
        table.insert(name, rows);
    }

    Ok(table)
}

pub fn csv_table(path: &Path) -> Result<Table, ExtractionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = record.iter().map(typed_field).collect();
        if has_content(&row) {
            rows.push(row);
        }
    }

    let mut table = Table::new();
    table.insert(CSV_SHEET_NAME.to_string(), rows);
    Ok(table)
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(CellValue::Int(*i)),
        Data::Float(f) => Some(CellValue::Float(*f)),
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::DateTime(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

/// CSV has no cell types; numbers and booleans are recovered on read.
fn typed_field(field: &str) -> Option<CellValue> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(CellValue::Int(i));
    }
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Some(CellValue::Float(f));
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Some(CellValue::Bool(true)),
        "false" => Some(CellValue::Bool(false)),
        _ => Some(CellValue::Text(field.to_string())),
    }
}

fn has_content(row: &Row) -> bool {
    row.iter().flatten().any(|cell| !cell.is_empty())
}
