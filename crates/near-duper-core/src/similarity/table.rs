use crate::model::{CellValue, Row, Table};
use ahash::AHashMap;

/// Mean of per-sheet scores over the sheet names both workbooks share.
/// Sheets present on one side only are ignored.
pub fn table_similarity(a: &Table, b: &Table) -> f64 {
    let scores: Vec<f64> = a
        .iter()
        .filter_map(|(name, rows_a)| b.get(name).map(|rows_b| sheet_similarity(rows_a, rows_b)))
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Cell agreement over the columns both sheets share, row by row.
///
/// The first row of each sheet is its header. A cell pair matches when both
/// sides are empty or both canonicalize to the same string.
pub fn sheet_similarity(a: &[Row], b: &[Row]) -> f64 {
    let (Some((header_a, data_a)), Some((header_b, data_b))) = (a.split_first(), b.split_first())
    else {
        return 0.0;
    };

    let labels_b = column_labels(header_b);
    let common: Vec<(usize, usize)> = ordered_labels(header_a)
        .into_iter()
        .filter_map(|(label, col_a)| labels_b.get(&label).map(|&col_b| (col_a, col_b)))
        .collect();

    let row_count = data_a.len().min(data_b.len());
    if common.is_empty() || row_count == 0 {
        return 0.0;
    }

    let mut matches = 0usize;
    let mut compared = 0usize;
    for (row_a, row_b) in data_a.iter().zip(data_b.iter()).take(row_count) {
        for &(col_a, col_b) in &common {
            compared += 1;
            if cells_match(cell(row_a, col_a), cell(row_b, col_b)) {
                matches += 1;
            }
        }
    }

    matches as f64 / compared as f64
}

fn cell(row: &Row, col: usize) -> Option<&CellValue> {
    row.get(col).and_then(|c| c.as_ref()).filter(|c| !c.is_empty())
}

fn cells_match(a: Option<&CellValue>, b: Option<&CellValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.canonical() == b.canonical(),
        _ => false,
    }
}

/// Header labels with their column index, first occurrence wins.
/// A blank header cell is labelled by its 1-based column position.
fn ordered_labels(header: &Row) -> Vec<(String, usize)> {
    let mut seen: AHashMap<String, usize> = AHashMap::new();
    let mut labels = Vec::new();
    for (col, value) in header.iter().enumerate() {
        let label = match value {
            Some(v) if !v.is_empty() => v.canonical(),
            _ => format!("column {}", col + 1),
        };
        if !seen.contains_key(&label) {
            seen.insert(label.clone(), col);
            labels.push((label, col));
        }
    }
    labels
}

fn column_labels(header: &Row) -> AHashMap<String, usize> {
    ordered_labels(header).into_iter().collect()
}
