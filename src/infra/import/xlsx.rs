use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::entities::user::{FieldValue, UserRecord};
use crate::infra::import::rows::{build_users, text_cell};

pub fn cell_to_value(cell: &Data) -> Option<FieldValue> {
    match cell {
        Data::String(v) => text_cell(v),
        Data::Float(v) => Some(FieldValue::Number(*v)),
        Data::Int(v) => Some(FieldValue::Number(*v as f64)),
        Data::Bool(v) => Some(FieldValue::Bool(*v)),
        Data::DateTime(v) => text_cell(&v.to_string()),
        Data::DateTimeIso(v) => text_cell(v),
        Data::DurationIso(v) => text_cell(v),
        Data::Error(_) | Data::Empty => None,
    }
}

fn header_name(cell: &Data) -> String {
    match cell_to_value(cell) {
        Some(FieldValue::Text(text)) => text,
        Some(FieldValue::Number(number)) => crate::domain::entities::user::format_number(number),
        Some(FieldValue::Bool(flag)) => flag.to_string(),
        None => String::new(),
    }
}

/// Reads the first worksheet; its first row names the fields.
pub fn read_xlsx_roster(xlsx_path: &Path) -> Result<Vec<UserRecord>> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("workbook has no sheets: {}", xlsx_path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|row| row.iter().map(header_name).collect())
        .unwrap_or_default();
    if headers.iter().all(|header| header.trim().is_empty()) {
        anyhow::bail!("sheet {sheet_name} has no header row")
    }

    let rows = sheet_rows
        .map(|row| {
            (0..headers.len())
                .map(|col_idx| row.get(col_idx).and_then(cell_to_value))
                .collect()
        })
        .collect();

    build_users(&headers, rows).with_context(|| format!("failed to read sheet: {sheet_name}"))
}
