use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::user::UserRecord;
use crate::infra::import::rows::{build_users, text_cell};

pub fn read_csv_roster(csv_path: &Path) -> Result<Vec<UserRecord>> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    read_roster(reader).with_context(|| format!("failed to read roster: {}", csv_path.display()))
}

pub fn read_roster<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<UserRecord>> {
    let headers: Vec<String> = reader
        .headers()
        .context("failed to read csv headers")?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|header| header.trim().is_empty()) {
        anyhow::bail!("csv header is required")
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        rows.push(
            (0..headers.len())
                .map(|col_idx| text_cell(record.get(col_idx).unwrap_or("")))
                .collect(),
        );
    }

    build_users(&headers, rows)
}
