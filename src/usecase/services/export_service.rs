use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::domain::entities::column::ColumnDef;
use crate::domain::entities::query::QueryDescriptor;
use crate::domain::entities::user::{stringify, UserRecord};
use crate::usecase::services::query_engine::filter_and_sort;

pub fn export_file_name(date: NaiveDate) -> String {
    format!("users_export_{}.csv", date.format("%Y-%m-%d"))
}

/// Renders `users` as CSV: a quoted header row of labels, then one quoted row per user.
pub fn render_csv(users: &[UserRecord], columns: &[ColumnDef]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| column.label))
        .context("failed to write csv header")?;
    for user in users {
        writer
            .write_record(columns.iter().map(|column| stringify(user, column.key)))
            .with_context(|| format!("failed to write csv row for user {}", user.key))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("failed to flush csv")?;
    let mut text = String::from_utf8(bytes).context("csv output is not utf-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// CSV for everything `query` matches; pagination is ignored.
pub fn export_matching(
    users: &[UserRecord],
    query: &QueryDescriptor,
    columns: &[ColumnDef],
) -> Result<String> {
    render_csv(&filter_and_sort(users, query), columns)
}

pub struct ExportService;

impl ExportService {
    pub fn write_csv(
        &self,
        path: &Path,
        users: &[UserRecord],
        query: &QueryDescriptor,
        columns: &[ColumnDef],
    ) -> Result<usize> {
        let matched = filter_and_sort(users, query);
        let text = render_csv(&matched, columns)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write export: {}", path.display()))?;
        tracing::info!(rows = matched.len(), path = %path.display(), "exported users");
        Ok(matched.len())
    }
}
