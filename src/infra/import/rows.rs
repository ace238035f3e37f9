use std::collections::{BTreeMap, HashSet};

use anyhow::Result;

use crate::domain::entities::user::{FieldValue, UserRecord, FIELD_ID, FIELD_KEY};

/// Turns a header row and its data rows into users. Row numbers in errors are
/// 1-based and count the header as row 1.
pub fn build_users(headers: &[String], rows: Vec<Vec<Option<FieldValue>>>) -> Result<Vec<UserRecord>> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if !headers
        .iter()
        .any(|header| header == FIELD_KEY || header == FIELD_ID)
    {
        anyhow::bail!("roster header must contain a `key` or `id` column")
    }

    let mut users = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = idx + 2;
        if row.iter().all(Option::is_none) {
            continue;
        }

        let fields: BTreeMap<String, FieldValue> = headers
            .iter()
            .zip(row)
            .filter(|(header, _)| !header.is_empty())
            .filter_map(|(header, value)| value.map(|value| (header.clone(), value)))
            .collect();

        let Some(user) = UserRecord::from_fields(fields) else {
            tracing::warn!(row_number, "roster row has no key");
            anyhow::bail!("row {row_number}: key is required")
        };
        if !seen.insert(user.key.clone()) {
            tracing::warn!(row_number, key = %user.key, "duplicate key in roster");
            anyhow::bail!("row {row_number}: duplicate key `{}`", user.key)
        }
        users.push(user);
    }

    Ok(users)
}

pub fn ensure_unique_keys(users: &[UserRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(users.len());
    for (idx, user) in users.iter().enumerate() {
        if !seen.insert(user.key.as_str()) {
            tracing::warn!(key = %user.key, "duplicate key in import");
            anyhow::bail!("record {}: duplicate key `{}`", idx + 1, user.key)
        }
    }
    Ok(())
}

/// Blank cells are absent fields.
pub fn text_cell(value: &str) -> Option<FieldValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(FieldValue::Text(trimmed.to_string()))
    }
}
