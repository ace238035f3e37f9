use std::collections::BTreeMap;

use crate::domain::entities::user::{
    FIELD_DEPARTMENT, FIELD_EMAIL, FIELD_JOINED, FIELD_LAST_ACTIVE, FIELD_LEVEL,
    FIELD_MATRIC_NUMBER, FIELD_NAME, FIELD_PHONE, FIELD_ROLE, FIELD_STATUS, FIELD_VERIFICATION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
    pub filterable: bool,
}

const fn column(key: &'static str, label: &'static str, filterable: bool) -> ColumnDef {
    ColumnDef {
        key,
        label,
        filterable,
    }
}

/// Directory table columns in display order.
pub const USER_COLUMNS: &[ColumnDef] = &[
    column(FIELD_NAME, "Name", false),
    column(FIELD_EMAIL, "Email", false),
    column(FIELD_PHONE, "Phone", false),
    column(FIELD_MATRIC_NUMBER, "Matric Number", false),
    column(FIELD_DEPARTMENT, "Department", true),
    column(FIELD_LEVEL, "Level", true),
    column(FIELD_STATUS, "Status", true),
    column(FIELD_VERIFICATION, "Verification", true),
    column(FIELD_ROLE, "Role", true),
    column(FIELD_JOINED, "Joined", false),
    column(FIELD_LAST_ACTIVE, "Last Active", false),
];

pub fn column_by_key(key: &str) -> Option<ColumnDef> {
    USER_COLUMNS.iter().copied().find(|column| column.key == key)
}

/// Columns shown under `visibility`; keys missing from the map are visible.
pub fn visible_columns(visibility: &BTreeMap<String, bool>) -> Vec<ColumnDef> {
    USER_COLUMNS
        .iter()
        .copied()
        .filter(|column| visibility.get(column.key).copied().unwrap_or(true))
        .collect()
}

pub fn normalize_column_visibility(visibility: &BTreeMap<String, bool>) -> BTreeMap<String, bool> {
    USER_COLUMNS
        .iter()
        .map(|column| {
            let visible = visibility.get(column.key).copied().unwrap_or(true);
            (column.key.to_string(), visible)
        })
        .collect()
}
