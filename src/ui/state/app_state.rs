use std::collections::{BTreeMap, BTreeSet};

use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::query::{SortDirection, SortSpec};
use crate::domain::entities::user::{stringify, UserRecord};
use crate::DEFAULT_PAGE_SIZE;

pub struct AppState {
    pub users: Signal<Vec<UserRecord>>,
    pub search_text: Signal<String>,
    pub column_filters: Signal<BTreeMap<String, String>>,
    pub sort: Signal<SortSpec>,
    pub page: Signal<i64>,
    pub page_size: Signal<i64>,
    pub column_visibility: Signal<BTreeMap<String, bool>>,
    pub replace_on_import: Signal<bool>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            users: use_signal(Vec::<UserRecord>::new),
            search_text: use_signal(String::new),
            column_filters: use_signal(BTreeMap::<String, String>::new),
            sort: use_signal(SortSpec::default),
            page: use_signal(|| 1_i64),
            page_size: use_signal(|| DEFAULT_PAGE_SIZE),
            column_visibility: use_signal(BTreeMap::<String, bool>::new),
            replace_on_import: use_signal(|| false),
            busy: use_signal(|| false),
            status: use_signal(|| "Ready".to_string()),
        }
    }
}

/// Distinct display values of `field`, for a filter dropdown.
pub fn filter_options(users: &[UserRecord], field: &str) -> Vec<String> {
    users
        .iter()
        .map(|user| stringify(user, field))
        .filter(|value| !value.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Clicking a header sorts by it ascending; clicking it again flips the direction.
pub fn next_sort(current: &SortSpec, column: &str) -> SortSpec {
    if current.column.as_deref() == Some(column) {
        SortSpec {
            column: current.column.clone(),
            direction: current.direction.toggled(),
        }
    } else {
        SortSpec::by(column, SortDirection::Asc)
    }
}

pub fn sort_indicator(current: &SortSpec, column: &str) -> &'static str {
    match (current.column.as_deref() == Some(column), current.direction) {
        (false, _) => "",
        (true, SortDirection::Asc) => " ▲",
        (true, SortDirection::Desc) => " ▼",
    }
}

/// Empty cells render as a dash.
pub fn cell_text(user: &UserRecord, field: &str) -> String {
    let value = stringify(user, field);
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value
    }
}
