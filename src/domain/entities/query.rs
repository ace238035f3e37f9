use std::collections::BTreeMap;

use crate::domain::entities::user::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn by(column: &str, direction: SortDirection) -> Self {
        Self {
            column: Some(column.to_string()),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub search_text: String,
    pub column_filters: BTreeMap<String, String>,
    pub sort: SortSpec,
    pub page: i64,
    pub page_size: i64,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            column_filters: BTreeMap::new(),
            sort: SortSpec::default(),
            page: 1,
            page_size: crate::DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryDescriptor {
    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.column_filters
            .insert(field.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aggregates {
    pub total_users: usize,
    pub active_users: usize,
    pub total_admins: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub items: Vec<UserRecord>,
    pub total_matched: usize,
    pub page: i64,
    pub page_count: i64,
    pub aggregates: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidArgument(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
        }
    }
}

impl std::error::Error for QueryError {}
