use std::collections::BTreeMap;

use crate::domain::entities::user::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    Message(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for RepoError {}

impl From<anyhow::Error> for RepoError {
    fn from(err: anyhow::Error) -> Self {
        RepoError::Message(format!("{err:#}"))
    }
}

/// Local snapshot of the user directory served by the hosted backend.
pub trait UserDirectory: Send + Sync {
    fn init(&self) -> Result<(), RepoError>;

    fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;
    fn upsert_users(&self, users: &[UserRecord]) -> Result<usize, RepoError>;
    fn replace_users(&self, users: &[UserRecord]) -> Result<usize, RepoError>;
    fn remove_user(&self, key: &str) -> Result<(), RepoError>;
    fn load_column_visibility(&self) -> Result<BTreeMap<String, bool>, RepoError>;
    fn upsert_column_visibility(
        &self,
        visibility: &BTreeMap<String, bool>,
    ) -> Result<(), RepoError>;
}
