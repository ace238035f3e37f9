use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::entities::column::normalize_column_visibility;
use crate::domain::entities::user::UserRecord;
use crate::usecase::ports::repo::{RepoError, UserDirectory};

pub struct QueryService {
    repo: Arc<dyn UserDirectory>,
}

impl QueryService {
    pub fn new(repo: Arc<dyn UserDirectory>) -> Self {
        Self { repo }
    }

    pub fn load_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        self.repo.list_users()
    }

    pub fn load_column_visibility(&self) -> Result<BTreeMap<String, bool>, RepoError> {
        self.repo
            .load_column_visibility()
            .map(|visibility| normalize_column_visibility(&visibility))
    }

    pub fn save_column_visibility(
        &self,
        visibility: &BTreeMap<String, bool>,
    ) -> Result<(), RepoError> {
        self.repo
            .upsert_column_visibility(&normalize_column_visibility(visibility))
    }

    pub fn remove_user(&self, key: &str) -> Result<Vec<UserRecord>, RepoError> {
        self.repo.remove_user(key)?;
        self.repo.list_users()
    }
}
