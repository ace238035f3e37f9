use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::entities::user::UserRecord;
use crate::infra::sqlite::queries::{
    list_users, load_column_visibility, remove_user, replace_users, upsert_column_visibility,
    upsert_users,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{RepoError, UserDirectory};

pub struct SqliteDirectory {
    pub db_path: PathBuf,
}

impl SqliteDirectory {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl UserDirectory for SqliteDirectory {
    fn init(&self) -> Result<(), RepoError> {
        init_db(&self.db_path).map_err(RepoError::from)
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        list_users(&self.db_path).map_err(RepoError::from)
    }

    fn upsert_users(&self, users: &[UserRecord]) -> Result<usize, RepoError> {
        let written = upsert_users(&self.db_path, users)?;
        tracing::info!(written, db = %self.db_path.display(), "upserted directory users");
        Ok(written)
    }

    fn replace_users(&self, users: &[UserRecord]) -> Result<usize, RepoError> {
        let written = replace_users(&self.db_path, users)?;
        tracing::info!(written, db = %self.db_path.display(), "replaced directory users");
        Ok(written)
    }

    fn remove_user(&self, key: &str) -> Result<(), RepoError> {
        remove_user(&self.db_path, key)?;
        tracing::info!(key, "removed directory user");
        Ok(())
    }

    fn load_column_visibility(&self) -> Result<BTreeMap<String, bool>, RepoError> {
        load_column_visibility(&self.db_path).map_err(RepoError::from)
    }

    fn upsert_column_visibility(
        &self,
        visibility: &BTreeMap<String, bool>,
    ) -> Result<(), RepoError> {
        upsert_column_visibility(&self.db_path, visibility).map_err(RepoError::from)
    }
}
