use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::entities::user::UserRecord;
use crate::infra::import::csv::read_csv_roster;
use crate::infra::import::json::read_json_directory;
use crate::infra::import::xlsx::read_xlsx_roster;
use crate::usecase::ports::repo::UserDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}

pub fn read_user_file(path: &Path) -> Result<Vec<UserRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => read_json_directory(path),
        "csv" => read_csv_roster(path),
        "xlsx" | "xls" | "xlsm" | "ods" => read_xlsx_roster(path),
        other => anyhow::bail!("unsupported import file type: .{other}"),
    }
}

pub struct ImportService {
    repo: Arc<dyn UserDirectory>,
}

impl ImportService {
    pub fn new(repo: Arc<dyn UserDirectory>) -> Self {
        Self { repo }
    }

    pub fn import_file(&self, path: &Path, mode: ImportMode) -> Result<ImportResult> {
        let users = read_user_file(path)?;
        let imported = match mode {
            ImportMode::Merge => self.repo.upsert_users(&users),
            ImportMode::Replace => self.repo.replace_users(&users),
        }
        .with_context(|| format!("failed to store users from {}", path.display()))?;
        let total = self
            .repo
            .list_users()
            .context("failed to count stored users")?
            .len();

        tracing::info!(imported, total, ?mode, path = %path.display(), "imported users");
        Ok(ImportResult { imported, total })
    }
}
