use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing_subscriber::{fmt, EnvFilter};

mod app;

mod domain {
    pub mod entities {
        pub mod column;
        pub mod query;
        pub mod user;
    }
}

mod infra {
    pub mod import {
        pub mod csv;
        pub mod json;
        pub mod rows;
        pub mod xlsx;
    }
    pub mod sqlite {
        pub mod queries;
        pub mod repo;
        pub mod schema;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
    }
}

mod usecase {
    pub mod ports {
        pub mod repo;
    }
    pub mod services {
        pub mod export_service;
        pub mod import_service;
        pub mod query_engine;
        pub mod query_service;
    }
}


pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const PAGE_SIZE_OPTIONS: &[i64] = &[10, 25, 50, 100];

/// Overrides the directory database location.
const DB_PATH_ENV: &str = "GEO_ATTENDANCE_DB";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("edu", "geo-attendance", "geo-attendance-admin")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

fn resolve_db_path(override_path: Option<String>, data_dir: &Path) -> PathBuf {
    match override_path.filter(|path| !path.trim().is_empty()) {
        Some(path) => PathBuf::from(path),
        None => data_dir.join("directory.sqlite"),
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = project_dirs()?;
    Ok(resolve_db_path(
        std::env::var(DB_PATH_ENV).ok(),
        project_dirs.data_local_dir(),
    ))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}

fn init_tracing() {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        tracing::warn!(error = %err, "tracing init failed");
    }
}

fn main() -> Result<()> {
    init_tracing();

    let webview_data_dir = default_webview_data_dir()?;
    tracing::info!(webview = %webview_data_dir.display(), "starting admin dashboard");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(
                    dioxus::desktop::WindowBuilder::new().with_title("Geo-Attendance Admin"),
                )
                .with_data_directory(webview_data_dir),
        )
        .launch(app::App);

    Ok(())
}
