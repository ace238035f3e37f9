use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS directory_user (
            key         TEXT PRIMARY KEY,
            position    INTEGER NOT NULL,
            imported_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS user_field (
            user_key    TEXT NOT NULL,
            field       TEXT NOT NULL,
            kind        TEXT NOT NULL CHECK (kind IN ('text', 'number', 'bool')),
            value       TEXT NOT NULL,
            PRIMARY KEY (user_key, field),
            FOREIGN KEY (user_key) REFERENCES directory_user(key) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS column_visibility (
            column_key  TEXT PRIMARY KEY,
            visible     INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_directory_user_position
            ON directory_user(position);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
