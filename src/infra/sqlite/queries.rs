use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::domain::entities::user::{FieldValue, UserRecord};
use crate::infra::sqlite::schema::open_connection;

fn encode_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(number) => number.to_string(),
        FieldValue::Bool(flag) => String::from(if *flag { "1" } else { "0" }),
    }
}

fn decode_value(kind: &str, raw: String) -> Result<FieldValue> {
    match kind {
        "text" => Ok(FieldValue::Text(raw)),
        "number" => raw
            .parse::<f64>()
            .map(FieldValue::Number)
            .with_context(|| format!("invalid stored number: {raw}")),
        "bool" => Ok(FieldValue::Bool(raw == "1")),
        other => anyhow::bail!("unknown stored field kind: {other}"),
    }
}

fn insert_fields(tx: &rusqlite::Transaction<'_>, user: &UserRecord) -> Result<()> {
    let mut insert_field = tx
        .prepare_cached(
            "INSERT INTO user_field(user_key, field, kind, value) VALUES (?1, ?2, ?3, ?4)",
        )
        .context("failed to prepare field insert")?;

    for (field, value) in &user.fields {
        insert_field
            .execute(params![user.key, field, value.kind(), encode_value(value)])
            .with_context(|| format!("failed to insert field {field} for user {}", user.key))?;
    }

    Ok(())
}

pub fn list_users(db_path: &Path) -> Result<Vec<UserRecord>> {
    let conn = open_connection(db_path)?;

    let mut users_stmt = conn
        .prepare("SELECT key FROM directory_user ORDER BY position ASC")
        .context("failed to prepare users query")?;
    let mut users = users_stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("failed to query users")?
        .map(|key| key.map(UserRecord::new))
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect users")?;
    drop(users_stmt);

    let user_pos: HashMap<String, usize> = users
        .iter()
        .enumerate()
        .map(|(idx, user)| (user.key.clone(), idx))
        .collect();

    let mut fields_stmt = conn
        .prepare("SELECT user_key, field, kind, value FROM user_field")
        .context("failed to prepare fields query")?;
    let mut field_rows = fields_stmt
        .query([])
        .context("failed to run fields query")?;

    while let Some(row) = field_rows.next().context("failed to read field row")? {
        let user_key: String = row.get(0).context("failed to read user_key")?;
        let field: String = row.get(1).context("failed to read field")?;
        let kind: String = row.get(2).context("failed to read kind")?;
        let raw: String = row.get(3).context("failed to read value")?;

        if let Some(user) = user_pos.get(&user_key).and_then(|&idx| users.get_mut(idx)) {
            user.fields.insert(field, decode_value(&kind, raw)?);
        }
    }

    Ok(users)
}

pub fn upsert_users(db_path: &Path, users: &[UserRecord]) -> Result<usize> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start upsert transaction")?;

    let mut next_position: i64 = tx
        .query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM directory_user",
            [],
            |row| row.get(0),
        )
        .context("failed to read next user position")?;

    for user in users {
        let existing: Option<i64> = tx
            .query_row(
                "SELECT position FROM directory_user WHERE key = ?1",
                [&user.key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to look up user {}", user.key))?;

        if existing.is_some() {
            tx.execute("DELETE FROM user_field WHERE user_key = ?1", [&user.key])
                .with_context(|| format!("failed to clear fields for user {}", user.key))?;
        } else {
            tx.execute(
                "INSERT INTO directory_user(key, position) VALUES (?1, ?2)",
                params![user.key, next_position],
            )
            .with_context(|| format!("failed to insert user {}", user.key))?;
            next_position += 1;
        }

        insert_fields(&tx, user)?;
    }

    tx.commit().context("failed to commit upsert transaction")?;
    Ok(users.len())
}

pub fn replace_users(db_path: &Path, users: &[UserRecord]) -> Result<usize> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start replace transaction")?;

    tx.execute("DELETE FROM user_field", [])
        .context("failed to clear user fields")?;
    tx.execute("DELETE FROM directory_user", [])
        .context("failed to clear users")?;

    for (position, user) in users.iter().enumerate() {
        tx.execute(
            "INSERT INTO directory_user(key, position) VALUES (?1, ?2)",
            params![user.key, position as i64],
        )
        .with_context(|| format!("failed to insert user {}", user.key))?;
        insert_fields(&tx, user)?;
    }

    tx.commit().context("failed to commit replace transaction")?;
    Ok(users.len())
}

pub fn remove_user(db_path: &Path, key: &str) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute("DELETE FROM directory_user WHERE key = ?1", [key])
        .with_context(|| format!("failed to remove user {key}"))?;
    Ok(())
}

pub fn upsert_column_visibility(db_path: &Path, visibility: &BTreeMap<String, bool>) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start column visibility transaction")?;

    tx.execute("DELETE FROM column_visibility", [])
        .context("failed to clear existing column visibility")?;

    let mut insert_stmt = tx
        .prepare("INSERT INTO column_visibility(column_key, visible) VALUES (?1, ?2)")
        .context("failed to prepare column visibility insert")?;

    for (column_key, visible) in visibility {
        insert_stmt
            .execute(params![column_key, i64::from(*visible)])
            .context("failed to insert column visibility")?;
    }

    drop(insert_stmt);
    tx.commit()
        .context("failed to commit column visibility updates")?;
    Ok(())
}

pub fn load_column_visibility(db_path: &Path) -> Result<BTreeMap<String, bool>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare("SELECT column_key, visible FROM column_visibility")
        .context("failed to prepare column visibility query")?;

    let visibility_iter = stmt
        .query_map([], |row| {
            let column_key: String = row.get(0)?;
            let visible: i64 = row.get(1)?;
            Ok((column_key, visible != 0))
        })
        .context("failed to query column visibility")?;

    let mut visibility = BTreeMap::new();
    for item in visibility_iter {
        let (column_key, visible) = item.context("failed to read column visibility row")?;
        visibility.insert(column_key, visible);
    }

    Ok(visibility)
}
