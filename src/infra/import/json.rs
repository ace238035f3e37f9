use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::user::{
    FieldValue, UserRecord, FIELD_DEPARTMENT, FIELD_EMAIL, FIELD_JOINED, FIELD_LAST_ACTIVE,
    FIELD_LEVEL, FIELD_MATRIC_NUMBER, FIELD_NAME, FIELD_PHONE, FIELD_ROLE, FIELD_STATUS,
    FIELD_VERIFICATION, NOT_AVAILABLE, ROLE_ADMIN, ROLE_DEFAULT, UNVERIFIED_LABEL,
    VERIFIED_LABEL,
};
use crate::infra::import::rows::ensure_unique_keys;

/// One page of `GET /api/admin/users`.
#[derive(Debug, Deserialize)]
struct DirectoryPage {
    users: Vec<Value>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    page: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectoryPayload {
    Page(DirectoryPage),
    Bare(Vec<Value>),
}

/// A raw account as listed by the hosted auth provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub email_verification: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub accessed_at: Option<String>,
    #[serde(default, alias = "$updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default, alias = "$createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub prefs: AccountPrefs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPrefs {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub matric_number: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

pub fn account_to_user(account: Account) -> UserRecord {
    let Account {
        id,
        name,
        email,
        phone,
        status,
        email_verification,
        labels,
        accessed_at,
        updated_at,
        created_at,
        prefs,
    } = account;

    let is_admin = labels.iter().any(|label| label == "admin");
    let mut user = UserRecord::new(id)
        .with(FIELD_NAME, non_empty(name).unwrap_or_else(|| "No Name".to_string()))
        .with(FIELD_PHONE, non_empty(phone).unwrap_or_else(|| NOT_AVAILABLE.to_string()))
        .with(FIELD_STATUS, if status { "Active" } else { "Inactive" })
        .with(
            FIELD_VERIFICATION,
            if email_verification {
                VERIFIED_LABEL
            } else {
                UNVERIFIED_LABEL
            },
        )
        .with(FIELD_ROLE, if is_admin { ROLE_ADMIN } else { ROLE_DEFAULT })
        .with(
            "labels",
            if labels.is_empty() {
                "None".to_string()
            } else {
                labels.join(", ")
            },
        )
        .with(
            FIELD_DEPARTMENT,
            non_empty(prefs.department).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        )
        .with(
            FIELD_LEVEL,
            non_empty(prefs.level).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        )
        .with(
            FIELD_MATRIC_NUMBER,
            non_empty(prefs.matric_number).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        )
        .with(
            "profileCompleted",
            if prefs.profile_completed { "Yes" } else { "No" },
        );

    if let Some(email) = non_empty(email) {
        user.set(FIELD_EMAIL, email);
    }
    let created_at = non_empty(created_at);
    let last_active = non_empty(accessed_at)
        .or_else(|| non_empty(updated_at))
        .or_else(|| created_at.clone());
    if let Some(last_active) = last_active {
        user.set(FIELD_LAST_ACTIVE, last_active);
    }
    if let Some(joined) = created_at {
        user.set(FIELD_JOINED, joined);
    }
    user
}

fn json_to_value(value: Value) -> Option<FieldValue> {
    match value {
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(FieldValue::Text(text)),
        Value::Number(number) => number.as_f64().map(FieldValue::Number),
        Value::Bool(flag) => Some(FieldValue::Bool(flag)),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    Value::Number(number) => Some(number.to_string()),
                    Value::Bool(flag) => Some(flag.to_string()),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| FieldValue::Text(parts.join(", ")))
        }
        Value::Null | Value::Object(_) => None,
    }
}

fn object_to_user(idx: usize, value: Value) -> Result<UserRecord> {
    let Value::Object(object) = value else {
        anyhow::bail!("record {}: expected an object", idx + 1)
    };

    if !object.contains_key("key") && !object.contains_key("id") && object.contains_key("$id") {
        let account: Account = serde_json::from_value(Value::Object(object))
            .with_context(|| format!("record {}: invalid account", idx + 1))?;
        return Ok(account_to_user(account));
    }

    let fields: BTreeMap<String, FieldValue> = object
        .into_iter()
        .filter_map(|(field, value)| json_to_value(value).map(|value| (field, value)))
        .collect();
    UserRecord::from_fields(fields)
        .with_context(|| format!("record {}: key is required", idx + 1))
}

pub fn parse_directory_json(text: &str) -> Result<Vec<UserRecord>> {
    let payload: DirectoryPayload =
        serde_json::from_str(text).context("failed to parse directory payload")?;

    let values = match payload {
        DirectoryPayload::Page(page) => {
            tracing::debug!(
                received = page.users.len(),
                total = ?page.total,
                page = ?page.page,
                limit = ?page.limit,
                "read directory page"
            );
            page.users
        }
        DirectoryPayload::Bare(values) => values,
    };

    let users = values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| object_to_user(idx, value))
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_keys(&users)?;
    Ok(users)
}

pub fn read_json_directory(json_path: &Path) -> Result<Vec<UserRecord>> {
    let text = std::fs::read_to_string(json_path)
        .with_context(|| format!("failed to read json: {}", json_path.display()))?;
    parse_directory_json(&text)
        .with_context(|| format!("failed to import directory: {}", json_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::{is_profile_complete, stringify};

    #[test]
    fn parses_directory_page() {
        let text = r#"{
            "users": [
                {"key": "u1", "$id": "u1", "name": "Tony", "role": "Admin", "status": "Active",
                 "verification": "Verified", "joined": "2024-01-01T00:00:00.000+00:00"},
                {"key": "u2", "name": "Zoey", "phone": "", "level": 200, "tags": ["a", "b"], "prefs": {}}
            ],
            "total": 2, "page": 1, "limit": 50
        }"#;

        let users = parse_directory_json(text).expect("payload should parse");

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].key, "u1");
        assert_eq!(users[0].text("$id"), Some("u1"));
        assert!(users[0].is_admin());
        assert!(users[0].is_verified());
        assert!(users[1].get("phone").is_none(), "blank strings should be absent");
        assert!(users[1].get("prefs").is_none(), "nested objects should be dropped");
        assert_eq!(stringify(&users[1], "level"), "200");
        assert_eq!(users[1].text("tags"), Some("a, b"));
    }

    #[test]
    fn parses_bare_array_with_id_keys() {
        let users = parse_directory_json(r#"[{"id": 7, "name": "Kemi"}]"#)
            .expect("payload should parse");
        assert_eq!(users[0].key, "7");
    }

    #[test]
    fn maps_raw_accounts() {
        let text = r#"[{
            "$id": "acc-1",
            "name": "",
            "email": "musa@uni.edu",
            "status": true,
            "emailVerification": false,
            "labels": ["admin", "staff"],
            "$createdAt": "2024-01-01T00:00:00.000+00:00",
            "$updatedAt": "2024-02-01T00:00:00.000+00:00",
            "accessedAt": "",
            "prefs": {"department": "Physics", "matricNumber": "PHY/20/004", "profileCompleted": true}
        }]"#;

        let users = parse_directory_json(text).expect("payload should parse");
        let user = &users[0];

        assert_eq!(user.key, "acc-1");
        assert_eq!(user.text("name"), Some("No Name"));
        assert_eq!(user.text("phone"), Some("N/A"));
        assert_eq!(user.text("email"), Some("musa@uni.edu"));
        assert_eq!(user.text("status"), Some("Active"));
        assert_eq!(stringify(user, "verification"), "Unverified");
        assert_eq!(user.role(), "Admin");
        assert_eq!(user.text("labels"), Some("admin, staff"));
        assert_eq!(user.text("department"), Some("Physics"));
        assert_eq!(user.text("level"), Some("N/A"));
        assert_eq!(user.text("profileCompleted"), Some("Yes"));
        assert_eq!(user.text("joined"), Some("2024-01-01T00:00:00.000+00:00"));
        assert_eq!(user.text("lastActive"), Some("2024-02-01T00:00:00.000+00:00"));
        assert!(!is_profile_complete(user));
    }

    #[test]
    fn rejects_duplicate_and_missing_keys() {
        let err = parse_directory_json(r#"[{"key": "a"}, {"key": "a"}]"#)
            .expect_err("duplicate keys should fail");
        assert!(format!("{err:#}").contains("duplicate key"), "unexpected error: {err:#}");

        let err = parse_directory_json(r#"[{"name": "nobody"}]"#)
            .expect_err("missing key should fail");
        assert!(format!("{err:#}").contains("key is required"), "unexpected error: {err:#}");
    }
}
