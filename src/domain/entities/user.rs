use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const FIELD_KEY: &str = "key";
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PHONE: &str = "phone";
pub const FIELD_MATRIC_NUMBER: &str = "matricNumber";
pub const FIELD_DEPARTMENT: &str = "department";
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_VERIFICATION: &str = "verification";
pub const FIELD_ROLE: &str = "role";
pub const FIELD_JOINED: &str = "joined";
pub const FIELD_LAST_ACTIVE: &str = "lastActive";

pub const STATUS_ACTIVE: &str = "Active";
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_DEFAULT: &str = "User";
pub const VERIFIED_LABEL: &str = "Verified";
pub const UNVERIFIED_LABEL: &str = "Unverified";

/// Placeholder the account mapper writes for missing profile details.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Bool(_) => "bool",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One row of the admin user directory.
///
/// The key is held apart from the other fields so every record has one. Both
/// `key` and `id` resolve to it when a field is looked up by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub key: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl UserRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Builds a record from loose fields, taking the key from `key` or `id`.
    pub fn from_fields(mut fields: BTreeMap<String, FieldValue>) -> Option<Self> {
        let key = [FIELD_KEY, FIELD_ID]
            .iter()
            .find_map(|name| fields.get(*name).map(display_raw))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())?;
        fields.remove(FIELD_KEY);
        fields.remove(FIELD_ID);
        Some(Self { key, fields })
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn role(&self) -> String {
        display_value(self, FIELD_ROLE).unwrap_or_else(|| ROLE_DEFAULT.to_string())
    }

    pub fn is_active(&self) -> bool {
        self.text(FIELD_STATUS) == Some(STATUS_ACTIVE)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == ROLE_ADMIN
    }

    pub fn is_verified(&self) -> bool {
        match self.fields.get(FIELD_VERIFICATION) {
            Some(FieldValue::Bool(flag)) => *flag,
            Some(FieldValue::Text(text)) => text.trim().eq_ignore_ascii_case("verified"),
            _ => false,
        }
    }

    /// Every searchable value: the key, then each present field through the formatter.
    pub fn search_values(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.key.clone()).chain(
            self.fields
                .keys()
                .filter_map(move |field| display_value(self, field)),
        )
    }
}

pub fn is_date_field(field: &str) -> bool {
    field == FIELD_JOINED || field == FIELD_LAST_ACTIVE
}

/// String form of `field` on `record`, `None` when the field is absent.
pub fn display_value(record: &UserRecord, field: &str) -> Option<String> {
    if field == FIELD_KEY || field == FIELD_ID {
        return Some(record.key.clone());
    }

    let value = record.fields.get(field);
    match field {
        FIELD_VERIFICATION => value.map(|_| {
            if record.is_verified() {
                VERIFIED_LABEL.to_string()
            } else {
                UNVERIFIED_LABEL.to_string()
            }
        }),
        FIELD_ROLE => Some(
            value
                .map(display_raw)
                .filter(|role| !role.trim().is_empty())
                .unwrap_or_else(|| ROLE_DEFAULT.to_string()),
        ),
        _ if is_date_field(field) => value.map(|value| match value {
            FieldValue::Number(secs) => format_epoch_seconds(*secs),
            other => display_raw(other),
        }),
        _ => value.map(display_raw),
    }
}

/// Same as [`display_value`] but absent fields read as the empty string.
pub fn stringify(record: &UserRecord, field: &str) -> String {
    display_value(record, field).unwrap_or_default()
}

pub fn display_raw(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Number(number) => format_number(*number),
        FieldValue::Bool(flag) => flag.to_string(),
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn format_epoch_seconds(secs: f64) -> String {
    epoch_to_instant(secs)
        .map(|instant| instant.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| format_number(secs))
}

fn epoch_to_instant(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Parses ISO-8601 text: RFC 3339, a naive date-time read as UTC, or a bare date.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Instant of a date-like value. Numbers are epoch seconds.
pub fn value_instant(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Text(text) => parse_timestamp(text),
        FieldValue::Number(secs) => epoch_to_instant(*secs),
        FieldValue::Bool(_) => None,
    }
}

fn is_present_detail(value: Option<&str>) -> bool {
    value
        .map(str::trim)
        .is_some_and(|text| !text.is_empty() && text != NOT_AVAILABLE)
}

pub fn is_profile_complete(record: &UserRecord) -> bool {
    [FIELD_NAME, FIELD_PHONE, FIELD_MATRIC_NUMBER]
        .iter()
        .all(|field| is_present_detail(display_value(record, field).as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fields_prefers_key_over_id() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldValue::from("doc-9"));
        fields.insert("key".to_string(), FieldValue::from(" u-1 "));
        fields.insert("name".to_string(), FieldValue::from("Ada"));

        let record = UserRecord::from_fields(fields).expect("record should have a key");

        assert_eq!(record.key, "u-1");
        assert!(record.get("key").is_none());
        assert!(record.get("id").is_none());
        assert_eq!(record.text("name"), Some("Ada"));
    }

    #[test]
    fn from_fields_rejects_blank_key() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), FieldValue::from("  "));
        assert!(UserRecord::from_fields(fields).is_none());
    }

    #[test]
    fn verification_formats_bool_and_literal() {
        let bool_verified = UserRecord::new("1").with(FIELD_VERIFICATION, true);
        let text_verified = UserRecord::new("2").with(FIELD_VERIFICATION, "verified");
        let pending = UserRecord::new("3").with(FIELD_VERIFICATION, "pending");
        let absent = UserRecord::new("4");

        assert_eq!(stringify(&bool_verified, FIELD_VERIFICATION), "Verified");
        assert_eq!(stringify(&text_verified, FIELD_VERIFICATION), "Verified");
        assert_eq!(stringify(&pending, FIELD_VERIFICATION), "Unverified");
        assert_eq!(stringify(&absent, FIELD_VERIFICATION), "");
    }

    #[test]
    fn role_defaults_to_user() {
        let absent = UserRecord::new("1");
        let blank = UserRecord::new("2").with(FIELD_ROLE, " ");
        let moderator = UserRecord::new("3").with(FIELD_ROLE, "Moderator");

        assert_eq!(absent.role(), "User");
        assert_eq!(blank.role(), "User");
        assert_eq!(moderator.role(), "Moderator");
        assert!(!absent.is_admin());
    }

    #[test]
    fn numbers_and_epoch_dates_stringify() {
        let record = UserRecord::new("1")
            .with(FIELD_LEVEL, 300_i64)
            .with("score", 2.5)
            .with(FIELD_JOINED, 1_700_000_000_i64);

        assert_eq!(stringify(&record, FIELD_LEVEL), "300");
        assert_eq!(stringify(&record, "score"), "2.5");
        assert_eq!(stringify(&record, FIELD_JOINED), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn parse_timestamp_accepts_iso_variants() {
        let rfc = parse_timestamp("2024-03-01T08:00:00.000+00:00").expect("rfc3339 should parse");
        let naive = parse_timestamp("2024-03-01T08:00:00").expect("naive should parse");
        let date = parse_timestamp("2024-03-01").expect("date should parse");

        assert_eq!(rfc, naive);
        assert!(date < naive);
        assert!(parse_timestamp("Level 9").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn profile_completion_requires_name_phone_and_matric() {
        let complete = UserRecord::new("1")
            .with(FIELD_NAME, "Ada")
            .with(FIELD_PHONE, "0800")
            .with(FIELD_MATRIC_NUMBER, "CSC/19/001");
        let placeholder = complete.clone().with(FIELD_PHONE, NOT_AVAILABLE);
        let missing = UserRecord::new("2").with(FIELD_NAME, "Bo");

        assert!(is_profile_complete(&complete));
        assert!(!is_profile_complete(&placeholder));
        assert!(!is_profile_complete(&missing));
    }
}
