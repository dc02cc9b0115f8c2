use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{RepoError, RepoResult};
use crate::model::{date_value, instant_value};
use crate::store::Fields;

/// ===============================
/// What a caller-supplied patch may touch
/// ===============================
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchRules<'a> {
    /// Fields only named operations may change.
    pub protected: &'a [&'a str],
    /// Fields stored as epoch milliseconds; accept `YYYY-MM-DD` or
    /// RFC 3339 / `YYYY-MM-DDTHH:MM:SS` strings for them.
    pub timestamps: &'a [&'a str],
}

/// ===============================
/// Build a partial update from a JSON object
/// ===============================
pub fn build_patch(payload: &Value, rules: PatchRules<'_>) -> RepoResult<Fields> {
    let obj = payload
        .as_object()
        .ok_or_else(|| RepoError::Validation("payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(RepoError::Validation("no fields provided for update".into()));
    }

    let mut fields = Fields::with_capacity(obj.len());

    for (key, value) in obj {
        if key == "id" || rules.protected.contains(&key.as_str()) {
            return Err(RepoError::Validation(format!(
                "field `{key}` cannot be changed through a patch"
            )));
        }

        let value = match value {
            Value::String(s) if rules.timestamps.contains(&key.as_str()) => {
                Value::from(parse_timestamp(key, s)?)
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(RepoError::Validation(format!(
                    "field `{key}` has an unsupported nested value"
                )));
            }
            other => other.clone(),
        };
        fields.insert(key.clone(), value);
    }

    Ok(fields)
}

fn parse_timestamp(key: &str, raw: &str) -> RepoResult<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date_value(date));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant_value(at.with_timezone(&Utc)));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(instant_value(at.and_utc()));
    }
    Err(RepoError::Validation(format!(
        "field `{key}` expects a date, got {raw:?}"
    )))
}
