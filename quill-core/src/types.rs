//! Domain types for the metadata sidecar and the per-render context.

use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::MetadataError;

/// `Monday, January 01, 2024`
pub const DATE_FORMAT: &str = "%A, %B %d, %Y";
/// `Monday, January 01, 2024 at 09:30 AM`
pub const DATETIME_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

/// Keys computed on every render. Entry fields with these names are shadowed.
pub const RESERVED_KEYS: &[&str] = &["name", "created", "date", "modified", "rendered"];

// ---------------------------------------------------------------------------
// MetadataEntry
// ---------------------------------------------------------------------------

/// One persisted sidecar entry, keyed by file base name.
///
/// Only `created` is interpreted; any other keys are carried through untouched
/// and exposed to the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Estimated creation time, epoch seconds. Falsy JSON reads as `None`.
    #[serde(
        default,
        deserialize_with = "deserialize_created",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MetadataEntry {
    /// Entry with only `created` set.
    pub fn with_created(created: i64) -> Self {
        Self {
            created: Some(created),
            extra: Map::new(),
        }
    }

    /// `created` is present and non-zero.
    pub fn has_created(&self) -> bool {
        matches!(self.created, Some(t) if t != 0)
    }
}

/// Interpret a stored `created` value.
///
/// `null`, `false`, `0`, `0.0`, `""`, `[]` and `{}` mean "not yet known".
/// Other numbers are epoch seconds, truncated toward zero. Anything else is
/// rejected so a hand-edited entry is never silently replaced.
pub fn created_seconds(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::Array(a) if a.is_empty() => Ok(None),
        Value::Object(o) if o.is_empty() => Ok(None),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return Ok((secs != 0).then_some(secs));
            }
            match n.as_f64() {
                Some(f) if f == 0.0 => Ok(None),
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.trunc() as i64)),
                _ => Err(format!("creation time {n} is out of range")),
            }
        }
        other => Err(format!("expected epoch seconds for `created`, found {other}")),
    }
}

fn deserialize_created<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    created_seconds(&value).map_err(de::Error::custom)
}

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Values exposed to a template, derived fresh for every render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    /// Source base name without extension.
    pub name: String,
    /// Creation datetime, display form.
    pub created: String,
    /// Creation date, display form.
    pub date: String,
    /// Source mtime, display form.
    pub modified: String,
    /// Time of this render, display form.
    pub rendered: String,
    /// Non-reserved keys copied from the sidecar entry.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RenderContext {
    /// Build the context for `entry`, whose `created` must already be set.
    pub fn build(
        name: impl Into<String>,
        entry: &MetadataEntry,
        modified: SystemTime,
        now: DateTime<Local>,
    ) -> Result<Self, MetadataError> {
        let epoch = entry.created.unwrap_or_default();
        let created = local_from_epoch(epoch).ok_or(MetadataError::Timestamp(epoch))?;
        let modified: DateTime<Local> = modified.into();

        let extra = entry
            .extra
            .iter()
            .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(RenderContext {
            name: name.into(),
            created: format_datetime(&created),
            date: format_date(&created),
            modified: format_datetime(&modified),
            rendered: format_datetime(&now),
            extra,
        })
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Epoch seconds to local time; `None` when out of chrono's range.
pub fn local_from_epoch(secs: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp(secs, 0).map(|utc| utc.with_timezone(&Local))
}

pub fn format_datetime(dt: &DateTime<Local>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn format_date(dt: &DateTime<Local>) -> String {
    dt.format(DATE_FORMAT).to_string()
}
