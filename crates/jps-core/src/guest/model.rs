//! Persisted guest report records.
//!
//! Two layouts exist under the history key:
//! - current records: full [`GuestReport`]s, always carrying a `data` field
//!   (possibly `null`) and, since version 2, `schemaVersion`
//! - legacy records: summary-only objects (`id`, `timestamp`, title/company,
//!   score) written by older clients
//!
//! [`StoredHistory::decode`] tells them apart once per read.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Schema version stamped on every record written by this crate
pub const SCHEMA_VERSION: u32 = 2;

/// One cached report with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestReport {
    pub id: String,
    /// Epoch milliseconds at which the record was written
    pub timestamp: i64,
    /// Full report document; `None` for records upgraded from the legacy layout
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        rename = "overallScore",
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_score: Option<Number>,
    #[serde(rename = "shortUrl", default, skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(rename = "schemaVersion", default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
}

impl GuestReport {
    /// Wrap a report document, picking the listed metadata out of it
    ///
    /// `report` is opaque apart from `job_title`, `company_name`, `job_url`,
    /// `overallScore` and `total_score`.
    pub fn from_document(
        id: impl Into<String>,
        report: &Value,
        timestamp: i64,
        short_url: &str,
    ) -> Self {
        let overall_score = number_field(report, "overallScore")
            .or_else(|| number_field(report, "total_score"));

        Self {
            id: id.into(),
            timestamp,
            data: Some(report.clone()),
            job_title: string_field(report, "job_title"),
            company_name: string_field(report, "company_name"),
            url: string_field(report, "job_url"),
            overall_score,
            short_url: Some(short_url.to_string()),
            schema_version: Some(SCHEMA_VERSION),
        }
    }

    /// True for placeholders upgraded from the summary-only layout
    pub fn is_legacy(&self) -> bool {
        self.data.is_none()
    }

    pub fn summary(&self) -> GuestReportSummary {
        GuestReportSummary {
            id: self.id.clone(),
            timestamp: self.timestamp,
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            url: self.url.clone(),
            overall_score: self.overall_score.clone(),
            short_url: self.short_url.clone(),
        }
    }

    /// Minimal stand-in document for a legacy placeholder
    pub fn reconstructed_document(&self) -> Value {
        let score = self
            .overall_score
            .clone()
            .map(Value::Number)
            .unwrap_or(Value::Null);

        serde_json::json!({
            "id": self.id,
            "job_title": self.job_title,
            "company_name": self.company_name,
            "overallScore": score,
            "total_score": score,
            "_reconstructed": true,
            "_legacy": true,
        })
    }
}

/// History listing entry: a [`GuestReport`] without its document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestReportSummary {
    pub id: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "overallScore", default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<Number>,
    #[serde(rename = "shortUrl", default, skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}

/// Summary-only history entry written by older clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacySummary {
    #[serde(default)]
    pub id: Value,
    /// Missing or non-numeric timestamps are read as 0 and therefore expire
    /// on the next read
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(rename = "overallScore", default, deserialize_with = "lenient_number")]
    pub overall_score: Option<Number>,
    #[serde(rename = "shortUrl", default)]
    pub short_url: Option<String>,
}

impl LegacySummary {
    /// Full-layout placeholder with no document
    pub fn upgrade(self, generic_path: &str) -> GuestReport {
        GuestReport {
            id: id_to_string(&self.id).unwrap_or_default(),
            timestamp: self.timestamp,
            data: None,
            job_title: self.job_title,
            company_name: self.company_name,
            url: self.url.or(self.job_url),
            overall_score: self.overall_score,
            short_url: Some(
                self.short_url
                    .unwrap_or_else(|| generic_path.to_string()),
            ),
            schema_version: Some(SCHEMA_VERSION),
        }
    }
}

/// Decoded contents of the history key
#[derive(Debug, Clone, PartialEq)]
pub enum StoredHistory {
    /// Current layout; `skipped` counts elements that failed to decode
    Full {
        entries: Vec<GuestReport>,
        skipped: usize,
    },
    /// Summary-only layout; `skipped` counts elements that failed to decode
    Legacy {
        summaries: Vec<LegacySummary>,
        skipped: usize,
    },
    /// Neither layout (not JSON, not an array of objects)
    Unrecognised,
}

impl StoredHistory {
    /// Classify and decode raw history text
    ///
    /// The layout is decided by the first element: a `data` or
    /// `schemaVersion` field means the current layout, any other object means
    /// legacy.
    pub fn decode(raw: &str) -> Self {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
            return StoredHistory::Unrecognised;
        };

        let Some(first) = items.first() else {
            return StoredHistory::Full {
                entries: Vec::new(),
                skipped: 0,
            };
        };
        let Some(first) = first.as_object() else {
            return StoredHistory::Unrecognised;
        };

        if first.contains_key("data") || first.contains_key("schemaVersion") {
            let (entries, skipped) = decode_each(items);
            StoredHistory::Full { entries, skipped }
        } else {
            let (summaries, skipped) = decode_each(items);
            StoredHistory::Legacy { summaries, skipped }
        }
    }
}

/// Element-wise decode; returns the decodable elements and how many were not
fn decode_each<T: serde::de::DeserializeOwned>(items: Vec<Value>) -> (Vec<T>, usize) {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let skipped = total - decoded.len();
    (decoded, skipped)
}

/// Report id from a document: `id`, then `report_id`
///
/// Strings and numbers are accepted; empty strings and zero count as absent.
pub fn document_id(report: &Value) -> Option<String> {
    report
        .get("id")
        .and_then(id_to_string)
        .or_else(|| report.get("report_id").and_then(id_to_string))
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(report: &Value, field: &str) -> Option<String> {
    report
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_field(report: &Value, field: &str) -> Option<Number> {
    report.get(field).and_then(as_number)
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<Number>().ok(),
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(as_number)
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)))
        .unwrap_or(0))
}

/// Numbers or numeric strings; anything else reads as absent
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_number))
}
