use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Length of the normalized-title prefix used for fallback identity.
pub const SIGNATURE_TITLE_LEN: usize = 50;

/// One governance item, normalized to a single shape regardless of which
/// provider produced it. Raw provider fields that have no canonical slot are
/// preserved under `extra` for provenance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(rename = "id")]
    pub source_id: String,
    pub organization: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: String,
    /// Kept exactly as ingested: unix seconds, a numeric string, an ISO-8601
    /// string, or empty. Parse on demand with `created_at_utc`.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "source")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Proposal {
    /// Identity within a merged dataset: the provider id when present,
    /// otherwise the `(organization, truncated-normalized-title)` signature.
    pub fn identity(&self) -> String {
        if !self.source_id.is_empty() {
            self.source_id.clone()
        } else {
            let (organization, title) = self.signature();
            format!("{organization}:{title}")
        }
    }

    pub fn signature(&self) -> (String, String) {
        (
            self.organization.to_lowercase(),
            normalized_title_prefix(&self.title),
        )
    }

    /// Best-effort parse of the heterogeneous `created_at` field.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(secs) = raw.parse::<i64>() {
            return DateTime::from_timestamp(secs, 0);
        }
        if let Ok(secs) = raw.parse::<f64>() {
            return DateTime::from_timestamp(secs as i64, 0);
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(parsed.and_utc());
            }
        }
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
        None
    }
}

fn normalized_title_prefix(title: &str) -> String {
    title
        .to_lowercase()
        .trim()
        .chars()
        .take(SIGNATURE_TITLE_LEN)
        .collect()
}
