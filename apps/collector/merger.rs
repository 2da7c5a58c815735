//! Normalizes raw provider records into the canonical `Proposal` shape and
//! drops duplicates across sources. Providers disagree on key naming and
//! casing, so every source carries an ordered candidate-key mapping; the
//! first present key wins. Raw shapes never leave this boundary.

use crate::models::proposal::Proposal;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordered candidate keys for each canonical field. Dotted paths reach into
/// nested objects ("space.id", "proposer.address").
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldMapping {
    pub source_id: &'static [&'static str],
    pub organization: &'static [&'static str],
    pub title: &'static [&'static str],
    pub body: &'static [&'static str],
    pub author: &'static [&'static str],
    pub created_at: &'static [&'static str],
    pub state: &'static [&'static str],
    pub link: &'static [&'static str],
}

/// One source's worth of raw records, labeled with its provider and the
/// organization the fetch was issued for (used when records carry no
/// organization field of their own).
pub struct SourceBatch {
    pub provider: &'static str,
    pub organization: String,
    pub mapping: FieldMapping,
    pub records: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct MergeStats {
    pub kept: usize,
    pub dropped_by_source: HashMap<String, usize>,
}

impl MergeStats {
    pub fn dropped_total(&self) -> usize {
        self.dropped_by_source.values().sum()
    }
}

/// Merges batches in caller order. A record is dropped when its id or its
/// `(organization, truncated-title)` signature was already seen; the
/// first-seen source wins, conflicting fields are never merged.
pub fn merge(batches: Vec<SourceBatch>) -> (Vec<Proposal>, MergeStats) {
    let mut proposals = Vec::new();
    let mut stats = MergeStats::default();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_signatures: HashSet<(String, String)> = HashSet::new();

    for batch in batches {
        for record in &batch.records {
            let proposal =
                normalize_record(batch.provider, &batch.organization, &batch.mapping, record);

            let signature = proposal.signature();
            let duplicate_id =
                !proposal.source_id.is_empty() && seen_ids.contains(&proposal.source_id);
            let duplicate_signature = seen_signatures.contains(&signature);

            if duplicate_id || duplicate_signature {
                debug!(
                    provider = batch.provider,
                    id = proposal.source_id,
                    "Dropping duplicate record"
                );
                *stats
                    .dropped_by_source
                    .entry(batch.provider.to_string())
                    .or_default() += 1;
                continue;
            }

            if !proposal.source_id.is_empty() {
                seen_ids.insert(proposal.source_id.clone());
            }
            seen_signatures.insert(signature);
            stats.kept += 1;
            proposals.push(proposal);
        }
    }

    (proposals, stats)
}

pub fn normalize_record(
    provider: &str,
    organization_fallback: &str,
    mapping: &FieldMapping,
    record: &Value,
) -> Proposal {
    let mut consumed: HashSet<&str> = HashSet::new();

    let mut field = |candidates: &'static [&'static str]| -> String {
        for candidate in candidates {
            if let Some(value) = lookup(record, candidate) {
                let text = value_as_string(value);
                if !text.is_empty() {
                    // Only top-level keys move out of `extra`.
                    if !candidate.contains('.') {
                        consumed.insert(candidate);
                    }
                    return text;
                }
            }
        }
        String::new()
    };

    let source_id = field(mapping.source_id);
    let mut organization = field(mapping.organization);
    let title = field(mapping.title);
    let body = field(mapping.body);
    let author = field(mapping.author);
    let created_at = field(mapping.created_at);
    let state = field(mapping.state);
    let link = field(mapping.link);

    if organization.is_empty() {
        organization = organization_fallback.to_string();
    }

    let extra: Map<String, Value> = match record {
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !consumed.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => Map::new(),
    };

    Proposal {
        source_id,
        organization,
        title,
        body,
        author,
        created_at,
        state,
        link,
        provider: provider.to_string(),
        extra,
    }
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}
