use crate::{api_client::ApiClient, merger::FieldMapping};
use serde_json::Value;
use tracing::info;

pub const PROVIDER: &str = "discourse";

const MAX_PAGES: usize = 100;

pub fn field_mapping() -> FieldMapping {
    FieldMapping {
        source_id: &["id"],
        organization: &[],
        title: &["title"],
        body: &["excerpt"],
        author: &["last_poster_username"],
        created_at: &["created_at"],
        state: &["state"],
        link: &["slug"],
    }
}

/// Walks a forum's topic pages oldest-first. Discourse repeats the final
/// page when asked past the end, so the walk stops as soon as a page opens
/// with an already-seen topic.
pub async fn fetch_topics(api: &ApiClient, base_url: &str) -> Vec<Value> {
    let mut topics = Vec::new();
    let mut previous_first_id: Option<i64> = None;

    for page in 0..MAX_PAGES {
        let url = format!("{base_url}/latest.json");
        let query = [
            ("order", "created".to_string()),
            ("ascending", "true".to_string()),
            ("page", page.to_string()),
        ];

        let response: Option<Value> = api.get_json(PROVIDER, &url, &query).await;
        let batch = response
            .and_then(|body| {
                body.pointer("/topic_list/topics")
                    .and_then(Value::as_array)
                    .cloned()
            })
            .unwrap_or_default();

        if batch.is_empty() {
            break;
        }

        let first_id = batch.first().and_then(|topic| topic.get("id")).and_then(Value::as_i64);
        if first_id.is_some() && first_id == previous_first_id {
            break;
        }
        previous_first_id = first_id;

        topics.extend(batch);
    }

    info!(base_url, total = topics.len(), "Fetched Discourse topics");
    topics
}
