use crate::{api_client::ApiClient, merger::FieldMapping};
use serde_json::Value;
use tracing::info;

pub const PROVIDER: &str = "boardroom";
pub const API_BASE: &str = "https://api.boardroom.info";

const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 100;

pub fn field_mapping() -> FieldMapping {
    FieldMapping {
        source_id: &["refId", "id"],
        organization: &["protocol"],
        title: &["title", "Title"],
        body: &["content", "summary"],
        author: &["proposer"],
        created_at: &["date", "startTimestamp"],
        state: &["currentState", "state"],
        link: &["externalUrl"],
    }
}

/// Pages a protocol's proposals from the Boardroom REST API until an empty
/// page comes back.
pub async fn fetch_proposals(api: &ApiClient, base_url: &str, cname: &str) -> Vec<Value> {
    let mut proposals = Vec::new();
    let url = format!("{base_url}/v1/protocols/{cname}/proposals");

    for page in 1..=MAX_PAGES {
        let query = [
            ("limit", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];

        let response: Option<Value> = api.get_json(PROVIDER, &url, &query).await;
        let batch = response
            .and_then(|body| body.get("data").and_then(Value::as_array).cloned())
            .unwrap_or_default();

        if batch.is_empty() {
            break;
        }
        let batch_len = batch.len();
        proposals.extend(batch);
        if batch_len < PAGE_SIZE {
            break;
        }
    }

    info!(cname, total = proposals.len(), "Fetched Boardroom proposals");
    proposals
}
