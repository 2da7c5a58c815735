use crate::{api_client::ApiClient, merger::FieldMapping};
use serde_json::{Value, json};
use tracing::info;

pub const PROVIDER: &str = "snapshot";
pub const GRAPHQL_ENDPOINT: &str = "https://hub.snapshot.org/graphql";

const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 50;

const PROPOSALS_QUERY: &str = r#"
query Proposals($space: String!, $skip: Int!, $first: Int!) {
  proposals(
    skip: $skip,
    first: $first,
    orderBy: "created",
    orderDirection: desc,
    where: { space: $space }
  ) {
    id
    title
    body
    author
    created
    state
    link
    space {
      id
    }
  }
}"#;

pub fn field_mapping() -> FieldMapping {
    FieldMapping {
        source_id: &["id"],
        organization: &["space.id"],
        title: &["title"],
        body: &["body"],
        author: &["author"],
        created_at: &["created"],
        state: &["state"],
        link: &["link"],
    }
}

/// Paginates a space's proposals newest-first via skip/first. Callers rely
/// on the descending order for early-exit logic, so pages are appended in
/// fetch order.
pub async fn fetch_proposals(api: &ApiClient, endpoint: &str, space: &str) -> Vec<Value> {
    let mut proposals = Vec::new();

    for page in 0..MAX_PAGES {
        let variables = json!({
            "space": space,
            "skip": page * PAGE_SIZE,
            "first": PAGE_SIZE,
        });

        let response: Option<Value> = api
            .post_graphql(PROVIDER, endpoint, PROPOSALS_QUERY, variables)
            .await;
        let batch = response
            .and_then(|body| {
                body.pointer("/data/proposals")
                    .and_then(Value::as_array)
                    .cloned()
            })
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

    info!(space, total = proposals.len(), "Fetched Snapshot proposals");
    proposals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::ProviderPacing;
    use mockito::Matcher;
    use std::collections::HashMap;

    fn client() -> ApiClient {
        let mut pacing = HashMap::new();
        pacing.insert(
            PROVIDER.to_string(),
            ProviderPacing {
                min_delay_ms: 0,
                max_retries: 0,
                base_backoff_ms: 1,
                rate_limit_backoff_ms: 1,
                timeout_secs: 5,
            },
        );
        ApiClient::new(pacing)
    }

    fn page(ids: std::ops::Range<usize>) -> String {
        let proposals: Vec<Value> = ids
            .map(|i| {
                json!({
                    "id": format!("p{i}"),
                    "title": "t",
                    "space": { "id": "ens.eth" }
                })
            })
            .collect();
        json!({ "data": { "proposals": proposals } }).to_string()
    }

    #[tokio::test]
    async fn paginates_until_a_short_page_preserving_order() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({ "variables": { "skip": 0 } })))
            .with_status(200)
            .with_body(page(0..100))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({ "variables": { "skip": 100 } })))
            .with_status(200)
            .with_body(page(100..101))
            .create_async()
            .await;

        let url = format!("{}/graphql", server.url());
        let records = fetch_proposals(&client(), &url, "ens.eth").await;

        assert_eq!(records.len(), 101);
        assert_eq!(records[0]["id"], "p0");
        assert_eq!(records[99]["id"], "p99");
        assert_eq!(records[100]["id"], "p100");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn failed_fetch_yields_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/graphql", server.url());
        assert!(fetch_proposals(&client(), &url, "ens.eth").await.is_empty());
    }
}
