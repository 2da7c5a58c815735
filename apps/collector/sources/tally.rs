use crate::{api_client::ApiClient, merger::FieldMapping};
use serde_json::{Value, json};
use tracing::info;

pub const PROVIDER: &str = "tally";
pub const GRAPHQL_ENDPOINT: &str = "https://api.tally.xyz/query";

const PAGE_LIMIT: usize = 1000;

const PROPOSALS_QUERY: &str = r#"
query Proposals($pagination: Pagination) {
  proposals(pagination: $pagination) {
    nodes {
      id
      title
      description
      createdAt
      state
      proposer {
        address
      }
      governor {
        slug
      }
    }
  }
}"#;

pub fn field_mapping() -> FieldMapping {
    FieldMapping {
        source_id: &["id"],
        organization: &["governor.slug"],
        title: &["title"],
        body: &["description"],
        author: &["proposer.address"],
        created_at: &["createdAt"],
        state: &["state"],
        link: &["link"],
    }
}

pub async fn fetch_proposals(api: &ApiClient, endpoint: &str) -> Vec<Value> {
    let variables = json!({ "pagination": { "limit": PAGE_LIMIT, "offset": 0 } });

    let response: Option<Value> = api
        .post_graphql(PROVIDER, endpoint, PROPOSALS_QUERY, variables)
        .await;
    let proposals = response
        .and_then(|body| {
            body.pointer("/data/proposals/nodes")
                .and_then(Value::as_array)
                .cloned()
        })
        .unwrap_or_default();

    info!(total = proposals.len(), "Fetched Tally proposals");
    proposals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::ProviderPacing;
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

    #[tokio::test]
    async fn extracts_proposal_nodes_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(
                json!({
                    "data": {
                        "proposals": {
                            "nodes": [
                                { "id": "1", "title": "First" },
                                { "id": "2", "title": "Second" }
                            ]
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let url = format!("{}/query", server.url());
        let records = fetch_proposals(&client(), &url).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "1");
        assert_eq!(records[1]["id"], "2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_nodes_yield_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(json!({ "errors": [{ "message": "unauthorized" }] }).to_string())
            .create_async()
            .await;

        let url = format!("{}/query", server.url());
        assert!(fetch_proposals(&client(), &url).await.is_empty());
    }
}
