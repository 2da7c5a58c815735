use crate::{api_client::ApiClient, models::price::PricePoint};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const PROVIDER: &str = "coingecko";

/// Daily (or denser) series from `market_chart/range`. The response carries
/// parallel `prices`, `total_volumes`, and `market_caps` arrays of
/// `[timestamp_ms, value]` pairs.
pub async fn fetch_range(
    api: &ApiClient,
    base_url: &str,
    coingecko_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PricePoint> {
    let url = format!("{base_url}/coins/{coingecko_id}/market_chart/range");
    let query = [
        ("vs_currency", "usd".to_string()),
        ("from", start.timestamp().to_string()),
        ("to", end.timestamp().to_string()),
    ];

    match api.get_json::<Value>(PROVIDER, &url, &query).await {
        Some(body) => parse_market_chart(&body),
        None => vec![],
    }
}

pub fn parse_market_chart(body: &Value) -> Vec<PricePoint> {
    let prices = match body.get("prices").and_then(Value::as_array) {
        Some(prices) => prices,
        None => return vec![],
    };
    let volumes = body
        .get("total_volumes")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let market_caps = body
        .get("market_caps")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut points = Vec::with_capacity(prices.len());
    for (index, pair) in prices.iter().enumerate() {
        let (timestamp, price_usd) = match parse_pair(pair) {
            Some(parsed) => parsed,
            None => continue,
        };
        let volume_usd = volumes
            .get(index)
            .and_then(parse_pair)
            .map(|(_, value)| value)
            .unwrap_or(0.0);
        let market_cap_usd = market_caps
            .get(index)
            .and_then(parse_pair)
            .map(|(_, value)| value);

        points.push(PricePoint {
            timestamp,
            price_usd,
            volume_usd,
            market_cap_usd,
            source: PROVIDER.to_string(),
        });
    }

    points.sort_by_key(|point| point.timestamp);
    points
}

fn parse_pair(pair: &Value) -> Option<(i64, f64)> {
    let pair = pair.as_array()?;
    Some((pair.first()?.as_i64()?, pair.get(1)?.as_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_market_chart_shape() {
        let body = json!({
            "prices": [[1694649600000i64, 8.21], [1694736000000i64, 8.40]],
            "total_volumes": [[1694649600000i64, 1_000_000.0], [1694736000000i64, 1_200_000.0]],
            "market_caps": [[1694649600000i64, 210_000_000.0], [1694736000000i64, 215_000_000.0]]
        });
        let points = parse_market_chart(&body);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, 1694649600000);
        assert_eq!(points[0].price_usd, 8.21);
        assert_eq!(points[0].volume_usd, 1_000_000.0);
        assert_eq!(points[0].market_cap_usd, Some(210_000_000.0));
        assert_eq!(points[0].source, PROVIDER);
    }

    #[test]
    fn missing_top_level_key_yields_empty() {
        let body = json!({"error": "rate limit"});
        assert!(parse_market_chart(&body).is_empty());
    }

    #[test]
    fn tolerates_short_volume_array() {
        let body = json!({
            "prices": [[1694649600000i64, 8.21], [1694736000000i64, 8.40]],
            "total_volumes": [[1694649600000i64, 1_000_000.0]]
        });
        let points = parse_market_chart(&body);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].volume_usd, 0.0);
        assert_eq!(points[1].market_cap_usd, None);
    }
}
