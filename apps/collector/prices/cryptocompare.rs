use crate::{api_client::ApiClient, models::price::PricePoint};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const PROVIDER: &str = "cryptocompare";

const MAX_DAYS: i64 = 2000;

/// Daily candles from `histoday`. The endpoint pages backwards from `toTs`,
/// so the window start is applied as a filter on the returned candles.
pub async fn fetch_range(
    api: &ApiClient,
    base_url: &str,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PricePoint> {
    let days = (end - start).num_days().clamp(1, MAX_DAYS);
    let url = format!("{base_url}/data/v2/histoday");
    let query = [
        ("fsym", symbol.to_string()),
        ("tsym", "USD".to_string()),
        ("toTs", end.timestamp().to_string()),
        ("limit", days.to_string()),
    ];

    match api.get_json::<Value>(PROVIDER, &url, &query).await {
        Some(body) => parse_histoday(&body, start.timestamp()),
        None => vec![],
    }
}

pub fn parse_histoday(body: &Value, from_secs: i64) -> Vec<PricePoint> {
    let candles = match body.pointer("/Data/Data").and_then(Value::as_array) {
        Some(candles) => candles,
        None => return vec![],
    };

    let mut points: Vec<PricePoint> = candles
        .iter()
        .filter_map(|candle| {
            let time = candle.get("time")?.as_i64()?;
            if time < from_secs {
                return None;
            }
            let close = candle.get("close")?.as_f64()?;
            if close == 0.0 {
                // Candles before the token was listed come back zeroed.
                return None;
            }
            Some(PricePoint {
                timestamp: time * 1000,
                price_usd: close,
                volume_usd: candle.get("volumeto").and_then(Value::as_f64).unwrap_or(0.0),
                market_cap_usd: None,
                source: PROVIDER.to_string(),
            })
        })
        .collect();

    points.sort_by_key(|point| point.timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_histoday_candles() {
        let body = json!({
            "Response": "Success",
            "Data": {
                "Data": [
                    {"time": 1694649600, "close": 8.21, "volumeto": 1_000_000.0},
                    {"time": 1694736000, "close": 8.40, "volumeto": 1_200_000.0}
                ]
            }
        });
        let points = parse_histoday(&body, 0);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, 1694649600000);
        assert_eq!(points[0].source, PROVIDER);
    }

    #[test]
    fn filters_candles_before_window_and_zeroed_closes() {
        let body = json!({
            "Data": {
                "Data": [
                    {"time": 100, "close": 1.0, "volumeto": 10.0},
                    {"time": 200, "close": 0.0, "volumeto": 0.0},
                    {"time": 300, "close": 2.0, "volumeto": 20.0}
                ]
            }
        });
        let points = parse_histoday(&body, 150);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, 300_000);
    }

    #[test]
    fn error_body_yields_empty() {
        let body = json!({"Response": "Error", "Message": "limit param"});
        assert!(parse_histoday(&body, 0).is_empty());
    }
}
