use crate::{api_client::ApiClient, models::price::PricePoint};
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const PROVIDER: &str = "binance";

/// Daily klines. Each kline is a positional array; open time is index 0
/// (milliseconds), close price index 4 and base volume index 5, both as
/// strings. Quote volume is approximated as `volume * close`.
pub async fn fetch_range(
    api: &ApiClient,
    base_url: &str,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PricePoint> {
    let url = format!("{base_url}/klines");
    let query = [
        ("symbol", symbol.to_string()),
        ("interval", "1d".to_string()),
        ("startTime", start.timestamp_millis().to_string()),
        ("endTime", end.timestamp_millis().to_string()),
        ("limit", "1000".to_string()),
    ];

    match api.get_json::<Value>(PROVIDER, &url, &query).await {
        Some(body) => parse_klines(&body),
        None => vec![],
    }
}

pub fn parse_klines(body: &Value) -> Vec<PricePoint> {
    let klines = match body.as_array() {
        Some(klines) => klines,
        None => return vec![],
    };

    let mut points: Vec<PricePoint> = klines
        .iter()
        .filter_map(|kline| {
            let kline = kline.as_array()?;
            let timestamp = kline.first()?.as_i64()?;
            let close = number_field(kline.get(4)?)?;
            let volume = number_field(kline.get(5)?)?;
            Some(PricePoint {
                timestamp,
                price_usd: close,
                volume_usd: volume * close,
                market_cap_usd: None,
                source: PROVIDER.to_string(),
            })
        })
        .collect();

    points.sort_by_key(|point| point.timestamp);
    points
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_kline_arrays() {
        let body = json!([
            [1694649600000i64, "8.10", "8.50", "8.00", "8.21", "120000.5", 1694735999999i64],
            [1694736000000i64, "8.21", "8.60", "8.15", "8.40", "98000.0", 1694822399999i64]
        ]);
        let points = parse_klines(&body);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price_usd, 8.21);
        assert!((points[0].volume_usd - 120_000.5 * 8.21).abs() < 1e-6);
        assert_eq!(points[0].market_cap_usd, None);
        assert_eq!(points[0].source, PROVIDER);
    }

    #[test]
    fn non_array_body_yields_empty() {
        let body = json!({"code": -1121, "msg": "Invalid symbol."});
        assert!(parse_klines(&body).is_empty());
    }
}
