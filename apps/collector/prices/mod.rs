//! Multi-source price resolution. Providers are tried in a fixed priority
//! order; the first series with enough points wins and is tagged with the
//! provider that produced it. Partial series from different providers are
//! never merged point-by-point.

pub mod binance;
pub mod coingecko;
pub mod cryptocompare;

use crate::{
    api_client::ApiClient,
    models::price::{PricePoint, TokenDescriptor},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// A series must carry more than this many points to be accepted.
pub const MIN_SERIES_POINTS: usize = 10;

/// Endpoint bases, overridable in tests.
#[derive(Clone, Debug)]
pub struct PriceEndpoints {
    pub coingecko: String,
    pub binance: String,
    pub cryptocompare: String,
}

impl Default for PriceEndpoints {
    fn default() -> Self {
        Self {
            coingecko: "https://api.coingecko.com/api/v3".to_string(),
            binance: "https://api.binance.com/api/v3".to_string(),
            cryptocompare: "https://min-api.cryptocompare.com".to_string(),
        }
    }
}

/// Tries CoinGecko, then Binance daily klines, then CryptoCompare histoday.
/// Providers with no configured identifier are skipped without a call.
/// Returns an empty series when every provider fails or comes up short.
pub async fn resolve_price_series(
    api: &ApiClient,
    endpoints: &PriceEndpoints,
    token: &TokenDescriptor,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PricePoint> {
    if let Some(id) = &token.coingecko_id {
        let series = coingecko::fetch_range(api, &endpoints.coingecko, id, start, end).await;
        if series.len() > MIN_SERIES_POINTS {
            info!(provider = coingecko::PROVIDER, points = series.len(), "Accepted price series");
            return series;
        }
        warn!(provider = coingecko::PROVIDER, points = series.len(), "Insufficient price data");
    }

    if let Some(symbol) = &token.exchange_symbol {
        let series = binance::fetch_range(api, &endpoints.binance, symbol, start, end).await;
        if series.len() > MIN_SERIES_POINTS {
            info!(provider = binance::PROVIDER, points = series.len(), "Accepted price series");
            return series;
        }
        warn!(provider = binance::PROVIDER, points = series.len(), "Insufficient price data");
    }

    if let Some(symbol) = &token.market_symbol {
        let series =
            cryptocompare::fetch_range(api, &endpoints.cryptocompare, symbol, start, end).await;
        if series.len() > MIN_SERIES_POINTS {
            info!(provider = cryptocompare::PROVIDER, points = series.len(), "Accepted price series");
            return series;
        }
        warn!(provider = cryptocompare::PROVIDER, points = series.len(), "Insufficient price data");
    }

    vec![]
}
