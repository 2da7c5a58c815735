use serde::{Deserialize, Serialize};

/// One sample of a token price time series, tagged with the provider that
/// supplied it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since epoch.
    pub timestamp: i64,
    pub price_usd: f64,
    pub volume_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_usd: Option<f64>,
    pub source: String,
}

/// A token's identifiers in each supported price provider's namespace.
/// `None` means the token is not listed there and the provider is skipped.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenDescriptor {
    #[serde(default)]
    pub coingecko_id: Option<String>,
    /// Exchange pair symbol, e.g. "ENSUSDT".
    #[serde(default)]
    pub exchange_symbol: Option<String>,
    /// Bare market symbol, e.g. "ENS".
    #[serde(default)]
    pub market_symbol: Option<String>,
}

impl TokenDescriptor {
    pub fn is_empty(&self) -> bool {
        self.coingecko_id.is_none()
            && self.exchange_symbol.is_none()
            && self.market_symbol.is_none()
    }
}
