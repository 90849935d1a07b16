//! Market-data source configuration from environment variables.
//!
//! The external listings source is optional. When `MARKET_DATA_URL` is unset the
//! source is reported as unconfigured and the core uses internal data only.

/// Connection details for an external listings API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketDataConfig {
    /// Base URL of the listings API
    pub base_url: String,
    /// Optional bearer token
    pub api_key: Option<String>,
}

/// Reads `MARKET_DATA_URL` and `MARKET_DATA_API_KEY`.
///
/// Returns `None` when no URL is configured or the URL is blank.
#[must_use]
pub fn market_data_config_from_env() -> Option<MarketDataConfig> {
    from_values(
        std::env::var("MARKET_DATA_URL").ok(),
        std::env::var("MARKET_DATA_API_KEY").ok(),
    )
}

fn from_values(url: Option<String>, api_key: Option<String>) -> Option<MarketDataConfig> {
    let base_url = url?.trim().trim_end_matches('/').to_string();
    if base_url.is_empty() {
        return None;
    }
    Some(MarketDataConfig {
        base_url,
        api_key: api_key.filter(|key| !key.trim().is_empty()),
    })
}
