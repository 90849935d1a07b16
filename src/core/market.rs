//! Optional market-data enrichment.
//!
//! An external listings API can be queried for a game and section. The source
//! is optional: when it is unconfigured or failing, lookups return no listings
//! and callers continue with internal ledger data.

use crate::{
    config::market::MarketDataConfig,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One external resale listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    /// Section label as listed
    pub section: String,
    /// Row label as listed
    pub row: String,
    /// Asking price per ticket
    pub price: f64,
    /// Tickets in the listing
    pub quantity: u32,
    /// Marketplace name
    pub marketplace: String,
    /// Seller handle, when published
    #[serde(default)]
    pub seller: Option<String>,
    /// Link to the listing
    #[serde(default)]
    pub url: Option<String>,
}

/// What to look up: a section for a specific game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingQuery {
    /// Home team name
    pub team_name: String,
    /// Opponent name
    pub opponent: String,
    /// Date of the game
    pub game_date: NaiveDate,
    /// Section to search
    pub section: String,
}

/// A source of external listings.
pub trait MarketDataSource {
    /// Whether the source can be queried at all. Used for UI feature gating.
    fn is_configured(&self) -> bool;

    /// Fetches listings for the query.
    fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> impl Future<Output = Result<Vec<MarketListing>>> + Send;
}

/// The source used when no listings API is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredMarketData;

impl MarketDataSource for UnconfiguredMarketData {
    fn is_configured(&self) -> bool {
        false
    }

    async fn fetch_listings(&self, _query: &ListingQuery) -> Result<Vec<MarketListing>> {
        Ok(Vec::new())
    }
}

/// Listings API over HTTP, returning a JSON array of listings from
/// `GET {base_url}/listings`.
#[derive(Debug, Clone)]
pub struct HttpMarketData {
    client: reqwest::Client,
    config: MarketDataConfig,
}

impl HttpMarketData {
    /// Builds a client for the configured API.
    pub fn new(config: MarketDataConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }
}

impl MarketDataSource for HttpMarketData {
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_listings(&self, query: &ListingQuery) -> Result<Vec<MarketListing>> {
        let url = format!("{}/listings", self.config.base_url);
        let date = query.game_date.to_string();
        let mut request = self.client.get(&url).query(&[
            ("team", query.team_name.as_str()),
            ("opponent", query.opponent.as_str()),
            ("date", date.as_str()),
            ("section", query.section.as_str()),
        ]);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::MarketData {
                message: format!("{url} returned {status}"),
            });
        }
        Ok(response.json().await?)
    }
}

/// Builds the HTTP source when a listings API is configured.
///
/// A client that fails to build is logged and treated as unconfigured.
#[must_use]
pub fn market_source(config: Option<MarketDataConfig>) -> Option<HttpMarketData> {
    let config = config?;
    match HttpMarketData::new(config) {
        Ok(source) => Some(source),
        Err(e) => {
            warn!(error = %e, "Market data client unavailable, using ledger data only");
            None
        }
    }
}

/// Fetches listings, degrading to an empty list on any failure.
pub async fn lookup_listings<S>(source: &S, query: &ListingQuery) -> Vec<MarketListing>
where
    S: MarketDataSource,
{
    if !source.is_configured() {
        debug!("Market data source not configured");
        return Vec::new();
    }

    match source.fetch_listings(query).await {
        Ok(listings) => listings
            .into_iter()
            .filter(|listing| listing.price.is_finite() && listing.price > 0.0)
            .collect(),
        Err(e) => {
            warn!(
                error = %e,
                opponent = %query.opponent,
                section = %query.section,
                "Market data lookup failed, continuing without listings"
            );
            Vec::new()
        }
    }
}
