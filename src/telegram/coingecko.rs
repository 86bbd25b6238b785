//! CoinGecko price client.
//!
//! Calls `GET {base}/simple/price?ids=<asset>&vs_currencies=<currency>` and
//! reads `{"<asset>": {"<currency>": <number>}}`. Free API, no key required.

use async_trait::async_trait;
use serde_json::Number;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::telegram::gateway::{GatewayError, Price, PriceFeed};

type SimplePriceResponse = HashMap<String, HashMap<String, Number>>;

/// [`PriceFeed`] backed by the CoinGecko `simple/price` endpoint
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/simple/price", base_url.as_str().trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    async fn spot_price(&self, asset: &str, currency: &str) -> Result<Price, GatewayError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("ids", asset), ("vs_currencies", currency)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), asset, currency, "price API returned an error status");
            return Err(GatewayError::Status(response.status()));
        }

        let mut quotes: SimplePriceResponse = response.json().await?;

        quotes
            .get_mut(asset)
            .and_then(|by_currency| by_currency.remove(currency))
            .map(Price::from)
            .ok_or_else(|| GatewayError::MissingQuote {
                asset: asset.to_string(),
                currency: currency.to_string(),
            })
    }
}
