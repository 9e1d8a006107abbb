//! Guest-API client for the PGold rate provider.

use crate::catalog::{CryptoAsset, GiftCard};
use crate::rate_provider::RateProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PgoldProvider {
    base_url: String,
    client: reqwest::Client,
}

impl PgoldProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ratedesk/0.1")
            .timeout(timeout)
            .build()?;
        Ok(PgoldProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, what: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Requesting {} catalog from {}", what, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for {} catalog URL: {}", e, what, url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "HTTP error: {} for {} catalog, body: {}",
                status,
                what,
                body
            ));
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {what} catalog response"))
    }
}

#[derive(Debug, Deserialize)]
struct CryptoCatalogResponse {
    #[serde(default)]
    data: Vec<CryptoAsset>,
}

#[derive(Debug, Deserialize)]
struct GiftCardCatalogResponse {
    #[serde(default)]
    all_giftcards: Vec<GiftCard>,
}

#[async_trait]
impl RateProvider for PgoldProvider {
    async fn fetch_cryptos(&self) -> Result<Vec<CryptoAsset>> {
        let response: CryptoCatalogResponse =
            self.fetch("/api/guest/cryptocurrencies", "crypto").await?;
        debug!("Fetched {} crypto assets", response.data.len());
        Ok(response.data)
    }

    async fn fetch_gift_cards(&self) -> Result<Vec<GiftCard>> {
        let response: GiftCardCatalogResponse =
            self.fetch("/api/guest/giftcards", "gift card").await?;
        debug!("Fetched {} gift cards", response.all_giftcards.len());
        Ok(response.all_giftcards)
    }
}
