//! Upstream catalog source abstraction.

use crate::catalog::{CryptoAsset, GiftCard};
use anyhow::Result;
use async_trait::async_trait;

/// Fetches raw asset catalogs from the upstream rate provider.
///
/// Implementations carry no business logic; failures propagate as errors and
/// are absorbed by the catalog cache, never by callers of the cache.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_cryptos(&self) -> Result<Vec<CryptoAsset>>;
    async fn fetch_gift_cards(&self) -> Result<Vec<GiftCard>>;
}
