//! TTL cache for upstream catalogs.
//!
//! One entry per catalog kind, replaced wholesale on refresh so concurrent
//! readers always observe a single consistent snapshot. A failed fetch is
//! logged and cached as an empty catalog for a full TTL window, which bounds
//! the upstream request rate during a sustained outage. Errors never cross
//! this boundary: callers always receive a (possibly empty) catalog.

use crate::catalog::{CatalogKind, CryptoAsset, GiftCard};
use crate::rate_provider::RateProvider;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<T> {
    catalog: Arc<Vec<T>>,
    expires_at: Instant,
}

pub struct CatalogCache {
    provider: Arc<dyn RateProvider>,
    ttl: Duration,
    cryptos: Mutex<Option<Entry<CryptoAsset>>>,
    gift_cards: Mutex<Option<Entry<GiftCard>>>,
}

impl CatalogCache {
    pub fn new(provider: Arc<dyn RateProvider>, ttl: Duration) -> Self {
        CatalogCache {
            provider,
            ttl,
            cryptos: Mutex::new(None),
            gift_cards: Mutex::new(None),
        }
    }

    pub async fn cryptos(&self) -> Arc<Vec<CryptoAsset>> {
        self.get_or_refresh(CatalogKind::Crypto, &self.cryptos, || {
            self.provider.fetch_cryptos()
        })
        .await
    }

    pub async fn gift_cards(&self) -> Arc<Vec<GiftCard>> {
        self.get_or_refresh(CatalogKind::GiftCard, &self.gift_cards, || {
            self.provider.fetch_gift_cards()
        })
        .await
    }

    /// The kind's lock is held across the refresh, so concurrent callers on
    /// an expired entry collapse to a single upstream fetch.
    async fn get_or_refresh<T, F, Fut>(
        &self,
        kind: CatalogKind,
        slot: &Mutex<Option<Entry<T>>>,
        fetch: F,
    ) -> Arc<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let mut slot = slot.lock().await;
        if let Some(entry) = slot.as_ref()
            && Instant::now() < entry.expires_at
        {
            debug!("Cache HIT for {kind} catalog");
            return Arc::clone(&entry.catalog);
        }

        debug!("Cache MISS for {kind} catalog");
        let catalog = match fetch().await {
            Ok(items) => Arc::new(items),
            Err(e) => {
                error!("Failed to fetch {kind} catalog: {e:#}");
                Arc::new(Vec::new())
            }
        };

        *slot = Some(Entry {
            catalog: Arc::clone(&catalog),
            expires_at: Instant::now() + self.ttl,
        });
        catalog
    }
}
