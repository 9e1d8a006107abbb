//! Quote resolution: catalog walk, rate selection and value computation.
//!
//! Resolution is a pure function of a catalog snapshot and the request,
//! aside from reading the clock for the quote timestamp. Validation failures
//! are typed per hierarchy level so the API layer can report the exact field
//! that failed to resolve.

use crate::cache::CatalogCache;
use crate::catalog::{
    Country, CryptoAsset, Currency, GiftCard, Range, ReceiptCategory, find_crypto, find_gift_card,
};
use crate::money::{format_ngn, format_thousands, round_half_up};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const ESTIMATE_DISCLAIMER: &str =
    "Rates are indicative estimates and may change without notice.";

/// Gift-card buy quotes carry a 5% markup over the base rate.
const GIFT_CARD_BUY_MARKUP: f64 = 1.05;
/// Gift-card trade quotes carry a 2% discount.
const GIFT_CARD_TRADE_DISCOUNT: f64 = 0.98;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("The selected cryptocurrency is not available.")]
    AssetUnavailable,
    #[error("The selected gift card is not available.")]
    GiftCardUnavailable,
    #[error("The selected country is not available for this gift card.")]
    CountryUnavailable,
    #[error("The selected range is not available.")]
    RangeUnavailable,
    #[error("The selected receipt category is not available.")]
    CategoryUnavailable,
    #[error("Amount must be between {min} and {max} {currency}.")]
    AmountOutOfRange { min: f64, max: f64, currency: String },
}

impl QuoteError {
    /// Request field the failure is attributed to in the 422 error map.
    pub fn field(&self) -> &'static str {
        match self {
            QuoteError::AssetUnavailable => "code",
            QuoteError::GiftCardUnavailable => "gift_card_id",
            QuoteError::CountryUnavailable => "country_id",
            QuoteError::RangeUnavailable => "range_id",
            QuoteError::CategoryUnavailable => "category_id",
            QuoteError::AmountOutOfRange { .. } => "amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoAction {
    Buy,
    Sell,
    Swap,
}

impl CryptoAction {
    /// Permissive parse: unrecognized actions fall back to `Buy`, matching
    /// the upstream service's behavior for out-of-contract action strings.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "buy" => CryptoAction::Buy,
            "sell" => CryptoAction::Sell,
            "swap" => CryptoAction::Swap,
            other => {
                debug!("Unrecognized crypto action '{other}', defaulting to buy");
                CryptoAction::Buy
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoAction::Buy => "buy",
            CryptoAction::Sell => "sell",
            CryptoAction::Swap => "swap",
        }
    }

    fn applied_rate(&self, asset: &CryptoAsset) -> f64 {
        match self {
            CryptoAction::Buy => asset.buy_rate,
            CryptoAction::Sell => asset.sell_rate,
            CryptoAction::Swap => (asset.buy_rate + asset.sell_rate) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftCardAction {
    Sell,
    Buy,
    Trade,
}

impl GiftCardAction {
    /// Permissive parse: unrecognized actions use the unmarked base rate.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "sell" => GiftCardAction::Sell,
            "buy" => GiftCardAction::Buy,
            "trade" => GiftCardAction::Trade,
            other => {
                debug!("Unrecognized gift card action '{other}', defaulting to sell");
                GiftCardAction::Sell
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GiftCardAction::Sell => "sell",
            GiftCardAction::Buy => "buy",
            GiftCardAction::Trade => "trade",
        }
    }

    fn applied_rate(&self, base_rate: f64) -> f64 {
        match self {
            GiftCardAction::Sell => base_rate,
            GiftCardAction::Buy => base_rate * GIFT_CARD_BUY_MARKUP,
            GiftCardAction::Trade => base_rate * GIFT_CARD_TRADE_DISCOUNT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetSnapshot {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CryptoQuote {
    pub asset: AssetSnapshot,
    pub action: &'static str,
    /// Asset-denominated amount, rounded to 8 fractional digits.
    pub amount: f64,
    pub usd_rate: f64,
    pub buy_rate: f64,
    pub sell_rate: f64,
    pub applied_rate: f64,
    pub currency: &'static str,
    pub exchange_value_ngn: f64,
    pub formatted_value: String,
    pub networks: Vec<serde_json::Value>,
    pub calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GiftCardSnapshot {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountrySnapshot {
    pub id: i64,
    pub name: String,
    pub iso: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSnapshot {
    pub id: i64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySnapshot {
    pub id: i64,
    pub title: String,
    pub rate_per_unit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GiftCardQuote {
    pub gift_card: GiftCardSnapshot,
    pub country: CountrySnapshot,
    pub range: RangeSnapshot,
    pub category: CategorySnapshot,
    pub action: &'static str,
    pub amount: f64,
    pub applied_rate: f64,
    pub formatted_rate: String,
    /// The resolved country's currency code, for message construction.
    pub currency: String,
    pub exchange_value_ngn: f64,
    pub formatted_value: String,
    pub disclaimer: &'static str,
    pub calculated_at: DateTime<Utc>,
}

/// Resolve a crypto quote against a catalog snapshot.
///
/// When both `amount` and `usd_value` are supplied, `usd_value` wins: the
/// asset amount is derived from it and `amount` is ignored.
pub fn quote_crypto(
    assets: &[CryptoAsset],
    code: &str,
    action: CryptoAction,
    amount: Option<f64>,
    usd_value: Option<f64>,
) -> Result<CryptoQuote, QuoteError> {
    let asset = find_crypto(assets, code).ok_or(QuoteError::AssetUnavailable)?;
    let applied_rate = action.applied_rate(asset);

    let (crypto_amount, exchange_value) = match usd_value {
        Some(usd) => {
            let derived = if asset.usd_rate > 0.0 {
                usd / asset.usd_rate
            } else {
                0.0
            };
            (derived, usd * applied_rate)
        }
        None => {
            let amount = amount.unwrap_or(0.0);
            (amount, amount * asset.usd_rate * applied_rate)
        }
    };

    let exchange_value_ngn = round_half_up(exchange_value, 2);
    Ok(CryptoQuote {
        asset: AssetSnapshot {
            id: asset.id,
            code: asset.code.clone(),
            name: asset.name.clone(),
            kind: "crypto",
            icon: asset.icon.clone(),
        },
        action: action.as_str(),
        amount: round_half_up(crypto_amount, 8),
        usd_rate: asset.usd_rate,
        buy_rate: asset.buy_rate,
        sell_rate: asset.sell_rate,
        applied_rate,
        currency: "NGN",
        exchange_value_ngn,
        formatted_value: format_ngn(exchange_value_ngn),
        networks: asset.networks.clone(),
        calculated_at: Utc::now(),
    })
}

/// Resolve a gift-card quote against a catalog snapshot.
///
/// The four-level hierarchy is walked in order and each miss short-circuits
/// with its own failure; the amount bounds are checked only once the range
/// itself has resolved.
pub fn quote_gift_card(
    cards: &[GiftCard],
    gift_card_id: i64,
    country_id: i64,
    range_id: i64,
    category_id: i64,
    action: GiftCardAction,
    amount: f64,
) -> Result<GiftCardQuote, QuoteError> {
    let card = find_gift_card(cards, gift_card_id).ok_or(QuoteError::GiftCardUnavailable)?;

    let country: &Country = card
        .countries
        .iter()
        .find(|c| c.id == country_id)
        .ok_or(QuoteError::CountryUnavailable)?;

    let range: &Range = country
        .ranges
        .iter()
        .find(|r| r.id == range_id)
        .ok_or(QuoteError::RangeUnavailable)?;

    let category: &ReceiptCategory = range
        .receipt_categories
        .iter()
        .find(|c| c.id == category_id)
        .ok_or(QuoteError::CategoryUnavailable)?;

    if amount < range.min || amount > range.max {
        return Err(QuoteError::AmountOutOfRange {
            min: range.min,
            max: range.max,
            currency: country.currency.code.clone(),
        });
    }

    let applied_rate = action.applied_rate(category.amount);
    let exchange_value_ngn = round_half_up(amount * applied_rate, 2);

    Ok(GiftCardQuote {
        gift_card: GiftCardSnapshot {
            id: card.id,
            title: card.title.clone(),
            image: card.image.clone(),
        },
        country: CountrySnapshot {
            id: country.id,
            name: country.name.clone(),
            iso: country.iso.clone(),
            currency: country.currency.clone(),
        },
        range: RangeSnapshot {
            id: range.id,
            min: range.min,
            max: range.max,
        },
        category: CategorySnapshot {
            id: category.id,
            title: category.title.clone(),
            rate_per_unit: category.amount,
        },
        action: action.as_str(),
        amount,
        applied_rate,
        formatted_rate: format_thousands(applied_rate, 2),
        currency: country.currency.code.clone(),
        exchange_value_ngn,
        formatted_value: format_ngn(exchange_value_ngn),
        disclaimer: ESTIMATE_DISCLAIMER,
        calculated_at: Utc::now(),
    })
}

/// Cache-backed facade the API layer talks to.
pub struct QuoteService {
    cache: CatalogCache,
}

impl QuoteService {
    pub fn new(cache: CatalogCache) -> Self {
        QuoteService { cache }
    }

    pub async fn quote_crypto(
        &self,
        code: &str,
        action: &str,
        amount: Option<f64>,
        usd_value: Option<f64>,
    ) -> Result<CryptoQuote, QuoteError> {
        let catalog = self.cache.cryptos().await;
        quote_crypto(&catalog, code, CryptoAction::parse(action), amount, usd_value)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn quote_gift_card(
        &self,
        gift_card_id: i64,
        country_id: i64,
        range_id: i64,
        category_id: i64,
        action: &str,
        amount: f64,
    ) -> Result<GiftCardQuote, QuoteError> {
        let catalog = self.cache.gift_cards().await;
        quote_gift_card(
            &catalog,
            gift_card_id,
            country_id,
            range_id,
            category_id,
            GiftCardAction::parse(action),
            amount,
        )
    }

    pub async fn crypto_catalog(&self) -> std::sync::Arc<Vec<CryptoAsset>> {
        self.cache.cryptos().await
    }

    pub async fn gift_card_catalog(&self) -> std::sync::Arc<Vec<GiftCard>> {
        self.cache.gift_cards().await
    }

    pub async fn find_crypto(&self, code: &str) -> Option<CryptoAsset> {
        find_crypto(&self.cache.cryptos().await, code).cloned()
    }

    pub async fn find_gift_card(&self, id: i64) -> Option<GiftCard> {
        find_gift_card(&self.cache.gift_cards().await, id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> CryptoAsset {
        CryptoAsset {
            id: 1,
            code: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            icon: Some("btc.png".to_string()),
            buy_rate: 1550.0,
            sell_rate: 1500.0,
            usd_rate: 45000.0,
            networks: vec![serde_json::json!({"name": "Bitcoin"})],
        }
    }

    fn amazon() -> GiftCard {
        GiftCard {
            id: 5,
            title: "Amazon".to_string(),
            image: None,
            countries: vec![Country {
                id: 10,
                name: "United States".to_string(),
                iso: "US".to_string(),
                currency: Currency {
                    code: "USD".to_string(),
                    symbol: Some("$".to_string()),
                },
                ranges: vec![Range {
                    id: 100,
                    min: 50.0,
                    max: 500.0,
                    receipt_categories: vec![ReceiptCategory {
                        id: 1000,
                        title: "Physical receipt".to_string(),
                        amount: 1400.0,
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_crypto_action_rate_selection() {
        let assets = vec![btc()];
        let buy = quote_crypto(&assets, "BTC", CryptoAction::Buy, Some(1.0), None).unwrap();
        let sell = quote_crypto(&assets, "BTC", CryptoAction::Sell, Some(1.0), None).unwrap();
        let swap = quote_crypto(&assets, "BTC", CryptoAction::Swap, Some(1.0), None).unwrap();

        assert_eq!(buy.applied_rate, 1550.0);
        assert_eq!(sell.applied_rate, 1500.0);
        assert_eq!(swap.applied_rate, 1525.0);
    }

    #[test]
    fn test_btc_swap_scenario() {
        let assets = vec![btc()];
        let quote = quote_crypto(&assets, "btc", CryptoAction::Swap, Some(2.0), None).unwrap();

        assert_eq!(quote.applied_rate, 1525.0);
        assert_eq!(quote.amount, 2.0);
        assert_eq!(quote.exchange_value_ngn, 137_250_000.0);
        assert_eq!(quote.formatted_value, "\u{20a6}137,250,000.00");
        assert_eq!(quote.currency, "NGN");
    }

    #[test]
    fn test_usd_value_takes_priority_over_amount() {
        let assets = vec![btc()];
        let quote =
            quote_crypto(&assets, "BTC", CryptoAction::Buy, Some(99.0), Some(9000.0)).unwrap();

        // amount is ignored; asset amount derived from usd_value
        assert_eq!(quote.amount, 0.2);
        assert_eq!(quote.exchange_value_ngn, 9000.0 * 1550.0);
    }

    #[test]
    fn test_usd_value_round_trips_through_usd_rate() {
        let assets = vec![btc()];
        let usd = 1234.56;
        let quote = quote_crypto(&assets, "BTC", CryptoAction::Sell, None, Some(usd)).unwrap();
        assert!((quote.amount * 45000.0 - usd).abs() < 1e-2);
    }

    #[test]
    fn test_zero_usd_rate_yields_zero_amount() {
        let mut asset = btc();
        asset.usd_rate = 0.0;
        let assets = vec![asset];

        let quote = quote_crypto(&assets, "BTC", CryptoAction::Buy, None, Some(100.0)).unwrap();
        assert_eq!(quote.amount, 0.0);
        assert_eq!(quote.exchange_value_ngn, 100.0 * 1550.0);
    }

    #[test]
    fn test_unknown_crypto_action_defaults_to_buy() {
        assert_eq!(CryptoAction::parse("stake"), CryptoAction::Buy);
        assert_eq!(CryptoAction::parse("SELL"), CryptoAction::Sell);
    }

    #[test]
    fn test_unknown_asset_fails_lookup() {
        let err = quote_crypto(&[btc()], "DOGE", CryptoAction::Buy, Some(1.0), None).unwrap_err();
        assert_eq!(err, QuoteError::AssetUnavailable);
        assert_eq!(err.field(), "code");
    }

    #[test]
    fn test_crypto_quote_is_idempotent_modulo_timestamp() {
        let assets = vec![btc()];
        let a = quote_crypto(&assets, "BTC", CryptoAction::Swap, Some(2.0), None).unwrap();
        let b = quote_crypto(&assets, "BTC", CryptoAction::Swap, Some(2.0), None).unwrap();
        assert_eq!(a.exchange_value_ngn, b.exchange_value_ngn);
        assert_eq!(a.applied_rate, b.applied_rate);
        assert_eq!(a.amount, b.amount);
    }

    #[test]
    fn test_gift_card_markup_policy() {
        let cards = vec![amazon()];
        let sell = quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Sell, 100.0).unwrap();
        let buy = quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Buy, 100.0).unwrap();
        let trade =
            quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Trade, 100.0).unwrap();

        assert_eq!(sell.applied_rate, 1400.0);
        assert_eq!(buy.applied_rate, 1400.0 * 1.05);
        assert_eq!(trade.applied_rate, 1400.0 * 0.98);
    }

    #[test]
    fn test_gift_card_buy_scenario() {
        let cards = vec![amazon()];
        let quote = quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Buy, 100.0).unwrap();

        assert_eq!(quote.applied_rate, 1470.0);
        assert_eq!(quote.exchange_value_ngn, 147_000.0);
        assert_eq!(quote.formatted_value, "\u{20a6}147,000.00");
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.category.rate_per_unit, 1400.0);
        assert_eq!(quote.disclaimer, ESTIMATE_DISCLAIMER);
    }

    #[test]
    fn test_gift_card_level_specific_failures() {
        let cards = vec![amazon()];

        let err =
            quote_gift_card(&cards, 99, 10, 100, 1000, GiftCardAction::Sell, 100.0).unwrap_err();
        assert_eq!(err, QuoteError::GiftCardUnavailable);
        assert_eq!(err.field(), "gift_card_id");

        let err =
            quote_gift_card(&cards, 5, 99, 100, 1000, GiftCardAction::Sell, 100.0).unwrap_err();
        assert_eq!(err, QuoteError::CountryUnavailable);

        let err =
            quote_gift_card(&cards, 5, 10, 99, 1000, GiftCardAction::Sell, 100.0).unwrap_err();
        assert_eq!(err, QuoteError::RangeUnavailable);

        let err = quote_gift_card(&cards, 5, 10, 100, 99, GiftCardAction::Sell, 100.0).unwrap_err();
        assert_eq!(err, QuoteError::CategoryUnavailable);
    }

    #[test]
    fn test_gift_card_amount_bounds() {
        let cards = vec![amazon()];

        // Inclusive bounds
        assert!(quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Sell, 50.0).is_ok());
        assert!(quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Sell, 500.0).is_ok());

        let err =
            quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Sell, 10.0).unwrap_err();
        assert_eq!(
            err,
            QuoteError::AmountOutOfRange {
                min: 50.0,
                max: 500.0,
                currency: "USD".to_string(),
            }
        );
        assert_eq!(err.field(), "amount");
        assert_eq!(err.to_string(), "Amount must be between 50 and 500 USD.");

        let err =
            quote_gift_card(&cards, 5, 10, 100, 1000, GiftCardAction::Sell, 501.0).unwrap_err();
        assert!(matches!(err, QuoteError::AmountOutOfRange { .. }));
    }

    #[test]
    fn test_bounds_checked_only_after_range_resolves() {
        let cards = vec![amazon()];
        // Amount is wildly out of range but the range id is wrong: the range
        // miss must win.
        let err =
            quote_gift_card(&cards, 5, 10, 99, 1000, GiftCardAction::Sell, 1e9).unwrap_err();
        assert_eq!(err, QuoteError::RangeUnavailable);
    }

    #[test]
    fn test_unknown_gift_card_action_uses_base_rate() {
        let cards = vec![amazon()];
        assert_eq!(GiftCardAction::parse("gift"), GiftCardAction::Sell);
        let quote = quote_gift_card(
            &cards,
            5,
            10,
            100,
            1000,
            GiftCardAction::parse("gift"),
            100.0,
        )
        .unwrap();
        assert_eq!(quote.applied_rate, 1400.0);
    }

    #[test]
    fn test_empty_catalog_fails_every_lookup() {
        assert_eq!(
            quote_crypto(&[], "BTC", CryptoAction::Buy, Some(1.0), None).unwrap_err(),
            QuoteError::AssetUnavailable
        );
        assert_eq!(
            quote_gift_card(&[], 5, 10, 100, 1000, GiftCardAction::Sell, 100.0).unwrap_err(),
            QuoteError::GiftCardUnavailable
        );
    }
}
