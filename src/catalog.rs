//! Upstream catalog data model and lookup helpers.
//!
//! Everything here deserializes straight from the upstream guest API, which
//! is treated as untrusted and partial: numeric fields may arrive as numbers,
//! strings, or be missing entirely, and default to zero rather than failing.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// Which upstream catalog a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Crypto,
    GiftCard,
}

impl Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogKind::Crypto => write!(f, "crypto"),
            CatalogKind::GiftCard => write!(f, "gift_card"),
        }
    }
}

/// Accepts numbers, numeric strings, null or a missing field; anything else
/// collapses to 0.0 so degraded upstream data cannot fail a whole catalog.
fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoAsset {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub buy_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sell_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_rate: f64,
    /// Supported transfer networks, passed through untouched.
    #[serde(default)]
    pub networks: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCard {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub countries: Vec<Country>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub iso: String,
    pub currency: Currency,
    #[serde(default)]
    pub ranges: Vec<Range>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max: f64,
    #[serde(default)]
    pub receipt_categories: Vec<ReceiptCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptCategory {
    pub id: i64,
    pub title: String,
    /// Base rate per unit of card value for this receipt condition.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
}

/// Case-insensitive ticker lookup.
pub fn find_crypto<'a>(assets: &'a [CryptoAsset], code: &str) -> Option<&'a CryptoAsset> {
    assets.iter().find(|a| a.code.eq_ignore_ascii_case(code))
}

pub fn find_gift_card(cards: &[GiftCard], id: i64) -> Option<&GiftCard> {
    cards.iter().find(|c| c.id == id)
}
