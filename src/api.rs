//! HTTP boundary for the quote service.
//!
//! Thin layer: request shape validation happens here, everything else is the
//! resolver's job. Resolver validation failures surface as HTTP 422 with a
//! field-to-messages map; unexpected faults stay generic unless the debug
//! flag is set.

use crate::resolver::{QuoteError, QuoteService};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QuoteService>,
    /// When set, unexpected faults include their detail in the response.
    pub debug: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/calculate/crypto", post(calculate_crypto))
        .route("/api/v1/calculate/gift-card", post(calculate_gift_card))
        .route("/api/v1/rates", get(all_rates))
        .route("/api/v1/rates/crypto", get(crypto_rates))
        .route("/api/v1/rates/crypto/{code}", get(crypto_detail))
        .route("/api/v1/rates/gift-cards", get(gift_card_rates))
        .route("/api/v1/rates/gift-cards/{id}", get(gift_card_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CryptoQuoteRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub action: String,
    pub amount: Option<f64>,
    pub usd_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GiftCardQuoteRequest {
    pub gift_card_id: i64,
    pub country_id: i64,
    pub range_id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub action: String,
    pub amount: f64,
}

#[derive(Serialize)]
struct QuoteResponse<T: Serialize> {
    message: &'static str,
    estimated_rate: bool,
    data: T,
}

fn validation_failure(field: &str, message: String) -> Response {
    let mut errors = BTreeMap::new();
    errors.insert(field.to_string(), vec![message]);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "message": "Validation failed", "errors": errors })),
    )
        .into_response()
}

fn quote_failure(err: QuoteError) -> Response {
    validation_failure(err.field(), err.to_string())
}

/// Body-level rejections: type/shape mismatches are reported like any other
/// validation failure; anything else is an internal fault and stays generic
/// outside debug mode.
fn body_rejection(rejection: JsonRejection, debug: bool) -> Response {
    match rejection {
        JsonRejection::JsonDataError(e) => validation_failure("body", e.body_text()),
        JsonRejection::JsonSyntaxError(e) => validation_failure("body", e.body_text()),
        JsonRejection::MissingJsonContentType(e) => validation_failure("body", e.body_text()),
        other => {
            error!("Unexpected request body failure: {other}");
            let message = if debug {
                other.body_text()
            } else {
                "Internal server error".to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response()
        }
    }
}

async fn calculate_crypto(
    State(state): State<AppState>,
    payload: Result<Json<CryptoQuoteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejection(rejection, state.debug),
    };

    if req.code.trim().is_empty() {
        return validation_failure("code", "The code field is required.".to_string());
    }
    let amount_given = req.amount.is_some_and(|a| a > 0.0);
    let usd_given = req.usd_value.is_some_and(|u| u > 0.0);
    if !amount_given && !usd_given {
        return validation_failure(
            "amount",
            "Either amount or usd_value must be provided.".to_string(),
        );
    }

    match state
        .service
        .quote_crypto(
            &req.code,
            &req.action,
            req.amount.filter(|a| *a > 0.0),
            req.usd_value.filter(|u| *u > 0.0),
        )
        .await
    {
        Ok(quote) => Json(QuoteResponse {
            message: "Crypto rate calculated successfully",
            estimated_rate: true,
            data: quote,
        })
        .into_response(),
        Err(err) => quote_failure(err),
    }
}

async fn calculate_gift_card(
    State(state): State<AppState>,
    payload: Result<Json<GiftCardQuoteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return body_rejection(rejection, state.debug),
    };

    if req.amount <= 0.0 {
        return validation_failure("amount", "Amount must be greater than zero.".to_string());
    }

    match state
        .service
        .quote_gift_card(
            req.gift_card_id,
            req.country_id,
            req.range_id,
            req.category_id,
            &req.action,
            req.amount,
        )
        .await
    {
        Ok(quote) => Json(QuoteResponse {
            message: "Gift card rate calculated successfully",
            estimated_rate: true,
            data: quote,
        })
        .into_response(),
        Err(err) => quote_failure(err),
    }
}

async fn crypto_rates(State(state): State<AppState>) -> Response {
    let catalog = state.service.crypto_catalog().await;
    Json(json!({
        "message": "Crypto rates retrieved successfully",
        "data": &*catalog,
    }))
    .into_response()
}

async fn gift_card_rates(State(state): State<AppState>) -> Response {
    let catalog = state.service.gift_card_catalog().await;
    Json(json!({
        "message": "Gift card rates retrieved successfully",
        "all_giftcards": &*catalog,
    }))
    .into_response()
}

async fn all_rates(State(state): State<AppState>) -> Response {
    let (cryptos, gift_cards) = futures::join!(
        state.service.crypto_catalog(),
        state.service.gift_card_catalog()
    );
    Json(json!({
        "message": "All rates retrieved successfully",
        "data": {
            "cryptocurrencies": &*cryptos,
            "gift_cards": &*gift_cards,
        },
    }))
    .into_response()
}

async fn crypto_detail(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.service.find_crypto(&code).await {
        Some(asset) => Json(json!({
            "message": "Crypto asset retrieved successfully",
            "data": asset,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "The selected cryptocurrency is not available." })),
        )
            .into_response(),
    }
}

async fn gift_card_detail(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.service.find_gift_card(id).await {
        Some(card) => Json(json!({
            "message": "Gift card retrieved successfully",
            "data": card,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "The selected gift card is not available." })),
        )
            .into_response(),
    }
}
