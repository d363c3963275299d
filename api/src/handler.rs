use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    models::{Coin, HistoryRange, OhlcCandle},
    Error as CommonError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::service::CoinService;

pub type SharedService = Arc<CoinService>;

// Wrapper so common::Error can become an axum response
pub struct ApiError(CommonError);

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CommonError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CommonError::ParseError(msg) => (StatusCode::BAD_REQUEST, msg),
            CommonError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, msg),
            CommonError::HttpError(e) => (
                StatusCode::BAD_GATEWAY,
                format!("Upstream request failed: {}", e),
            ),
            CommonError::StoreError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            CommonError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            CommonError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Envelope for upstream-backed list endpoints
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

// List every coin the upstream knows about
pub async fn list_coins(
    State(service): State<SharedService>,
) -> Result<Json<DataResponse<Vec<Coin>>>, ApiError> {
    let coins = service.list_coins().await?;
    Ok(Json(DataResponse { data: coins }))
}

// Search coins by name or symbol
pub async fn search(
    State(service): State<SharedService>,
    Path(query): Path<String>,
) -> Result<Json<DataResponse<Vec<Coin>>>, ApiError> {
    let coins = service.search(&query).await?;
    Ok(Json(DataResponse { data: coins }))
}

// The watchlist with live prices
pub async fn get_watchlist(
    State(service): State<SharedService>,
) -> Result<Json<Vec<Coin>>, ApiError> {
    let coins = service.watchlist().await?;
    Ok(Json(coins))
}

// Add one coin; posting a present id is a no-op
pub async fn post_watchlist(
    State(service): State<SharedService>,
    Json(coin): Json<Coin>,
) -> Result<Json<Vec<Coin>>, ApiError> {
    let coins = service.add_to_watchlist(coin).await?;
    Ok(Json(coins))
}

// Replace the whole list (reorder support)
pub async fn put_watchlist(
    State(service): State<SharedService>,
    Json(coins): Json<Vec<Coin>>,
) -> Result<Json<Vec<Coin>>, ApiError> {
    let coins = service.replace_watchlist(coins).await?;
    Ok(Json(coins))
}

// Remove a coin by id; absent ids are a 404
pub async fn delete_watchlist(
    State(service): State<SharedService>,
    Path(coin_id): Path<String>,
) -> Result<Json<Vec<Coin>>, ApiError> {
    let coins = service.remove_from_watchlist(&coin_id).await?;
    Ok(Json(coins))
}

// Top coins by upstream ranking
pub async fn trending(
    State(service): State<SharedService>,
) -> Result<Json<DataResponse<Vec<Coin>>>, ApiError> {
    let coins = service.trending().await?;
    Ok(Json(DataResponse { data: coins }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub range: Option<String>,
}

// OHLC history for a coin over a named range
pub async fn price_history(
    State(service): State<SharedService>,
    Path(coin_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<DataResponse<Vec<OhlcCandle>>>, ApiError> {
    let range = match query.range.as_deref() {
        Some(s) => s.parse::<HistoryRange>()?,
        None => HistoryRange::OneDay,
    };

    let candles = service.price_history(&coin_id, range).await?;
    Ok(Json(DataResponse { data: candles }))
}

// Global market metrics, shaped by the upstream vendor
pub async fn market(
    State(service): State<SharedService>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let overview = service.market().await?;
    Ok(Json(overview))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (CommonError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CommonError::ParseError("x".into()), StatusCode::BAD_REQUEST),
            (
                CommonError::UpstreamError("x".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CommonError::StoreError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CommonError::InternalError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_data_response_shape() {
        let body = DataResponse {
            data: vec![Coin::new("bitcoin", "Bitcoin", "BTC")],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"][0]["id"], "bitcoin");
        assert_eq!(json["data"][0]["symbol"], "BTC");
        // No price field until enrichment fills one in
        assert!(json["data"][0].get("price").is_none());
    }
}
