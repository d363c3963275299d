use crate::MarketDataProvider;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use common::{
    models::{Coin, HistoryRange, OhlcCandle},
    Error, Result,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Demo-tier API keys travel in a request header
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", COINGECKO_API_URL, path);
        let request = self.client.get(&url);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeckoListCoin {
    id: String,
    symbol: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GeckoTrendingResponse {
    coins: Vec<GeckoTrendingEntry>,
}

#[derive(Debug, Deserialize)]
struct GeckoTrendingEntry {
    item: GeckoTrendingItem,
}

#[derive(Debug, Deserialize)]
struct GeckoTrendingItem {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    price_btc: Option<f64>,
}

// Convert HistoryRange to the CoinGecko `days` parameter. The OHLC endpoint
// has no sub-day granularity, so 1h fetches one day and trims afterwards.
fn gecko_days(range: HistoryRange) -> u32 {
    match range {
        HistoryRange::OneHour => 1,
        HistoryRange::OneDay => 1,
        HistoryRange::SevenDays => 7,
        HistoryRange::OneMonth => 30,
        HistoryRange::ThreeMonths => 90,
        HistoryRange::OneYear => 365,
    }
}

// CoinGecko OHLC rows are arrays: [time_ms, open, high, low, close]
fn candles_from_rows(rows: Vec<Vec<serde_json::Value>>) -> Vec<OhlcCandle> {
    let mut candles = Vec::with_capacity(rows.len());

    for row in rows {
        if row.len() < 5 {
            continue; // Skip malformed rows
        }

        let timestamp = match row[0].as_i64() {
            Some(ms) => match Utc.timestamp_millis_opt(ms).single() {
                Some(ts) => ts,
                None => continue,
            },
            None => continue,
        };

        let mut fields = [0.0f64; 4];
        let mut ok = true;
        for (i, field) in fields.iter_mut().enumerate() {
            match row[i + 1].as_f64() {
                Some(v) => *field = v,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }

        candles.push(OhlcCandle {
            timestamp,
            open: fields[0],
            high: fields[1],
            low: fields[2],
            close: fields[3],
        });
    }

    candles
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!("CoinGecko API error: {} - {}", status, error_text);
        return Err(Error::UpstreamError(format!(
            "CoinGecko API error: {} - {}",
            status, error_text
        )));
    }
    Ok(response)
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn list_coins(&self) -> Result<Vec<Coin>> {
        debug!("Fetching coin list from CoinGecko");

        let response = self
            .get("/coins/list")
            .send()
            .await
            .map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let coins: Vec<GeckoListCoin> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinGecko coin list: {}", e))
        })?;

        Ok(coins
            .into_iter()
            .map(|c| Coin::new(c.id, c.name, c.symbol))
            .collect())
    }

    async fn current_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!("Fetching current prices from CoinGecko for {} ids", ids.len());

        let response = self
            .get("/simple/price")
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".to_string())])
            .send()
            .await
            .map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        // Response shape: {"bitcoin": {"usd": 97000.0}, ...}
        let raw: HashMap<String, HashMap<String, f64>> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinGecko prices: {}", e))
        })?;

        let prices = raw
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get("usd").map(|p| (id, *p)))
            .collect();

        Ok(prices)
    }

    async fn ohlc(&self, id: &str, range: HistoryRange) -> Result<Vec<OhlcCandle>> {
        let days = gecko_days(range);

        debug!(
            "Fetching OHLC from CoinGecko for {} (range: {}, days: {})",
            id, range, days
        );

        let response = self
            .get(&format!("/coins/{}/ohlc", id))
            .query(&[("vs_currency", "usd".to_string()), ("days", days.to_string())])
            .send()
            .await
            .map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let rows: Vec<Vec<serde_json::Value>> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinGecko OHLC: {}", e))
        })?;

        let mut candles = candles_from_rows(rows);

        // The upstream's smallest window is one day; trim to the trailing hour
        if range == HistoryRange::OneHour {
            let cutoff = Utc::now() - Duration::hours(1);
            candles.retain(|c| c.timestamp >= cutoff);
        }

        Ok(candles)
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Coin>> {
        debug!("Fetching trending coins from CoinGecko");

        let response = self
            .get("/search/trending")
            .send()
            .await
            .map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let trending: GeckoTrendingResponse = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinGecko trending: {}", e))
        })?;

        Ok(trending
            .coins
            .into_iter()
            .take(limit)
            .map(|entry| Coin::new(entry.item.id, entry.item.name, entry.item.symbol))
            .collect())
    }

    async fn market_overview(&self) -> Result<serde_json::Value> {
        debug!("Fetching global market metrics from CoinGecko");

        let response = self.get("/global").send().await.map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinGecko market data: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gecko_days_mapping() {
        assert_eq!(gecko_days(HistoryRange::OneHour), 1);
        assert_eq!(gecko_days(HistoryRange::OneDay), 1);
        assert_eq!(gecko_days(HistoryRange::SevenDays), 7);
        assert_eq!(gecko_days(HistoryRange::OneMonth), 30);
        assert_eq!(gecko_days(HistoryRange::ThreeMonths), 90);
        assert_eq!(gecko_days(HistoryRange::OneYear), 365);
    }

    #[test]
    fn test_candles_from_rows() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_value(json!([
            [1700000000000i64, 100.0, 110.0, 95.0, 105.0],
            [1700003600000i64, 105.0, 112.0, 101.0, 108.0]
        ]))
        .unwrap();

        let candles = candles_from_rows(rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 110.0);
        assert_eq!(candles[0].low, 95.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[1].timestamp.timestamp(), 1_700_003_600);
    }

    #[test]
    fn test_candles_skip_malformed_rows() {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_value(json!([
            [1700000000000i64, 100.0, 110.0],
            ["not-a-timestamp", 100.0, 110.0, 95.0, 105.0],
            [1700003600000i64, 105.0, 112.0, 101.0, 108.0]
        ]))
        .unwrap();

        let candles = candles_from_rows(rows);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 108.0);
    }

    #[test]
    fn test_trending_response_shape() {
        let payload = json!({
            "coins": [
                {"item": {"id": "pepe", "name": "Pepe", "symbol": "PEPE", "price_btc": 0.0000001}},
                {"item": {"id": "solana", "name": "Solana", "symbol": "SOL"}}
            ]
        });

        let trending: GeckoTrendingResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(trending.coins.len(), 2);
        assert_eq!(trending.coins[0].item.id, "pepe");
        assert!(trending.coins[1].item.price_btc.is_none());
    }
}
