use crate::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{
    models::{Coin, HistoryRange, OhlcCandle},
    Error, Result,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

const COINPAPRIKA_API_URL: &str = "https://api.coinpaprika.com/v1";

pub struct CoinPaprikaProvider {
    client: reqwest::Client,
}

impl CoinPaprikaProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for CoinPaprikaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PaprikaCoin {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    rank: i64,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct PaprikaTicker {
    quotes: HashMap<String, PaprikaQuote>,
}

#[derive(Debug, Deserialize)]
struct PaprikaQuote {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct PaprikaCandle {
    time_open: DateTime<Utc>,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
}

// Pick the historical OHLCV interval for a range. Sub-week ranges use hourly
// candles, everything longer uses daily.
fn paprika_interval(range: HistoryRange) -> &'static str {
    match range {
        HistoryRange::OneHour | HistoryRange::OneDay => "1h",
        HistoryRange::SevenDays => "1h",
        HistoryRange::OneMonth | HistoryRange::ThreeMonths | HistoryRange::OneYear => "1d",
    }
}

fn candles_from_paprika(rows: Vec<PaprikaCandle>) -> Vec<OhlcCandle> {
    rows.into_iter()
        .filter_map(|row| {
            // Rows with missing fields are dropped, not zero-filled
            Some(OhlcCandle {
                timestamp: row.time_open,
                open: row.open?,
                high: row.high?,
                low: row.low?,
                close: row.close?,
            })
        })
        .collect()
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!("CoinPaprika API error: {} - {}", status, error_text);
        return Err(Error::UpstreamError(format!(
            "CoinPaprika API error: {} - {}",
            status, error_text
        )));
    }
    Ok(response)
}

#[async_trait]
impl MarketDataProvider for CoinPaprikaProvider {
    async fn list_coins(&self) -> Result<Vec<Coin>> {
        debug!("Fetching coin list from CoinPaprika");

        let url = format!("{}/coins", COINPAPRIKA_API_URL);
        let response = self.client.get(&url).send().await.map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let coins: Vec<PaprikaCoin> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinPaprika coin list: {}", e))
        })?;

        Ok(coins
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| Coin::new(c.id, c.name, c.symbol))
            .collect())
    }

    async fn current_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
        let mut prices = HashMap::new();

        // One ticker call per id; unknown ids are skipped rather than failing
        // the whole lookup
        for id in ids {
            let url = format!("{}/tickers/{}", COINPAPRIKA_API_URL, id);

            debug!("Fetching ticker from CoinPaprika: {}", url);

            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("CoinPaprika ticker request for {} failed: {}", id, e);
                    continue;
                }
            };

            if !response.status().is_success() {
                warn!(
                    "CoinPaprika ticker for {} returned {}",
                    id,
                    response.status()
                );
                continue;
            }

            let ticker: PaprikaTicker = match response.json().await {
                Ok(ticker) => ticker,
                Err(e) => {
                    warn!("Failed to parse CoinPaprika ticker for {}: {}", id, e);
                    continue;
                }
            };

            if let Some(quote) = ticker.quotes.get("USD") {
                prices.insert(id.clone(), quote.price);
            }
        }

        Ok(prices)
    }

    async fn ohlc(&self, id: &str, range: HistoryRange) -> Result<Vec<OhlcCandle>> {
        let start = Utc::now() - Duration::seconds(range.as_secs());
        let interval = paprika_interval(range);
        let url = format!("{}/coins/{}/ohlcv/historical", COINPAPRIKA_API_URL, id);

        debug!(
            "Fetching OHLCV from CoinPaprika: {} (range: {}, interval: {})",
            url, range, interval
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start", start.to_rfc3339()),
                ("interval", interval.to_string()),
            ])
            .send()
            .await
            .map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let rows: Vec<PaprikaCandle> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinPaprika OHLCV: {}", e))
        })?;

        Ok(candles_from_paprika(rows))
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Coin>> {
        debug!("Deriving trending coins from CoinPaprika rank order");

        let url = format!("{}/coins", COINPAPRIKA_API_URL);
        let response = self.client.get(&url).send().await.map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        let mut coins: Vec<PaprikaCoin> = response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinPaprika coin list: {}", e))
        })?;

        coins.retain(|c| c.is_active && c.rank > 0);
        coins.sort_by_key(|c| c.rank);

        Ok(coins
            .into_iter()
            .take(limit)
            .map(|c| Coin::new(c.id, c.name, c.symbol))
            .collect())
    }

    async fn market_overview(&self) -> Result<serde_json::Value> {
        debug!("Fetching global market metrics from CoinPaprika");

        let url = format!("{}/global", COINPAPRIKA_API_URL);
        let response = self.client.get(&url).send().await.map_err(Error::HttpError)?;
        let response = check_status(response).await?;

        response.json().await.map_err(|e| {
            Error::ParseError(format!("Failed to parse CoinPaprika market data: {}", e))
        })
    }
}
