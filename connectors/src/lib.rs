pub mod coingecko;
pub mod coinpaprika;

use async_trait::async_trait;
use common::{
    models::{Coin, HistoryRange, OhlcCandle},
    Result,
};
use std::collections::HashMap;

/// Trait defining the interface for upstream market-data providers
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// List all coins known to the upstream (no prices)
    async fn list_coins(&self) -> Result<Vec<Coin>>;

    /// Current USD prices for the given coin ids. Ids the upstream does not
    /// know are absent from the returned map.
    async fn current_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>>;

    /// OHLC candles for a coin over the given range; may be empty
    async fn ohlc(&self, id: &str, range: HistoryRange) -> Result<Vec<OhlcCandle>>;

    /// Top coins by the upstream's own ranking
    async fn trending(&self, limit: usize) -> Result<Vec<Coin>>;

    /// Global market metrics, passed through as the vendor shapes them
    async fn market_overview(&self) -> Result<serde_json::Value>;
}
