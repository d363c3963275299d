use chrono::Utc;
use common::{
    models::{Coin, HistoryRange, OhlcCandle},
    Error, Result,
};
use connectors::MarketDataProvider;
use std::sync::Arc;
use store::WatchlistStore;
use tracing::{debug, error};

/// Search results are cut off after this many coins
const SEARCH_RESULT_LIMIT: usize = 20;

/// How many coins the trending endpoint returns
const TRENDING_LIMIT: usize = 10;

// Query words in one group match names/symbols in the same group
const SYNONYM_GROUPS: &[&[&str]] = &[&["bitcoin", "btc"], &["ethereum", "ether", "eth"]];

/// Service tying the upstream provider and the watchlist store together
pub struct CoinService {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<WatchlistStore>,
}

impl CoinService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, store: Arc<WatchlistStore>) -> Self {
        Self { provider, store }
    }

    /// List all coins known to the upstream
    pub async fn list_coins(&self) -> Result<Vec<Coin>> {
        self.provider.list_coins().await
    }

    /// Search the upstream coin list, exact matches ranked first
    pub async fn search(&self, query: &str) -> Result<Vec<Coin>> {
        debug!("Searching coins for query: {}", query);

        let coins = self.provider.list_coins().await?;
        Ok(rank_matches(query, coins, SEARCH_RESULT_LIMIT))
    }

    /// The stored watchlist with live USD prices
    pub async fn watchlist(&self) -> Result<Vec<Coin>> {
        let coins = self.store.load().await.map_err(Error::from)?;
        Ok(self.enrich(coins).await)
    }

    /// Add a coin to the watchlist; a present id is a no-op
    pub async fn add_to_watchlist(&self, coin: Coin) -> Result<Vec<Coin>> {
        debug!("Adding '{}' to watchlist", coin.id);

        let coins = self.store.add(coin).await.map_err(Error::from)?;
        Ok(self.enrich(coins).await)
    }

    /// Replace the watchlist wholesale and re-enrich prices
    pub async fn replace_watchlist(&self, coins: Vec<Coin>) -> Result<Vec<Coin>> {
        debug!("Replacing watchlist with {} entries", coins.len());

        let coins = self.store.replace(coins).await.map_err(Error::from)?;
        Ok(self.enrich(coins).await)
    }

    /// Remove a coin from the watchlist by id
    pub async fn remove_from_watchlist(&self, id: &str) -> Result<Vec<Coin>> {
        debug!("Removing '{}' from watchlist", id);

        let coins = self.store.remove(id).await.map_err(Error::from)?;
        Ok(self.enrich(coins).await)
    }

    /// Top coins by the upstream's own ranking
    pub async fn trending(&self) -> Result<Vec<Coin>> {
        self.provider.trending(TRENDING_LIMIT).await
    }

    /// OHLC history for a coin. When the upstream has no candles for the
    /// range, degrade to a single flat candle at the current price.
    pub async fn price_history(&self, id: &str, range: HistoryRange) -> Result<Vec<OhlcCandle>> {
        let candles = self.provider.ohlc(id, range).await?;
        if !candles.is_empty() {
            return Ok(candles);
        }

        debug!(
            "No OHLC rows for {} over {}, falling back to spot price",
            id, range
        );

        let ids = vec![id.to_string()];
        let prices = self.provider.current_prices(&ids).await?;
        let price = prices
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("No price data for coin '{}'", id)))?;

        Ok(vec![OhlcCandle::flat(Utc::now(), price)])
    }

    /// Global market metrics passthrough
    pub async fn market(&self) -> Result<serde_json::Value> {
        self.provider.market_overview().await
    }

    // Attach live prices to a list of coins. A failed price lookup serves
    // the stored entries unchanged.
    async fn enrich(&self, mut coins: Vec<Coin>) -> Vec<Coin> {
        if coins.is_empty() {
            return coins;
        }

        let ids: Vec<String> = coins.iter().map(|c| c.id.clone()).collect();
        match self.provider.current_prices(&ids).await {
            Ok(prices) => {
                for coin in &mut coins {
                    if let Some(price) = prices.get(&coin.id) {
                        coin.price = Some(*price);
                    }
                }
            }
            Err(e) => {
                error!("Price enrichment failed, serving stored prices: {}", e);
            }
        }

        coins
    }
}

fn words_match(query_word: &str, target: &str) -> bool {
    if query_word == target {
        return true;
    }
    SYNONYM_GROUPS
        .iter()
        .any(|group| group.contains(&query_word) && group.contains(&target))
}

/// Rank coins against a query: exact name/symbol matches first (upstream
/// order preserved within each class), then substring matches, cut off at
/// `limit`.
fn rank_matches(query: &str, coins: Vec<Coin>, limit: usize) -> Vec<Coin> {
    let query = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();

    let mut exact = Vec::new();
    let mut partial = Vec::new();

    for coin in coins {
        let name = coin.name.to_lowercase();
        let symbol = coin.symbol.to_lowercase();

        if words
            .iter()
            .any(|w| words_match(w, &name) || words_match(w, &symbol))
        {
            exact.push(coin);
        } else if words.iter().any(|w| name.contains(w) || symbol.contains(w)) {
            partial.push(coin);
        }
    }

    exact.extend(partial);
    exact.truncate(limit);
    exact
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, name: &str, symbol: &str) -> Coin {
        Coin::new(id, name, symbol)
    }

    fn ids(coins: &[Coin]) -> Vec<&str> {
        coins.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_exact_symbol_ranks_before_substring() {
        let coins = vec![
            coin("btcpay", "BTCPay Token", "BTCP"),
            coin("bitcoin", "Bitcoin", "BTC"),
            coin("wrapped-btc", "Wrapped BTC Plus", "WBTCX"),
        ];

        let results = rank_matches("btc", coins, 20);
        assert_eq!(ids(&results), ["bitcoin", "btcpay", "wrapped-btc"]);
    }

    #[test]
    fn test_bitcoin_synonym_group() {
        let coins = vec![
            coin("some-token", "BTC Miners", "BM"),
            coin("bitcoin", "Bitcoin", "XYZ"),
        ];

        // "btc" exact-matches the name "bitcoin" through the synonym group,
        // beating the substring match despite upstream order
        let results = rank_matches("btc", coins, 20);
        assert_eq!(ids(&results), ["bitcoin", "some-token"]);
    }

    #[test]
    fn test_ethereum_synonym_group() {
        let coins = vec![
            coin("ethereum-classic", "Ethereum Classic", "ETC"),
            coin("ethereum", "Some Chain", "ETH"),
            coin("ether-token", "Ether", "XQQ"),
        ];

        let results = rank_matches("ethereum", coins, 20);
        // Symbol "eth" and name "ether" are both in the ethereum group;
        // "Ethereum Classic" only contains the query as a substring
        assert_eq!(ids(&results), ["ethereum", "ether-token", "ethereum-classic"]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let coins = vec![coin("solana", "Solana", "SOL")];

        let results = rank_matches("SOL", coins, 20);
        assert_eq!(ids(&results), ["solana"]);
    }

    #[test]
    fn test_multi_word_query_matches_any_word() {
        let coins = vec![
            coin("cardano", "Cardano", "ADA"),
            coin("solana", "Solana", "SOL"),
            coin("ripple", "XRP", "XRP"),
        ];

        let results = rank_matches("ada sol", coins, 20);
        assert_eq!(ids(&results), ["cardano", "solana"]);
    }

    #[test]
    fn test_truncation() {
        let coins: Vec<Coin> = (0..50)
            .map(|i| coin(&format!("coin-{}", i), &format!("Coinium {}", i), "CNM"))
            .collect();

        let results = rank_matches("coinium", coins, 20);
        assert_eq!(results.len(), 20);
    }

    #[test]
    fn test_no_match_is_empty() {
        let coins = vec![coin("bitcoin", "Bitcoin", "BTC")];

        assert!(rank_matches("dogecoin", coins.clone(), 20).is_empty());
        assert!(rank_matches("   ", coins, 20).is_empty());
    }
}
