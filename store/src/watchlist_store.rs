use crate::{StoreConfig, StoreError};
use common::models::Coin;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Watchlist persistence over a single JSON file.
///
/// Every mutation is a whole-file read-modify-write; the file is replaced
/// via a sibling temp file plus rename so readers never observe a partial
/// write. There is no cross-process locking; concurrent writers can race.
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { path: config.path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full watchlist. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<Coin>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn save(&self, coins: &[Coin]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(coins)?;

        // Temp file lives next to the target so the rename stays on one
        // filesystem
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!("Saved watchlist: {} entries to {:?}", coins.len(), self.path);
        Ok(())
    }

    /// Append a coin unless its id is already present; returns the updated
    /// list either way.
    pub async fn add(&self, coin: Coin) -> Result<Vec<Coin>, StoreError> {
        let mut coins = self.load().await?;

        if coins.iter().any(|c| c.id == coin.id) {
            debug!("Coin '{}' already in watchlist, skipping insert", coin.id);
            return Ok(coins);
        }

        coins.push(coin);
        self.save(&coins).await?;
        Ok(coins)
    }

    /// Replace the whole list, collapsing duplicate ids to their first
    /// occurrence while keeping order.
    pub async fn replace(&self, coins: Vec<Coin>) -> Result<Vec<Coin>, StoreError> {
        let mut deduped: Vec<Coin> = Vec::with_capacity(coins.len());
        for coin in coins {
            if !deduped.iter().any(|c| c.id == coin.id) {
                deduped.push(coin);
            }
        }

        self.save(&deduped).await?;
        Ok(deduped)
    }

    /// Remove the entry with the given id; the file is untouched when the
    /// id is absent.
    pub async fn remove(&self, id: &str) -> Result<Vec<Coin>, StoreError> {
        let mut coins = self.load().await?;

        let position = coins
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        coins.remove(position);
        self.save(&coins).await?;
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> WatchlistStore {
        WatchlistStore::new(StoreConfig {
            path: dir.path().join("watchlist.json"),
        })
    }

    fn coin(id: &str, name: &str, symbol: &str) -> Coin {
        Coin::new(id, name, symbol)
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_on_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let first = store.add(coin("bitcoin", "Bitcoin", "BTC")).await.unwrap();
        assert_eq!(first.len(), 1);

        // Same id again, different name: no second insert, no overwrite
        let second = store.add(coin("bitcoin", "Bitcoin Again", "BTC")).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Bitcoin");

        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_present_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.add(coin("bitcoin", "Bitcoin", "BTC")).await.unwrap();
        store.add(coin("ethereum", "Ethereum", "ETH")).await.unwrap();

        let remaining = store.remove("bitcoin").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "ethereum");
    }

    #[tokio::test]
    async fn test_remove_absent_id_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.add(coin("bitcoin", "Bitcoin", "BTC")).await.unwrap();
        let before = fs::read(store.path()).await.unwrap();

        let result = store.remove("dogecoin").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let after = fs::read(store.path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_replace_round_trips_order_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store
            .replace(vec![
                coin("solana", "Solana", "SOL"),
                coin("bitcoin", "Bitcoin", "BTC"),
                coin("solana", "Solana Duplicate", "SOL"),
                coin("cardano", "Cardano", "ADA"),
            ])
            .await
            .unwrap();

        let ids: Vec<&str> = stored.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["solana", "bitcoin", "cardano"]);
        assert_eq!(stored[0].name, "Solana");

        let reloaded = store.load().await.unwrap();
        let reloaded_ids: Vec<&str> = reloaded.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(reloaded_ids, ["solana", "bitcoin", "cardano"]);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.add(coin("bitcoin", "Bitcoin", "BTC")).await.unwrap();

        assert!(!dir.path().join("watchlist.json.tmp").exists());
        assert!(store.path().exists());
    }
}
