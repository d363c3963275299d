use std::path::PathBuf;

/// Configuration for the flat-file watchlist store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON file holding the watchlist
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("watchlist.json"),
        }
    }
}

impl StoreConfig {
    /// Create a new store configuration from environment variables
    pub fn from_env() -> Self {
        let path = std::env::var("WATCHLIST_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("watchlist.json"));

        Self { path }
    }
}
