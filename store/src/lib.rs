mod config;
mod error;
mod watchlist_store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use watchlist_store::WatchlistStore;
