use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Watchlist file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watchlist serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Watchlist entry not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for common::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => {
                common::Error::NotFound(format!("Coin with ID '{}' not in watchlist", id))
            }
            other => common::Error::StoreError(other.to_string()),
        }
    }
}
