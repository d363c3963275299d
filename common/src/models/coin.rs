use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coin {
    /// Unique identifier assigned by the upstream provider (e.g., "bitcoin")
    pub id: String,
    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,
    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,
    /// Last known USD price; None when the upstream omits it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Coin {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            price: None,
        }
    }
}
