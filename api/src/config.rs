use serde::{Deserialize, Serialize};

/// Which upstream market-data provider serves this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamProvider {
    #[serde(rename = "coingecko")]
    CoinGecko,
    #[serde(rename = "coinpaprika")]
    CoinPaprika,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the frontend bundle, served at the root path
    pub static_dir: String,
    pub provider: UpstreamProvider,
    pub coingecko_api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
            static_dir: "dist".to_string(),
            provider: UpstreamProvider::CoinGecko,
            coingecko_api_key: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8002);
        let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "dist".to_string());

        let provider = match std::env::var("UPSTREAM_PROVIDER").ok().as_deref() {
            Some("coingecko") | None => UpstreamProvider::CoinGecko,
            Some("coinpaprika") => UpstreamProvider::CoinPaprika,
            Some(unknown) => {
                return Err(format!(
                    "Unknown UPSTREAM_PROVIDER: {}. Supported providers: coingecko, coinpaprika",
                    unknown
                ))
            }
        };

        let coingecko_api_key = std::env::var("COINGECKO_API_KEY").ok();

        Ok(Self {
            host,
            port,
            static_dir,
            provider,
            coingecko_api_key,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8002);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.static_dir, "dist");
        assert_eq!(config.provider, UpstreamProvider::CoinGecko);
        assert_eq!(config.bind_addr(), "0.0.0.0:8002");
    }
}
