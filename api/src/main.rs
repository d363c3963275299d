mod config;
mod handler;
mod service;

use axum::{
    routing::{delete, get},
    Router,
};
use config::{ApiConfig, UpstreamProvider};
use connectors::{
    coingecko::CoinGeckoProvider, coinpaprika::CoinPaprikaProvider, MarketDataProvider,
};
use service::CoinService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting coindeck API");

    // Load configuration from environment
    let config = ApiConfig::from_env()
        .map_err(|e| format!("Failed to load API configuration: {}", e))?;

    // Flat-file watchlist store
    let store_config = store::StoreConfig::from_env();
    info!("Watchlist file: {:?}", store_config.path);
    let watchlist = Arc::new(store::WatchlistStore::new(store_config));

    // Upstream market-data provider, selected by configuration
    let provider: Arc<dyn MarketDataProvider> = match config.provider {
        UpstreamProvider::CoinGecko => {
            info!("Upstream provider: CoinGecko");
            Arc::new(CoinGeckoProvider::new(config.coingecko_api_key.clone()))
        }
        UpstreamProvider::CoinPaprika => {
            info!("Upstream provider: CoinPaprika");
            Arc::new(CoinPaprikaProvider::new())
        }
    };

    let service = Arc::new(CoinService::new(provider, watchlist));

    // Create CORS middleware
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Create Axum router with API routes
    let mut app = Router::new()
        .route("/api/coins", get(handler::list_coins))
        .route("/api/search/:query", get(handler::search))
        .route(
            "/api/watchlist",
            get(handler::get_watchlist)
                .post(handler::post_watchlist)
                .put(handler::put_watchlist),
        )
        .route("/api/watchlist/:id", delete(handler::delete_watchlist))
        .route("/api/trending", get(handler::trending))
        .route("/api/price_history/:id", get(handler::price_history))
        .route("/api/market", get(handler::market))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service);

    // Serve the frontend bundle at the root path when it exists
    let static_dir = std::path::Path::new(&config.static_dir);
    if static_dir.is_dir() {
        info!("Serving static assets from {:?}", static_dir);
        app = app.fallback_service(
            ServeDir::new(static_dir).append_index_html_on_directories(true),
        );
    } else {
        error!(
            "Static directory {:?} does not exist - skipping static file serving",
            static_dir
        );
    }

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
