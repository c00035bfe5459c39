//! # Application State
//!
//! Shared state for the axum application: server configuration and the
//! catalog snapshot loaded at startup (placeholder-backed, so a dead catalog
//! never blocks startup).

use shop_checkout::CatalogClient;
use shop_core::Product;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL the landing routes are reachable under
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Catalog snapshot loaded at startup (placeholders if the API is down)
    pub products: Vec<Product>,
}

impl AppState {
    /// Build state, degrading to the placeholder catalog on fetch failure
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let catalog = CatalogClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to configure catalog client: {}", e))?;
        let products = catalog.fetch_products().await;

        Ok(Self { config, products })
    }

    /// Build state with explicit values (for testing)
    pub fn with_products(config: AppConfig, products: Vec<Product>) -> Self {
        Self { config, products }
    }
}
