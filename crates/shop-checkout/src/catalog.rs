//! # Catalog Client
//!
//! Fetches the product list from the remote catalog API. The catalog is an
//! external collaborator; when it is down, slow, or returns garbage, the
//! shop degrades to placeholder products instead of failing the page.

use reqwest::Client;
use shop_core::{ApiProduct, CheckoutError, CheckoutResult, Currency, PlaceholderCatalog, Product};
use std::env;
use tracing::{debug, info, warn};

/// Built-in placeholder entries, used when neither the catalog API nor the
/// placeholder config file is available.
const FALLBACK_PRODUCTS: &[(&str, &str, f64)] = &[
    ("1", "Emergency Food Package", 25.0),
    ("2", "Medical Supplies Kit", 50.0),
];

/// Configuration for the catalog API
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: String,

    /// Request timeout in seconds (kept short so a dead catalog does not
    /// stall page render)
    pub timeout_secs: u64,

    /// Display currency applied to fetched prices
    pub currency: Currency,
}

impl CatalogConfig {
    /// Load from environment variables (`CATALOG_API_URL`)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            base_url: env::var("CATALOG_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5526".to_string()),
            timeout_secs: 2,
            currency: Currency::default(),
        }
    }

    /// Create config with an explicit base URL (for testing)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 2,
            currency: Currency::default(),
        }
    }

    /// Full URL of the products endpoint
    pub fn products_endpoint(&self) -> String {
        format!("{}/api/products", self.base_url)
    }
}

/// Client for the remote product catalog
pub struct CatalogClient {
    config: CatalogConfig,
    client: Client,
}

impl CatalogClient {
    /// Create a catalog client
    pub fn new(config: CatalogConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckoutError::Configuration(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(CatalogConfig::from_env())
    }

    /// Fetch the product list, falling back to placeholders on any failure.
    ///
    /// Never fails: a dead catalog degrades the page, it does not block it.
    pub async fn fetch_products(&self) -> Vec<Product> {
        match self.try_fetch().await {
            Ok(products) => {
                info!("Loaded {} products from catalog", products.len());
                products
            }
            Err(e) => {
                warn!("{}, using placeholder catalog", e);
                placeholder_products(self.config.currency)
            }
        }
    }

    /// Fetch the product list, surfacing the failure to the caller
    pub async fn try_fetch(&self) -> CheckoutResult<Vec<Product>> {
        let endpoint = self.config.products_endpoint();
        debug!("Fetching products from {}", endpoint);

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| CheckoutError::CatalogFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::CatalogFetchFailed(format!(
                "HTTP {}",
                status
            )));
        }

        let api_products: Vec<ApiProduct> = response
            .json()
            .await
            .map_err(|e| CheckoutError::CatalogFetchFailed(e.to_string()))?;

        Ok(api_products
            .into_iter()
            .map(|p| p.into_product(self.config.currency))
            .collect())
    }
}

/// Placeholder catalog used while the API is unavailable.
///
/// Tries `config/placeholder_products.toml` first, then falls back to the
/// built-in entries.
pub fn placeholder_products(currency: Currency) -> Vec<Product> {
    let config_paths = [
        "config/placeholder_products.toml",
        "../config/placeholder_products.toml",
        "../../config/placeholder_products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match PlaceholderCatalog::from_toml(&content) {
                Ok(catalog) => {
                    let products = catalog.into_products(currency);
                    if !products.is_empty() {
                        debug!("Loaded {} placeholder products from {}", products.len(), path);
                        return products;
                    }
                }
                Err(e) => warn!("Failed to parse {}: {}", path, e),
            }
        }
    }

    FALLBACK_PRODUCTS
        .iter()
        .map(|(id, name, price)| Product {
            id: (*id).to_string(),
            name: (*name).to_string(),
            price: shop_core::Price::new(*price, currency),
            created_at: None,
        })
        .collect()
}
