//! # Product Types
//!
//! Catalog product types. Products are owned by the remote catalog API and
//! are immutable once fetched; the placeholder catalog used when the API is
//! unreachable is loaded from `config/placeholder_products.toml`.

use crate::money::{Currency, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique, stable product identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Price,

    /// When the product was created in the catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Create a product from a decimal major-unit price
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: Price::new(price, Currency::default()),
            created_at: None,
        }
    }

    /// Builder: set creation timestamp
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// Wire shape of a product as returned by `GET /api/products`.
///
/// The catalog API carries the price as a decimal major-unit amount; the
/// conversion to minor units happens here, exactly once.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduct {
    pub id: serde_json::Value,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ApiProduct {
    /// Convert into the domain product, fixing the display currency
    pub fn into_product(self, currency: Currency) -> Product {
        let id = match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Product {
            id,
            name: self.name,
            price: Price::new(self.price, currency),
            created_at: self
                .created_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

/// Placeholder catalog definition, loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceholderCatalog {
    #[serde(default)]
    pub products: Vec<PlaceholderProduct>,
}

/// A single placeholder product entry
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceholderProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl PlaceholderCatalog {
    /// Parse a placeholder catalog from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Materialize the placeholder entries as domain products
    pub fn into_products(self, currency: Currency) -> Vec<Product> {
        self.products
            .into_iter()
            .map(|p| Product {
                id: p.id,
                name: p.name,
                price: Price::new(p.price, currency),
                created_at: None,
            })
            .collect()
    }
}
