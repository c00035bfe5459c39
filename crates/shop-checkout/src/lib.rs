//! # shop-checkout
//!
//! Checkout orchestration for goodshop-rs.
//!
//! This crate provides:
//! - `CheckoutOrchestrator` driving one checkout attempt at a time over a
//!   shared `CartStore`
//! - `RedirectFlow` for provider-hosted payment pages (the session backend
//!   returns a URL to navigate to)
//! - `EmbeddedFlow` + `OrderGateway` for in-page provider widgets
//! - `CatalogClient` with placeholder fallback for the remote product list
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_checkout::{CheckoutOrchestrator, RedirectFlow};
//! use shop_core::{CartStore, Currency, OrderHandoff};
//! use std::sync::Arc;
//!
//! let cart = Arc::new(CartStore::new(Currency::GBP));
//! let flow = Arc::new(RedirectFlow::from_env()?);
//! let orchestrator = CheckoutOrchestrator::new(cart, flow);
//!
//! match orchestrator.submit().await? {
//!     OrderHandoff::Redirect { url } => {
//!         // navigate the browser to `url`
//!     }
//!     OrderHandoff::Approval { order } => {
//!         // the provider widget drives `order` to approval
//!     }
//! }
//! ```

pub mod catalog;
pub mod embedded;
pub mod orchestrator;
pub mod redirect;

// Re-exports
pub use catalog::{placeholder_products, CatalogClient, CatalogConfig};
pub use embedded::{EmbeddedFlow, OrderGateway, SharedOrderGateway};
pub use orchestrator::CheckoutOrchestrator;
pub use redirect::{BackendConfig, RedirectFlow};
