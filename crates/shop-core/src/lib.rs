//! # shop-core
//!
//! Core cart and checkout types for goodshop-rs.
//!
//! This crate provides:
//! - `CartStore` for per-session cart state with a subscribe/notify contract
//! - `Product` and money types (`Price`, `Currency`)
//! - `CheckoutSession` and `LineItem` for the one-shot provider handoff
//! - `PaymentFlow` trait with redirect and embedded variants
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CartStore, Currency, Product, CheckoutSession};
//!
//! let cart = CartStore::new(Currency::GBP);
//!
//! let product = Product::new("1", "Emergency Food Package", 25.0);
//! cart.add(&product);
//! cart.add(&product);
//!
//! assert_eq!(cart.total().display(), "£50.00");
//!
//! // Snapshot the cart for one checkout attempt
//! let session = CheckoutSession::from_snapshot(&cart.snapshot())?;
//! ```

pub mod cart;
pub mod error;
pub mod flow;
pub mod money;
pub mod product;
pub mod session;

// Re-exports for convenience
pub use cart::{CartItem, CartSnapshot, CartStorage, CartStore, SubscriptionId};
pub use error::{CheckoutError, CheckoutResult};
pub use flow::{
    CaptureDetails, CheckoutOutcome, CheckoutPhase, FlowKind, OrderHandle, OrderHandoff,
    PaymentFlow, SharedPaymentFlow,
};
pub use money::{Currency, Price};
pub use product::{ApiProduct, PlaceholderCatalog, PlaceholderProduct, Product};
pub use session::{CheckoutSession, LineItem};
