//! # shop-api
//!
//! HTTP surface for goodshop-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The checkout outcome landing pages (success/cancel)
//! - Health check with catalog status
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/checkout-success` | Success landing page |
//! | GET | `/checkout-cancel` | Cancel landing page |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
