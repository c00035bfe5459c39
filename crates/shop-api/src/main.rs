//! # The Good Shop
//!
//! Storefront service: catalog snapshot plus the checkout outcome routes.
//!
//! ## Usage
//!
//! ```bash
//! # Optional environment
//! export CATALOG_API_URL=http://127.0.0.1:5526
//! export CHECKOUT_BACKEND_URL=http://127.0.0.1:5526
//!
//! # Run the server
//! goodshop
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state (catalog degrades to placeholders)
    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.products.len());

    let app = routes::create_router(state);

    info!("The Good Shop starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Success page: http://{}/checkout-success", addr);
        info!("Cancel page: http://{}/checkout-cancel", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
