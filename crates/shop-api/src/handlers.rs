//! # Request Handlers
//!
//! Handlers for the shop's outcome routes. The success and cancel landing
//! pages are terminal states of a checkout attempt: static displays with a
//! return-to-shop action, reading no checkout state.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "goodshop",
        "version": env!("CARGO_PKG_VERSION"),
        "products": state.products.len(),
    }))
}

/// Checkout success landing page.
///
/// A static terminal display; it reads no checkout state and ignores any
/// query parameters the provider appends to the return URL.
pub async fn checkout_success() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Payment Successful</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="text-align: center;">
        <h1>Payment Successful!</h1>
        <p>Thank you for your purchase. Your payment has been processed successfully.</p>
        <p><a href="/">Return to Shop</a></p>
    </div>
</body>
</html>
"#,
    )
}

/// Checkout cancel landing page
pub async fn checkout_cancel() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Payment Cancelled</title></head>
<body style="font-family: system-ui; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0;">
    <div style="text-align: center;">
        <h1>Payment Cancelled</h1>
        <p>Your payment was cancelled. You can try again or return to the shop. No charges were made.</p>
        <p><a href="/">Return to Shop</a></p>
    </div>
</body>
</html>
"#,
    )
}
