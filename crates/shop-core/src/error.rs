//! # Checkout Error Types
//!
//! Typed error handling for the cart and checkout core.
//! Cart-mutation errors are validation-only and rejected before any state
//! changes; checkout errors are surfaced to the caller as retryable and
//! never clear the cart.

use thiserror::Error;

/// Core error type for cart and checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout was submitted with an empty cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Quantity update rejected before mutation
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// A snapshotted line item has a non-positive price or quantity
    #[error("Invalid line item {product_id}: {reason}")]
    InvalidLineItem { product_id: String, reason: String },

    /// The payment backend refused or failed to create a session
    #[error("Checkout session creation failed: {0}")]
    SessionCreationFailed(String),

    /// A submission is already in flight for this attempt
    #[error("Checkout submission already in flight")]
    SubmissionInFlight,

    /// Catalog fetch failed (recovered locally via placeholder data)
    #[error("Catalog fetch failed: {0}")]
    CatalogFetchFailed(String),

    /// The embedded provider widget reported an approval/capture error
    #[error("Provider approval error: {0}")]
    ProviderApproval(String),

    /// Configuration errors (missing env vars, invalid URLs)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CheckoutError {
    /// Returns true if the caller should offer a retry affordance
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::SessionCreationFailed(_)
                | CheckoutError::SubmissionInFlight
                | CheckoutError::CatalogFetchFailed(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::EmptyCart => 400,
            CheckoutError::InvalidQuantity { .. } => 400,
            CheckoutError::InvalidLineItem { .. } => 400,
            CheckoutError::SessionCreationFailed(_) => 502,
            CheckoutError::SubmissionInFlight => 409,
            CheckoutError::CatalogFetchFailed(_) => 503,
            CheckoutError::ProviderApproval(_) => 502,
            CheckoutError::Configuration(_) => 500,
        }
    }
}

/// Result type alias for cart and checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
