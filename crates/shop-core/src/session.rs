//! # Checkout Session Types
//!
//! A `CheckoutSession` is the one-shot, provider-facing representation of the
//! cart built per checkout attempt. Line items and the total are snapshotted
//! at submission time; the session is consumed once by the provider flow and
//! discarded after the terminal outcome, never reused.

use crate::cart::CartSnapshot;
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line item snapshotted from the cart at submission time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product ID
    pub product_id: String,

    /// Product name (denormalized for the provider's display)
    pub name: String,

    /// Unit price
    pub unit_price: Price,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    /// Total price for this line item
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An ephemeral checkout attempt, created on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Unique attempt ID (generated)
    pub id: String,

    /// Line items snapshotted from the cart
    pub line_items: Vec<LineItem>,

    /// Total computed once at construction, the single authoritative
    /// derivation of the amount sent to the payment backend
    pub total: Price,

    /// Idempotency key (prevents duplicate provider-side orders)
    pub idempotency_key: String,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Build a session from a cart snapshot.
    ///
    /// Fails with `EmptyCart` for an empty snapshot and with
    /// `InvalidLineItem` if any item has a non-positive price or quantity.
    /// No network activity happens here.
    pub fn from_snapshot(snapshot: &CartSnapshot) -> CheckoutResult<Self> {
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut line_items = Vec::with_capacity(snapshot.items.len());
        for item in &snapshot.items {
            if item.quantity == 0 {
                return Err(CheckoutError::InvalidLineItem {
                    product_id: item.product.id.clone(),
                    reason: "quantity must be positive".to_string(),
                });
            }
            if item.product.price.amount <= 0 {
                return Err(CheckoutError::InvalidLineItem {
                    product_id: item.product.id.clone(),
                    reason: "unit price must be positive".to_string(),
                });
            }

            line_items.push(LineItem {
                product_id: item.product.id.clone(),
                name: item.product.name.clone(),
                unit_price: item.product.price,
                quantity: item.quantity,
            });
        }

        let total_amount: i64 = line_items.iter().map(|i| i.total().amount).sum();
        let total = Price::from_minor_units(total_amount, snapshot.currency);

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            line_items,
            total,
            idempotency_key: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        })
    }

    /// The total in the backend's minor unit (pence, cents).
    ///
    /// Derived from the authoritative total, never recomputed from the
    /// items in a second code path.
    pub fn total_minor_units(&self) -> i64 {
        self.total.amount
    }

    /// Sum of quantities across the line items
    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|i| i.quantity).sum()
    }
}
