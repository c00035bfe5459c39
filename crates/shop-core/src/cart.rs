//! # Cart Store
//!
//! The cart state container for one browsing session. Holds insertion-ordered
//! (product, quantity) pairs behind a single lock and notifies subscribers
//! synchronously with a consistent post-mutation snapshot, so no reader ever
//! observes mid-mutation state.
//!
//! The cart is not persisted across sessions unless a [`CartStorage`] hook is
//! attached.

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::{Currency, Price};
use crate::product::Product;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A product plus the quantity selected for it.
///
/// At most one `CartItem` exists per product id in a given cart; adding an
/// already-present product increments its quantity instead of duplicating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product, as fetched from the catalog
    pub product: Product,

    /// Selected quantity, always >= 1
    pub quantity: u32,
}

impl CartItem {
    /// Total price for this line (unit price x quantity)
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A consistent point-in-time copy of the cart contents.
///
/// Handed to subscribers on every mutation and to the checkout orchestrator
/// at submission time. Totals are recomputed from the items on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Items in insertion order
    pub items: Vec<CartItem>,

    /// Display currency for the cart
    pub currency: Currency,
}

impl CartSnapshot {
    /// Sum of line totals across all items
    pub fn total(&self) -> Price {
        let amount = self.items.iter().map(|i| i.line_total().amount).sum();
        Price::from_minor_units(amount, self.currency)
    }

    /// Sum of quantities, for badge display
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// True if there is nothing to check out
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pluggable persistence hook for the cart.
///
/// Not wired by default; the cart is scoped to one browsing session. Attach
/// an implementation to survive reloads.
pub trait CartStorage: Send + Sync {
    /// Load previously saved items, if any
    fn load(&self) -> CheckoutResult<Vec<CartItem>>;

    /// Save the current items
    fn save(&self, items: &[CartItem]) -> CheckoutResult<()>;
}

/// Identifier returned by [`CartStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&CartSnapshot) + Send + Sync>;

/// The cart state container.
///
/// Explicitly owned and injectable: construct one per session and share it
/// (via `Arc`) with every surface that reads cart state, so totals never
/// disagree between the listing page, the badge, and the checkout page.
pub struct CartStore {
    currency: Currency,
    items: Mutex<Vec<CartItem>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
    storage: Option<Arc<dyn CartStorage>>,
}

impl CartStore {
    /// Create an empty cart in the given display currency
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
            storage: None,
        }
    }

    /// Create a cart with a persistence hook attached.
    ///
    /// Previously saved items are loaded immediately; a load failure starts
    /// the session with an empty cart.
    pub fn with_storage(currency: Currency, storage: Arc<dyn CartStorage>) -> Self {
        let items = match storage.load() {
            Ok(items) => items,
            Err(e) => {
                warn!("Cart storage load failed, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            currency,
            items: Mutex::new(items),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
            storage: Some(storage),
        }
    }

    /// Add one unit of a product.
    ///
    /// Inserts a new item with quantity 1, or increments the existing item
    /// for that product id. Always succeeds; notifies subscribers.
    pub fn add(&self, product: &Product) {
        let snapshot = {
            let mut items = self.items.lock().expect("cart lock poisoned");
            match items.iter_mut().find(|i| i.product.id == product.id) {
                Some(item) => item.quantity += 1,
                None => items.push(CartItem {
                    product: product.clone(),
                    quantity: 1,
                }),
            }
            self.snapshot_locked(&items)
        };

        debug!("Added {} to cart, count={}", product.id, snapshot.item_count());
        self.after_mutation(&snapshot);
    }

    /// Remove an item entirely. Absent ids are a no-op, not an error.
    pub fn remove(&self, product_id: &str) {
        let snapshot = {
            let mut items = self.items.lock().expect("cart lock poisoned");
            let before = items.len();
            items.retain(|i| i.product.id != product_id);
            if items.len() == before {
                return; // nothing changed, no notification
            }
            self.snapshot_locked(&items)
        };

        debug!("Removed {} from cart", product_id);
        self.after_mutation(&snapshot);
    }

    /// Set the quantity for a product.
    ///
    /// A quantity of at least 1 sets it; exactly 0 removes the item (same as
    /// [`remove`](Self::remove)); negative values are rejected with
    /// `InvalidQuantity` before any mutation.
    pub fn set_quantity(&self, product_id: &str, quantity: i64) -> CheckoutResult<()> {
        if quantity < 0 || quantity > u32::MAX as i64 {
            return Err(CheckoutError::InvalidQuantity { quantity });
        }
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }

        let snapshot = {
            let mut items = self.items.lock().expect("cart lock poisoned");
            match items.iter_mut().find(|i| i.product.id == product_id) {
                Some(item) => item.quantity = quantity as u32,
                None => return Ok(()), // absent id is a no-op
            }
            self.snapshot_locked(&items)
        };

        self.after_mutation(&snapshot);
        Ok(())
    }

    /// Empty the cart unconditionally. Used after confirmed checkout success.
    pub fn clear(&self) {
        let snapshot = {
            let mut items = self.items.lock().expect("cart lock poisoned");
            items.clear();
            self.snapshot_locked(&items)
        };

        debug!("Cart cleared");
        self.after_mutation(&snapshot);
    }

    /// Sum of line totals. Recomputed fresh on every call.
    pub fn total(&self) -> Price {
        self.snapshot().total()
    }

    /// Sum of quantities across all items
    pub fn item_count(&self) -> u32 {
        self.snapshot().item_count()
    }

    /// Number of distinct items
    pub fn len(&self) -> usize {
        self.items.lock().expect("cart lock poisoned").len()
    }

    /// True if the cart holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take a consistent point-in-time copy of the cart
    pub fn snapshot(&self) -> CartSnapshot {
        let items = self.items.lock().expect("cart lock poisoned");
        self.snapshot_locked(&items)
    }

    /// Register a subscriber, called synchronously after every mutation with
    /// the post-mutation snapshot.
    pub fn subscribe<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push((id, Arc::new(f)));
        id
    }

    /// Remove a subscriber. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .retain(|(sid, _)| *sid != id);
    }

    fn snapshot_locked(&self, items: &[CartItem]) -> CartSnapshot {
        CartSnapshot {
            items: items.to_vec(),
            currency: self.currency,
        }
    }

    fn after_mutation(&self, snapshot: &CartSnapshot) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&snapshot.items) {
                warn!("Cart storage save failed: {}", e);
            }
        }

        // callbacks run outside the lock; a subscriber may subscribe,
        // unsubscribe, or mutate the cart without deadlocking
        let subscribers: Vec<Subscriber> = {
            let guard = self.subscribers.lock().expect("subscriber lock poisoned");
            guard.iter().map(|(_, s)| s.clone()).collect()
        };
        for subscriber in subscribers {
            subscriber(snapshot);
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}
