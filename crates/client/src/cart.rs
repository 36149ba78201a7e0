//! Locally persisted shopping cart.
//!
//! The stored line sequence is the only state. Totals and counts are derived
//! from it on every call and never cached, so they cannot drift from what is
//! persisted. Every mutation ends with [`CartStore::notify`], which pushes
//! the new count to registered displays and broadcasts a [`CartUpdated`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use fastbite_core::models::{CartItemRequest, CreateOrderRequest, Product};
use fastbite_core::{Price, ProductId};

use crate::storage::{KeyValueStore, StorageError, keys};

const UPDATE_BUFFER: usize = 16;

/// One product line in the cart.
///
/// Name and price are snapshots taken when the product was first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Change event broadcast after every cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdated {
    pub items: Vec<CartLine>,
    pub total: Price,
}

/// Reasons an order cannot be built from the cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Your cart is empty")]
    Empty,

    #[error("A delivery address is required")]
    MissingAddress,
}

/// A surface showing the number of items in the cart.
pub trait CountDisplay: Send + Sync {
    /// Show `count`.
    fn set_count(&self, count: u64);
}

/// The cart working set.
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    updates: broadcast::Sender<CartUpdated>,
    displays: Mutex<Vec<Arc<dyn CountDisplay>>>,
    mutation: Mutex<()>,
}

impl CartStore {
    /// Create a cart persisted in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            store,
            updates,
            displays: Mutex::new(Vec::new()),
            mutation: Mutex::new(()),
        }
    }

    /// Current lines, in insertion order.
    ///
    /// Missing, unreadable, or corrupt stored data yields an empty cart.
    #[must_use]
    pub fn items(&self) -> Vec<CartLine> {
        let raw = match self.store.get(keys::CART) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "cart storage read failed; treating cart as empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored cart is corrupt; treating cart as empty");
            Vec::new()
        })
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add_item(&self, product: &Product) -> Result<(), StorageError> {
        let _guard = self.lock_mutation();
        let mut items = self.items();

        match items.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => items.push(CartLine {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: 1,
            }),
        }

        debug!(product_id = %product.id, "cart item added");
        self.save(&items)
    }

    /// Drop the line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove_item(&self, product_id: &ProductId) -> Result<(), StorageError> {
        let _guard = self.lock_mutation();
        self.remove_locked(product_id)
    }

    /// Set the quantity for `product_id`; zero or less removes the line.
    ///
    /// Products not in the cart are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<(), StorageError> {
        let _guard = self.lock_mutation();
        let mut items = self.items();

        let Some(line) = items.iter_mut().find(|line| &line.product_id == product_id) else {
            debug!(product_id = %product_id, "quantity update for product not in cart");
            return Ok(());
        };

        if quantity <= 0 {
            return self.remove_locked(product_id);
        }

        line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.save(&items)
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items().iter().map(CartLine::subtotal).sum()
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items().iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if stored cart data cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock_mutation();
        self.store.remove(keys::CART)?;
        debug!("cart cleared");
        self.notify();
        Ok(())
    }

    /// Publish the current cart to displays and subscribers.
    pub fn notify(&self) {
        let items = self.items();
        let count: u64 = items.iter().map(|line| u64::from(line.quantity)).sum();
        let total: Price = items.iter().map(CartLine::subtotal).sum();

        for display in self.displays.lock().unwrap_or_else(PoisonError::into_inner).iter() {
            display.set_count(count);
        }

        // No subscribers is fine.
        let _ = self.updates.send(CartUpdated { items, total });
    }

    /// Register a count display. It is updated on the next notification.
    pub fn attach_display(&self, display: Arc<dyn CountDisplay>) {
        self.displays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(display);
    }

    /// Receive a [`CartUpdated`] after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartUpdated> {
        self.updates.subscribe()
    }

    /// Shape the cart into an order submission.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] for an empty cart and
    /// [`CartError::MissingAddress`] for a blank address.
    pub fn order_request(
        &self,
        delivery_address: &str,
        notes: Option<&str>,
    ) -> Result<CreateOrderRequest, CartError> {
        let items = self.items();
        if items.is_empty() {
            return Err(CartError::Empty);
        }

        let delivery_address = delivery_address.trim();
        if delivery_address.is_empty() {
            return Err(CartError::MissingAddress);
        }

        Ok(CreateOrderRequest {
            delivery_address: delivery_address.to_owned(),
            notes: notes.map(str::trim).filter(|n| !n.is_empty()).map(str::to_owned),
            items: items
                .into_iter()
                .map(|line| CartItemRequest {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
        })
    }

    fn remove_locked(&self, product_id: &ProductId) -> Result<(), StorageError> {
        let items: Vec<_> = self
            .items()
            .into_iter()
            .filter(|line| &line.product_id != product_id)
            .collect();
        debug!(product_id = %product_id, "cart item removed");
        self.save(&items)
    }

    fn save(&self, items: &[CartLine]) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(items).map_err(|source| StorageError::Encode {
            key: keys::CART.to_string(),
            source,
        })?;
        self.store.set(keys::CART, &encoded)?;
        self.notify();
        Ok(())
    }

    // Guards read-modify-write sequences only; nothing to repair after a panic.
    fn lock_mutation(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
