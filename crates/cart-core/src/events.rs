//! # Checkout Domain Events
//!
//! Item mutations emit an event once they are persisted. Discount,
//! purchaser and custom-field changes, restores and destroys do not.

use crate::error::CheckoutResult;
use crate::item::CartItem;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Event emitted after an item mutation has been saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "item", rename_all = "snake_case")]
pub enum CheckoutEvent {
    ItemAdded(CartItem),
    ItemUpdated(CartItem),
    ItemDeleted(CartItem),
}

impl CheckoutEvent {
    pub fn item(&self) -> &CartItem {
        match self {
            CheckoutEvent::ItemAdded(item)
            | CheckoutEvent::ItemUpdated(item)
            | CheckoutEvent::ItemDeleted(item) => item,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::ItemAdded(_) => "item_added",
            CheckoutEvent::ItemUpdated(_) => "item_updated",
            CheckoutEvent::ItemDeleted(_) => "item_deleted",
        }
    }
}

/// Checkout event handler trait
///
/// Implement this trait to observe item mutations (projections,
/// notifications, audit logs).
pub trait CheckoutEventHandler: Send + Sync {
    /// Called after an item was added or its quantity replaced via add
    fn on_item_added(&self, item: &CartItem) -> CheckoutResult<()> {
        info!(
            "Item added: cart={}, item={:?}, purchaseable={}, qty={}",
            item.cart_id, item.id, item.purchaseable, item.qty
        );
        Ok(())
    }

    /// Called after an item was updated
    fn on_item_updated(&self, item: &CartItem) -> CheckoutResult<()> {
        info!(
            "Item updated: cart={}, item={:?}, qty={}, price={}",
            item.cart_id, item.id, item.qty, item.price
        );
        Ok(())
    }

    /// Called after an item was soft-deleted
    fn on_item_deleted(&self, item: &CartItem) -> CheckoutResult<()> {
        info!("Item deleted: cart={}, item={:?}", item.cart_id, item.id);
        Ok(())
    }
}

/// Default handler that just logs events
pub struct LoggingEventHandler;

impl CheckoutEventHandler for LoggingEventHandler {}

/// Dispatch an event to the appropriate handler method
pub fn dispatch_checkout_event(
    handler: &dyn CheckoutEventHandler,
    event: &CheckoutEvent,
) -> CheckoutResult<()> {
    match event {
        CheckoutEvent::ItemAdded(item) => handler.on_item_added(item),
        CheckoutEvent::ItemUpdated(item) => handler.on_item_updated(item),
        CheckoutEvent::ItemDeleted(item) => handler.on_item_deleted(item),
    }
}

/// Dispatch after a committed mutation; handler failures are only logged
pub(crate) fn emit(handler: &dyn CheckoutEventHandler, event: CheckoutEvent) {
    if let Err(e) = dispatch_checkout_event(handler, &event) {
        warn!("Checkout event handler failed for {}: {}", event.name(), e);
    }
}
