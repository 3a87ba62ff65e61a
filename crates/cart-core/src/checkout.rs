//! # Checkout Orchestrator
//!
//! [`Checkout`] wraps one cart and is the only way to mutate it. Every
//! mutation follows the same sequence: validate, load the current cart,
//! change a local copy, persist it in one call, then emit the item event.
//! Pricing reads go back to the repository and the strategies on every
//! call; nothing is cached.
//!
//! ```text
//! shipping = round2(ShippingCalculator::cost)
//! subtotal = round2(sum(live item prices) + shipping)
//! discount = cart.discount_amount
//! taxes    = round2(TaxCalculator::taxes)
//! total    = round2(subtotal - discount + taxes)
//! ```

use crate::cart::Cart;
use crate::entity::{ensure_purchaseable, EntityRef, Purchaseable, Purchaser};
use crate::error::{CheckoutError, CheckoutResult};
use crate::events::{emit, CheckoutEvent, CheckoutEventHandler, LoggingEventHandler};
use crate::item::{CartItem, ItemId};
use crate::money::Money;
use crate::repository::BoxedCartRepository;
use crate::strategy::CheckoutStrategies;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Repository, strategies and event handler shared by every checkout
#[derive(Clone)]
pub struct CheckoutServices {
    repository: BoxedCartRepository,
    strategies: CheckoutStrategies,
    events: Arc<dyn CheckoutEventHandler>,
}

impl CheckoutServices {
    /// Create services with the default logging event handler
    pub fn new(repository: BoxedCartRepository, strategies: CheckoutStrategies) -> Self {
        Self {
            repository,
            strategies,
            events: Arc::new(LoggingEventHandler),
        }
    }

    /// Builder: set the domain event handler
    pub fn with_event_handler(mut self, events: Arc<dyn CheckoutEventHandler>) -> Self {
        self.events = events;
        self
    }

    pub fn repository(&self) -> &BoxedCartRepository {
        &self.repository
    }

    pub fn strategies(&self) -> &CheckoutStrategies {
        &self.strategies
    }

    /// Create a fresh checkout with a new cart
    #[instrument(skip(self))]
    pub async fn create(&self) -> CheckoutResult<Checkout> {
        let cart = self.repository.create_cart().await?;
        info!("Created checkout {}", cart.id);
        Ok(Checkout {
            cart,
            services: self.clone(),
        })
    }

    /// Open an existing checkout.
    ///
    /// Soft-deleted carts are only found with `include_deleted`.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> CheckoutResult<Checkout> {
        let cart = self
            .repository
            .find_cart(id, include_deleted)
            .await?
            .ok_or_else(|| CheckoutError::checkout_not_found(id))?;
        Ok(Checkout {
            cart,
            services: self.clone(),
        })
    }

    /// Resolve a purchaseable through the cart logistics
    pub async fn resolve_purchaseable(
        &self,
        purchaseable_type: &str,
        id: &str,
    ) -> CheckoutResult<Option<Arc<dyn Purchaseable>>> {
        self.strategies
            .logistics
            .resolve_purchaseable(purchaseable_type, id)
            .await
    }
}

impl std::fmt::Debug for CheckoutServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutServices")
            .field("strategies", &self.strategies)
            .finish_non_exhaustive()
    }
}

/// Presented totals, only exposed once the logistics say a total is meaningful
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutTotals {
    pub shipping: Money,
    pub discount: Money,
    pub taxes: Money,
    pub total: Money,
}

/// Presentation view of a checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub cart: Cart,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub totals: Option<CheckoutTotals>,
}

/// A checkout session over one cart
#[derive(Debug)]
pub struct Checkout {
    cart: Cart,
    services: CheckoutServices,
}

impl Checkout {
    pub fn id(&self) -> Uuid {
        self.cart.id
    }

    /// Cart as of the last load or mutation through this handle
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn purchaser(&self) -> Option<&EntityRef> {
        self.cart.purchaser.as_ref()
    }

    /// Reload the cart from the repository
    pub async fn fresh_cart(&self) -> CheckoutResult<Cart> {
        self.services
            .repository
            .find_cart(self.cart.id, true)
            .await?
            .ok_or_else(|| CheckoutError::checkout_not_found(self.cart.id))
    }

    async fn refresh(&mut self) -> CheckoutResult<()> {
        self.cart = self.fresh_cart().await?;
        Ok(())
    }

    fn ensure_open(&self) -> CheckoutResult<()> {
        if self.cart.is_deleted() {
            return Err(CheckoutError::checkout_not_found(self.cart.id));
        }
        Ok(())
    }

    /// Reload the cart and fail if it was closed, here or through another handle
    async fn load_open(&mut self) -> CheckoutResult<()> {
        self.ensure_open()?;
        self.refresh().await?;
        self.ensure_open()
    }

    async fn save_cart(&mut self, mut cart: Cart) -> CheckoutResult<()> {
        cart.touch();
        self.services.repository.save_cart(&cart).await?;
        self.cart = cart;
        Ok(())
    }

    /// Load a live item that belongs to this cart
    async fn live_item(&self, item_id: ItemId) -> CheckoutResult<CartItem> {
        self.services
            .repository
            .find_item(item_id, false)
            .await?
            .filter(|item| item.cart_id == self.cart.id)
            .ok_or(CheckoutError::ItemNotFound { item_id })
    }

    fn emit(&self, event: CheckoutEvent) {
        emit(self.services.events.as_ref(), event);
    }

    /// Attach the buying entity
    #[instrument(skip(self, purchaser), fields(checkout_id = %self.cart.id))]
    pub async fn set_purchaser(&mut self, purchaser: &dyn Purchaser) -> CheckoutResult<()> {
        self.load_open().await?;
        let mut cart = self.cart.clone();
        cart.set_purchaser(purchaser)?;
        self.save_cart(cart).await?;
        info!("Purchaser set: {:?}", self.cart.purchaser);
        Ok(())
    }

    /// Add `qty` of a purchaseable, replacing the quantity of an existing line
    /// for the same purchaseable.
    #[instrument(skip(self, purchaseable, options), fields(checkout_id = %self.cart.id))]
    pub async fn add_item(
        &mut self,
        purchaseable: &dyn Purchaseable,
        qty: i64,
        price: Option<Money>,
        options: Option<Value>,
    ) -> CheckoutResult<CartItem> {
        let reference = ensure_purchaseable(purchaseable)?;
        self.load_open().await?;

        if let Err(e) = self
            .services
            .strategies
            .logistics
            .before_item_added(self, purchaseable, qty)
            .await
        {
            warn!("Add of {} rejected: {}", reference, e);
            return Err(e);
        }

        let mut item = self.cart.get_or_create_item(&reference);
        item.set_qty(qty);
        if let Some(options) = options {
            item.set_options(options);
        }
        item.calculate_price(price, Some(purchaseable))?;
        item.touch();

        let item = self.services.repository.save_item(item).await?;
        self.refresh().await?;

        info!(
            "Added {} x{} to checkout {} (price={})",
            reference, qty, self.cart.id, item.price
        );
        self.emit(CheckoutEvent::ItemAdded(item.clone()));
        Ok(item)
    }

    /// Replace quantity (and optionally price and options) of a live item
    #[instrument(skip(self, options), fields(checkout_id = %self.cart.id))]
    pub async fn update_item(
        &mut self,
        item_id: ItemId,
        qty: i64,
        price: Option<Money>,
        options: Option<Value>,
    ) -> CheckoutResult<CartItem> {
        self.load_open().await?;
        let mut item = self.live_item(item_id).await?;

        item.set_qty(qty);
        if let Some(options) = options {
            item.set_options(options);
        }

        let resolved = match price {
            Some(_) => None,
            None => {
                self.services
                    .resolve_purchaseable(&item.purchaseable.entity_type, &item.purchaseable.id)
                    .await?
            }
        };
        item.calculate_price(price, resolved.as_deref())?;
        item.touch();

        let item = self.services.repository.save_item(item).await?;
        self.refresh().await?;

        info!("Updated item {} on checkout {} (qty={})", item_id, self.cart.id, qty);
        self.emit(CheckoutEvent::ItemUpdated(item.clone()));
        Ok(item)
    }

    /// Soft-delete a live item
    #[instrument(skip(self), fields(checkout_id = %self.cart.id))]
    pub async fn remove_item(&mut self, item_id: ItemId) -> CheckoutResult<CartItem> {
        self.load_open().await?;
        self.live_item(item_id).await?;

        let item = self.services.repository.soft_delete_item(item_id).await?;
        self.refresh().await?;

        info!("Removed item {} from checkout {}", item_id, self.cart.id);
        self.emit(CheckoutEvent::ItemDeleted(item.clone()));
        Ok(item)
    }

    /// Bring back a soft-deleted item with its previous quantity and price
    #[instrument(skip(self), fields(checkout_id = %self.cart.id))]
    pub async fn restore_item(&mut self, item_id: ItemId) -> CheckoutResult<CartItem> {
        self.load_open().await?;
        let item = self
            .services
            .repository
            .find_item(item_id, true)
            .await?
            .filter(|item| item.cart_id == self.cart.id && item.is_deleted())
            .ok_or(CheckoutError::ItemNotFound { item_id })?;

        if self.cart.find_item_for(&item.purchaseable).is_some() {
            return Err(CheckoutError::ItemConflict {
                item_id,
                purchaseable: item.purchaseable.to_string(),
            });
        }

        let item = self.services.repository.restore_item(item_id).await?;
        self.refresh().await?;

        info!("Restored item {} on checkout {}", item_id, self.cart.id);
        Ok(item)
    }

    /// Set a custom field under its literal top-level key
    #[instrument(skip(self, value), fields(checkout_id = %self.cart.id))]
    pub async fn set_custom_field(&mut self, key: &str, value: Value) -> CheckoutResult<&mut Self> {
        self.load_open().await?;
        let mut cart = self.cart.clone();
        cart.set_custom_field(key, value);
        self.save_cart(cart).await?;
        debug!("Custom field {} set", key);
        Ok(self)
    }

    /// Read a custom field; dotted keys look into nested values
    pub fn custom_field(&self, key: &str) -> Option<Value> {
        self.cart.custom_field(key)
    }

    /// Resolve `code` and store it with its amount.
    ///
    /// A code worth zero changes nothing. Returns the resolved amount.
    #[instrument(skip(self), fields(checkout_id = %self.cart.id))]
    pub async fn apply_discount_code(&mut self, code: &str) -> CheckoutResult<Money> {
        self.load_open().await?;

        let amount = self
            .services
            .strategies
            .discounts
            .resolve_from_code(self, code)
            .await?;

        if amount.is_zero() {
            info!("Discount code {:?} resolved to zero, ignoring", code);
            return Ok(amount);
        }

        let mut cart = self.cart.clone();
        cart.set_discount(Some(code.to_string()), amount);
        self.save_cart(cart).await?;

        info!("Applied discount code {:?} worth {}", code, self.cart.discount_amount);
        Ok(self.cart.discount_amount)
    }

    /// Override the discount amount without a code
    #[instrument(skip(self), fields(checkout_id = %self.cart.id))]
    pub async fn set_discount_amount(&mut self, amount: Money) -> CheckoutResult<()> {
        self.load_open().await?;
        let mut cart = self.cart.clone();
        cart.set_discount(None, amount);
        self.save_cart(cart).await
    }

    pub async fn has_info_needed_for_total(&self) -> CheckoutResult<bool> {
        self.services
            .strategies
            .logistics
            .has_info_needed_for_total(self)
            .await
    }

    pub async fn shipping(&self) -> CheckoutResult<Money> {
        let cost = self.services.strategies.shipping.cost(self).await?;
        Ok(cost.round2())
    }

    /// Live item prices plus shipping
    pub async fn subtotal(&self) -> CheckoutResult<Money> {
        let items_total = self.fresh_cart().await?.items_total();
        let shipping = self.shipping().await?;
        Ok((items_total + shipping).round2())
    }

    /// The stored discount amount
    pub fn discount(&self) -> Money {
        self.cart.discount_amount
    }

    pub async fn taxes(&self) -> CheckoutResult<Money> {
        let taxes = self.services.strategies.taxes.taxes(self).await?;
        Ok(taxes.round2())
    }

    /// `subtotal - discount + taxes`; may be negative
    pub async fn total(&self) -> CheckoutResult<Money> {
        let subtotal = self.subtotal().await?;
        let discount = self.discount();
        let taxes = self.taxes().await?;
        let total = (subtotal - discount + taxes).round2();
        debug!(
            "Checkout {} total: subtotal={} discount={} taxes={} total={}",
            self.cart.id, subtotal, discount, taxes, total
        );
        Ok(total)
    }

    /// Presentation view; totals are included only when the logistics allow
    pub async fn summary(&self) -> CheckoutResult<CheckoutSummary> {
        let cart = self.fresh_cart().await?;
        let subtotal = self.subtotal().await?;

        let totals = if self.has_info_needed_for_total().await? {
            Some(CheckoutTotals {
                shipping: self.shipping().await?,
                discount: self.discount(),
                taxes: self.taxes().await?,
                total: self.total().await?,
            })
        } else {
            None
        };

        Ok(CheckoutSummary {
            subtotal,
            cart,
            totals,
        })
    }

    /// Soft-delete the cart and consume the handle
    #[instrument(skip(self), fields(checkout_id = %self.cart.id))]
    pub async fn destroy(mut self) -> CheckoutResult<()> {
        self.load_open().await?;
        self.services.repository.soft_delete_cart(self.cart.id).await?;
        info!("Destroyed checkout {}", self.cart.id);
        Ok(())
    }
}
