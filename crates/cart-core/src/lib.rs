//! # cart-core
//!
//! Checkout orchestration and pricing engine for checkout-rs.
//!
//! This crate provides:
//! - `Checkout` and `CheckoutServices`, the orchestrator over one cart
//! - `Cart` and `CartItem`, the aggregate and its line items
//! - `ShippingCalculator`, `TaxCalculator`, `DiscountResolver` and
//!   `CartLogistics` strategy traits
//! - `CartRepository` for persistence, with an in-memory implementation
//! - `Money`, an exact decimal amount with half-away-from-zero rounding
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use cart_core::{CheckoutServices, CheckoutStrategies, InMemoryCartRepository, Money};
//!
//! let services = CheckoutServices::new(
//!     Arc::new(InMemoryCartRepository::new()),
//!     CheckoutStrategies::default(),
//! );
//!
//! let mut checkout = services.create().await?;
//! checkout.add_item(&product, 2, Some(Money::from_units(10)), None).await?;
//! checkout.apply_discount_code("SAVE5").await?;
//!
//! let total = checkout.total().await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod entity;
pub mod error;
pub mod events;
pub mod item;
pub mod logistics;
pub mod money;
pub mod product;
pub mod repository;
pub mod strategy;

// Re-exports for convenience
pub use cart::Cart;
pub use checkout::{Checkout, CheckoutServices, CheckoutSummary, CheckoutTotals};
pub use entity::{EntityRef, Purchaseable, Purchaser, PurchaserRef};
pub use error::{CheckoutError, CheckoutResult};
pub use events::{dispatch_checkout_event, CheckoutEvent, CheckoutEventHandler, LoggingEventHandler};
pub use item::{CartItem, ItemId};
pub use logistics::{
    CatalogLogistics, DiscountCode, DiscountCodeTable, FlatRateShipping, PercentageTax, StoreConfig,
};
pub use money::Money;
pub use product::{Product, ProductCatalog, PRODUCT_TYPE};
pub use repository::{BoxedCartRepository, CartRepository, InMemoryCartRepository};
pub use strategy::{
    BoxedCartLogistics, BoxedDiscountResolver, BoxedShippingCalculator, BoxedTaxCalculator,
    CartLogistics, CheckoutStrategies, DiscountResolver, FreeShipping, NoDiscounts, NoTaxes,
    PermissiveLogistics, ShippingCalculator, TaxCalculator,
};
