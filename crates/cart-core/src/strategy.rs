//! # Pricing Strategy Traits
//!
//! Strategy contracts consulted by the checkout orchestrator.
//! Implementations: zero-rule defaults here, configurable rules in
//! [`crate::logistics`], store-specific rules in the host application.
//!
//! ## Design Pattern
//!
//! Each concern (shipping, taxes, discounts, cart logistics) is a separate
//! trait so a deployment can swap one rule without touching the others.
//! All four are handed to [`CheckoutServices`](crate::CheckoutServices)
//! explicitly; nothing is looked up from a global registry.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         Checkout                               │
//! │  shipping() ──► ShippingCalculator::cost()                     │
//! │  subtotal() ──► items + shipping                               │
//! │  taxes()    ──► TaxCalculator::taxes()                         │
//! │  apply_discount_code() ──► DiscountResolver::resolve_from_code │
//! │  add_item() ──► CartLogistics::before_item_added()             │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use crate::checkout::Checkout;
use crate::entity::Purchaseable;
use crate::error::CheckoutResult;
use crate::money::Money;
use async_trait::async_trait;
use std::sync::Arc;

/// Computes the shipping cost for a checkout
#[async_trait]
pub trait ShippingCalculator: Send + Sync {
    /// Unrounded shipping cost; the orchestrator rounds it
    async fn cost(&self, checkout: &Checkout) -> CheckoutResult<Money>;
}

/// Computes the taxes owed on a checkout.
///
/// Implementations pick their own base, typically from
/// [`Checkout::subtotal`] and [`Checkout::discount`].
#[async_trait]
pub trait TaxCalculator: Send + Sync {
    async fn taxes(&self, checkout: &Checkout) -> CheckoutResult<Money>;
}

/// Turns a discount code into an amount
#[async_trait]
pub trait DiscountResolver: Send + Sync {
    /// Returns zero for unknown or inapplicable codes; that is not an error.
    async fn resolve_from_code(&self, checkout: &Checkout, code: &str) -> CheckoutResult<Money>;
}

/// Catalog lookup and lifecycle hooks around the cart
#[async_trait]
pub trait CartLogistics: Send + Sync {
    /// Resolve a purchaseable by `(type, id)`, `None` if it does not exist
    async fn resolve_purchaseable(
        &self,
        purchaseable_type: &str,
        id: &str,
    ) -> CheckoutResult<Option<Arc<dyn Purchaseable>>>;

    /// Runs before an item is added; an error aborts the add.
    async fn before_item_added(
        &self,
        checkout: &Checkout,
        purchaseable: &dyn Purchaseable,
        qty: i64,
    ) -> CheckoutResult<()> {
        let _ = (checkout, purchaseable, qty);
        Ok(())
    }

    /// Whether enough is known (address, purchaser, ...) to present a total
    async fn has_info_needed_for_total(&self, checkout: &Checkout) -> CheckoutResult<bool> {
        let _ = checkout;
        Ok(true)
    }
}

pub type BoxedShippingCalculator = Arc<dyn ShippingCalculator>;
pub type BoxedTaxCalculator = Arc<dyn TaxCalculator>;
pub type BoxedDiscountResolver = Arc<dyn DiscountResolver>;
pub type BoxedCartLogistics = Arc<dyn CartLogistics>;

/// Shipping is always free
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeShipping;

#[async_trait]
impl ShippingCalculator for FreeShipping {
    async fn cost(&self, _checkout: &Checkout) -> CheckoutResult<Money> {
        Ok(Money::ZERO)
    }
}

/// No taxes are charged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTaxes;

#[async_trait]
impl TaxCalculator for NoTaxes {
    async fn taxes(&self, _checkout: &Checkout) -> CheckoutResult<Money> {
        Ok(Money::ZERO)
    }
}

/// Every code is worth nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiscounts;

#[async_trait]
impl DiscountResolver for NoDiscounts {
    async fn resolve_from_code(&self, _checkout: &Checkout, _code: &str) -> CheckoutResult<Money> {
        Ok(Money::ZERO)
    }
}

/// Resolves nothing, checks nothing, always ready for a total
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveLogistics;

#[async_trait]
impl CartLogistics for PermissiveLogistics {
    async fn resolve_purchaseable(
        &self,
        _purchaseable_type: &str,
        _id: &str,
    ) -> CheckoutResult<Option<Arc<dyn Purchaseable>>> {
        Ok(None)
    }
}

/// The four strategies a checkout is priced with
#[derive(Clone)]
pub struct CheckoutStrategies {
    pub shipping: BoxedShippingCalculator,
    pub taxes: BoxedTaxCalculator,
    pub discounts: BoxedDiscountResolver,
    pub logistics: BoxedCartLogistics,
}

impl CheckoutStrategies {
    pub fn new(
        shipping: BoxedShippingCalculator,
        taxes: BoxedTaxCalculator,
        discounts: BoxedDiscountResolver,
        logistics: BoxedCartLogistics,
    ) -> Self {
        Self {
            shipping,
            taxes,
            discounts,
            logistics,
        }
    }

    /// Builder: replace the shipping calculator
    pub fn with_shipping(mut self, shipping: BoxedShippingCalculator) -> Self {
        self.shipping = shipping;
        self
    }

    /// Builder: replace the tax calculator
    pub fn with_taxes(mut self, taxes: BoxedTaxCalculator) -> Self {
        self.taxes = taxes;
        self
    }

    /// Builder: replace the discount resolver
    pub fn with_discounts(mut self, discounts: BoxedDiscountResolver) -> Self {
        self.discounts = discounts;
        self
    }

    /// Builder: replace the cart logistics
    pub fn with_logistics(mut self, logistics: BoxedCartLogistics) -> Self {
        self.logistics = logistics;
        self
    }
}

impl Default for CheckoutStrategies {
    fn default() -> Self {
        Self::new(
            Arc::new(FreeShipping),
            Arc::new(NoTaxes),
            Arc::new(NoDiscounts),
            Arc::new(PermissiveLogistics),
        )
    }
}

impl std::fmt::Debug for CheckoutStrategies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutStrategies").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryCartRepository;
    use crate::CheckoutServices;

    #[tokio::test]
    async fn test_default_strategies_are_zero() {
        let services = CheckoutServices::new(
            Arc::new(InMemoryCartRepository::new()),
            CheckoutStrategies::default(),
        );
        let checkout = services.create().await.unwrap();

        assert!(FreeShipping.cost(&checkout).await.unwrap().is_zero());
        assert!(NoTaxes.taxes(&checkout).await.unwrap().is_zero());
        assert!(NoDiscounts
            .resolve_from_code(&checkout, "ANYTHING")
            .await
            .unwrap()
            .is_zero());
        assert!(PermissiveLogistics
            .has_info_needed_for_total(&checkout)
            .await
            .unwrap());
        assert!(PermissiveLogistics
            .resolve_purchaseable("product", "1")
            .await
            .unwrap()
            .is_none());
    }
}
