//! # Configurable Store Rules
//!
//! Ready-made strategies driven by a TOML store configuration
//! (`config/store.toml`). They cover the common cases: a flat shipping
//! rate with a free-shipping threshold, a single tax rate, a table of
//! discount codes, and catalog-backed cart logistics.
//!
//! ```toml
//! [shipping]
//! flat_rate = "5.00"
//! free_over = "100.00"
//!
//! [tax]
//! rate = "0.08"
//!
//! [[discounts]]
//! code = "SAVE5"
//! amount = "5.00"
//!
//! [[discounts]]
//! code = "TENOFF"
//! percent = "10"
//!
//! [logistics]
//! required_fields = ["shipping_address.city"]
//! ```

use crate::checkout::Checkout;
use crate::entity::Purchaseable;
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::product::{ProductCatalog, PRODUCT_TYPE};
use crate::strategy::{CartLogistics, CheckoutStrategies, DiscountResolver, ShippingCalculator, TaxCalculator};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Store-level pricing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub shipping: ShippingConfig,

    #[serde(default)]
    pub tax: TaxConfig,

    #[serde(default)]
    pub discounts: Vec<DiscountCode>,

    #[serde(default)]
    pub logistics: LogisticsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Charged on every non-empty cart
    #[serde(default)]
    pub flat_rate: Money,

    /// Item total at or above which shipping is free
    #[serde(default)]
    pub free_over: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Fraction, e.g. `0.08` for 8%
    #[serde(default)]
    pub rate: Decimal,
}

/// One redeemable code; exactly one of `amount` or `percent` should be set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    pub code: String,

    #[serde(default)]
    pub amount: Option<Money>,

    /// Percentage of the item total, e.g. `10` for 10%
    #[serde(default)]
    pub percent: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogisticsConfig {
    /// Custom fields (dotted paths allowed) that must be present before a
    /// total is presented
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl StoreConfig {
    /// Load from TOML string
    pub fn from_toml(toml_str: &str) -> CheckoutResult<Self> {
        let config: StoreConfig =
            toml::from_str(toml_str).map_err(|e| CheckoutError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CheckoutResult<()> {
        if self.tax.rate.is_sign_negative() {
            return Err(CheckoutError::Configuration(
                "tax.rate must not be negative".to_string(),
            ));
        }
        for discount in &self.discounts {
            if discount.code.trim().is_empty() {
                return Err(CheckoutError::Configuration(
                    "discount code must not be empty".to_string(),
                ));
            }
            if discount.amount.is_some() == discount.percent.is_some() {
                return Err(CheckoutError::Configuration(format!(
                    "discount {} needs exactly one of amount or percent",
                    discount.code
                )));
            }
        }
        Ok(())
    }

    /// Build the four strategies for this configuration
    pub fn strategies(&self, catalog: ProductCatalog) -> CheckoutStrategies {
        CheckoutStrategies::new(
            Arc::new(FlatRateShipping::from_config(&self.shipping)),
            Arc::new(PercentageTax::new(self.tax.rate)),
            Arc::new(DiscountCodeTable::new(self.discounts.clone())),
            Arc::new(CatalogLogistics::new(catalog).with_required_fields(self.logistics.required_fields.clone())),
        )
    }
}

/// Flat shipping rate, free above a threshold and for empty carts
#[derive(Debug, Clone)]
pub struct FlatRateShipping {
    rate: Money,
    free_over: Option<Money>,
}

impl FlatRateShipping {
    pub fn new(rate: Money) -> Self {
        Self {
            rate,
            free_over: None,
        }
    }

    /// Builder: waive shipping once the item total reaches `threshold`
    pub fn free_over(mut self, threshold: Money) -> Self {
        self.free_over = Some(threshold);
        self
    }

    pub fn from_config(config: &ShippingConfig) -> Self {
        Self {
            rate: config.flat_rate,
            free_over: config.free_over,
        }
    }
}

#[async_trait]
impl ShippingCalculator for FlatRateShipping {
    async fn cost(&self, checkout: &Checkout) -> CheckoutResult<Money> {
        let cart = checkout.fresh_cart().await?;
        if cart.is_empty() {
            return Ok(Money::ZERO);
        }
        match self.free_over {
            Some(threshold) if cart.items_total() >= threshold => Ok(Money::ZERO),
            _ => Ok(self.rate),
        }
    }
}

/// Single tax rate applied to `subtotal - discount`
#[derive(Debug, Clone)]
pub struct PercentageTax {
    rate: Decimal,
}

impl PercentageTax {
    pub fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl TaxCalculator for PercentageTax {
    async fn taxes(&self, checkout: &Checkout) -> CheckoutResult<Money> {
        if self.rate.is_zero() {
            return Ok(Money::ZERO);
        }
        let base = (checkout.subtotal().await? - checkout.discount()).non_negative();
        Ok(base.scale(self.rate))
    }
}

/// Case-insensitive table of discount codes
#[derive(Debug, Clone, Default)]
pub struct DiscountCodeTable {
    codes: HashMap<String, DiscountCode>,
}

impl DiscountCodeTable {
    pub fn new(codes: impl IntoIterator<Item = DiscountCode>) -> Self {
        Self {
            codes: codes
                .into_iter()
                .map(|code| (code.code.to_uppercase(), code))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl DiscountResolver for DiscountCodeTable {
    async fn resolve_from_code(&self, checkout: &Checkout, code: &str) -> CheckoutResult<Money> {
        let Some(entry) = self.codes.get(&code.trim().to_uppercase()) else {
            debug!("Unknown discount code {:?}", code);
            return Ok(Money::ZERO);
        };

        match (entry.amount, entry.percent) {
            (Some(amount), _) => Ok(amount),
            (None, Some(percent)) => {
                let items_total = checkout.fresh_cart().await?.items_total();
                Ok(items_total.scale(percent / Decimal::ONE_HUNDRED).round2())
            }
            (None, None) => Ok(Money::ZERO),
        }
    }
}

/// Cart logistics backed by a [`ProductCatalog`]
#[derive(Debug, Clone, Default)]
pub struct CatalogLogistics {
    catalog: Arc<ProductCatalog>,
    required_fields: Vec<String>,
}

impl CatalogLogistics {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            required_fields: Vec::new(),
        }
    }

    /// Builder: custom fields that must be set before totals are shown
    pub fn with_required_fields(mut self, fields: Vec<String>) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }
}

#[async_trait]
impl CartLogistics for CatalogLogistics {
    async fn resolve_purchaseable(
        &self,
        purchaseable_type: &str,
        id: &str,
    ) -> CheckoutResult<Option<Arc<dyn Purchaseable>>> {
        if purchaseable_type != PRODUCT_TYPE {
            return Ok(None);
        }
        Ok(self
            .catalog
            .get(id)
            .cloned()
            .map(|product| Arc::new(product) as Arc<dyn Purchaseable>))
    }

    async fn before_item_added(
        &self,
        _checkout: &Checkout,
        purchaseable: &dyn Purchaseable,
        _qty: i64,
    ) -> CheckoutResult<()> {
        if purchaseable.purchaseable_type() != PRODUCT_TYPE {
            return Ok(());
        }
        match self.catalog.get(&purchaseable.identifier()) {
            Some(product) if product.active => Ok(()),
            Some(product) => Err(CheckoutError::LogisticsPrecondition(format!(
                "{} is not available",
                product.name
            ))),
            None => Err(CheckoutError::LogisticsPrecondition(format!(
                "{} is not in the catalog",
                purchaseable.display_name()
            ))),
        }
    }

    async fn has_info_needed_for_total(&self, checkout: &Checkout) -> CheckoutResult<bool> {
        Ok(self
            .required_fields
            .iter()
            .all(|field| checkout.custom_field(field).is_some_and(|v| !v.is_null())))
    }
}
