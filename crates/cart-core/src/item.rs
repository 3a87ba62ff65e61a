//! # Cart Items
//!
//! A single line in a cart: one purchaseable reference, its quantity and
//! the price derived from them.

use crate::entity::{EntityRef, Purchaseable};
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Item identifier assigned by the repository on first save
pub type ItemId = u64;

/// Custom field key holding caller-supplied item options
pub const OPTIONS_FIELD: &str = "options";

/// A line item in a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// `None` until the item has been saved
    pub id: Option<ItemId>,

    /// Owning cart
    pub cart_id: Uuid,

    /// What is being bought (weak reference)
    pub purchaseable: EntityRef,

    /// Quantity; zero and negative values are accepted as given
    pub qty: i64,

    /// Unit price used for the last price calculation
    pub unit_price: Money,

    /// `unit_price * qty`, unrounded
    pub price: Money,

    /// Free-form attributes; `options` holds item options
    #[serde(default)]
    pub custom_fields: Map<String, Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CartItem {
    /// Unsaved item with zero quantity and price
    pub fn new(cart_id: Uuid, purchaseable: EntityRef) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            cart_id,
            purchaseable,
            qty: 0,
            unit_price: Money::ZERO,
            price: Money::ZERO,
            custom_fields: Map::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn set_qty(&mut self, qty: i64) -> &mut Self {
        self.qty = qty;
        self
    }

    /// Replace whatever was stored under `options`
    pub fn set_options(&mut self, options: Value) -> &mut Self {
        self.custom_fields.insert(OPTIONS_FIELD.to_string(), options);
        self
    }

    pub fn options(&self) -> Option<&Value> {
        self.custom_fields.get(OPTIONS_FIELD)
    }

    /// Recompute `price` from an explicit unit price, falling back to the
    /// purchaseable's retail price.
    pub fn calculate_price(
        &mut self,
        unit_price: Option<Money>,
        purchaseable: Option<&dyn Purchaseable>,
    ) -> CheckoutResult<&mut Self> {
        let unit_price = match (unit_price, purchaseable) {
            (Some(price), _) => price,
            (None, Some(entity)) => entity.retail_price(),
            (None, None) => {
                return Err(CheckoutError::ReferenceUnresolved {
                    purchaseable_type: self.purchaseable.entity_type.clone(),
                    purchaseable_id: self.purchaseable.id.clone(),
                })
            }
        };

        self.unit_price = unit_price;
        self.price = unit_price * self.qty;
        Ok(self)
    }

    pub fn delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
    }

    /// Bump `updated_at` before a save
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
