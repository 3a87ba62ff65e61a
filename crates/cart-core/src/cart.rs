//! # Cart Aggregate
//!
//! The cart holds line items, the purchaser reference, discount state and
//! free-form custom fields for one checkout session.

use crate::entity::{ensure_purchaser, EntityRef, Purchaser};
use crate::error::CheckoutResult;
use crate::item::CartItem;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A shopping cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Unique cart ID (generated)
    pub id: Uuid,

    /// Buying entity, if one has been attached
    #[serde(default)]
    pub purchaser: Option<EntityRef>,

    /// Last discount code that resolved to a non-zero amount
    #[serde(default)]
    pub discount_code: Option<String>,

    /// Last discount amount set, by code or directly
    #[serde(default)]
    pub discount_amount: Money,

    /// Free-form fields (shipping address, notes, ...)
    #[serde(default)]
    pub custom_fields: Map<String, Value>,

    /// Live (non-deleted) items, in insertion order
    #[serde(default)]
    pub items: Vec<CartItem>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Create an empty cart with a new ID
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            purchaser: None,
            discount_code: None,
            discount_amount: Money::ZERO,
            custom_fields: Map::new(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Live items (the repository already filters, this guards hand-built carts)
    pub fn live_items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|item| !item.is_deleted())
    }

    /// Sum of live line prices, unrounded
    pub fn items_total(&self) -> Money {
        self.live_items().map(|item| item.price).sum()
    }

    /// Number of units across live items
    pub fn item_count(&self) -> i64 {
        self.live_items().map(|item| item.qty).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.live_items().next().is_none()
    }

    /// Live item for `purchaseable`, or a new unsaved one bound to it
    pub fn get_or_create_item(&self, purchaseable: &EntityRef) -> CartItem {
        self.find_item_for(purchaseable)
            .cloned()
            .unwrap_or_else(|| CartItem::new(self.id, purchaseable.clone()))
    }

    pub fn find_item_for(&self, purchaseable: &EntityRef) -> Option<&CartItem> {
        self.live_items().find(|item| &item.purchaseable == purchaseable)
    }

    /// Write `value` under the literal top-level `key`.
    ///
    /// Dots in `key` are not expanded, so `"address.city"` is stored as one
    /// key. Reads through [`Cart::custom_field`] still find it.
    pub fn set_custom_field(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.custom_fields.insert(key.into(), value);
        self
    }

    /// Read a custom field, resolving dotted keys against the flattened map
    pub fn custom_field(&self, key: &str) -> Option<Value> {
        if key.contains('.') {
            let mut flattened = Map::new();
            flatten_into(&mut flattened, None, &self.custom_fields);
            return flattened.get(key).cloned();
        }
        self.custom_fields.get(key).cloned()
    }

    /// Record the purchaser's `(identifier, type)` pair
    pub fn set_purchaser(&mut self, entity: &dyn Purchaser) -> CheckoutResult<&mut Self> {
        self.purchaser = Some(ensure_purchaser(entity)?);
        Ok(self)
    }

    pub fn set_discount(&mut self, code: Option<String>, amount: Money) -> &mut Self {
        if code.is_some() {
            self.discount_code = code;
        }
        self.discount_amount = amount.round2();
        self
    }

    pub fn delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten nested objects and arrays into dotted leaf keys.
/// Empty containers are kept as leaves.
fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        flatten_value(out, path, value);
    }
}

fn flatten_value(out: &mut Map<String, Value>, path: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => flatten_into(out, Some(&path), map),
        Value::Array(list) if !list.is_empty() => {
            for (index, entry) in list.iter().enumerate() {
                flatten_value(out, format!("{path}.{index}"), entry);
            }
        }
        _ => {
            out.insert(path, value.clone());
        }
    }
}
