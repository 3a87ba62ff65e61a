//! # Purchaseable and Purchaser Capabilities
//!
//! The cart never owns the things being bought or the party buying them.
//! It only records an [`EntityRef`] and relies on these capability traits
//! to read identity and pricing from whatever the host application uses.

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Weak `(identifier, type)` reference to an external entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Something that can be bought and placed in a cart
pub trait Purchaseable: Send + Sync {
    /// Stable identifier within its type
    fn identifier(&self) -> String;

    /// Type discriminator (e.g. "product", "gift_card")
    fn purchaseable_type(&self) -> String;

    /// Current retail unit price
    fn retail_price(&self) -> Money;

    fn display_name(&self) -> String;

    /// Reference stored on the cart item
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.identifier(), self.purchaseable_type())
    }
}

/// The buying entity attached to a cart
pub trait Purchaser: Send + Sync {
    fn identifier(&self) -> String;

    fn purchaser_type(&self) -> String;

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.identifier(), self.purchaser_type())
    }
}

/// Plain purchaser reference for callers that only know the identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaserRef {
    pub id: String,
    #[serde(rename = "type")]
    pub purchaser_type: String,
}

impl PurchaserRef {
    pub fn new(id: impl Into<String>, purchaser_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            purchaser_type: purchaser_type.into(),
        }
    }
}

impl Purchaser for PurchaserRef {
    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn purchaser_type(&self) -> String {
        self.purchaser_type.clone()
    }
}

/// Identity check for a purchaseable; both parts must be non-empty
pub fn ensure_purchaseable(entity: &dyn Purchaseable) -> CheckoutResult<EntityRef> {
    let reference = entity.entity_ref();
    if reference.id.trim().is_empty() {
        return Err(CheckoutError::InvalidPurchaseable(
            "purchaseable has an empty identifier".to_string(),
        ));
    }
    if reference.entity_type.trim().is_empty() {
        return Err(CheckoutError::InvalidPurchaseable(format!(
            "purchaseable {} has no type",
            reference.id
        )));
    }
    Ok(reference)
}

/// Identity check for a purchaser; both parts must be non-empty
pub fn ensure_purchaser(entity: &dyn Purchaser) -> CheckoutResult<EntityRef> {
    let reference = entity.entity_ref();
    if reference.id.trim().is_empty() {
        return Err(CheckoutError::InvalidPurchaser(
            "purchaser has an empty identifier".to_string(),
        ));
    }
    if reference.entity_type.trim().is_empty() {
        return Err(CheckoutError::InvalidPurchaser(format!(
            "purchaser {} has no type",
            reference.id
        )));
    }
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ticket {
        id: &'static str,
        kind: &'static str,
    }

    impl Purchaseable for Ticket {
        fn identifier(&self) -> String {
            self.id.to_string()
        }

        fn purchaseable_type(&self) -> String {
            self.kind.to_string()
        }

        fn retail_price(&self) -> Money {
            Money::from_units(15)
        }

        fn display_name(&self) -> String {
            format!("Ticket {}", self.id)
        }
    }

    #[test]
    fn test_entity_ref_display() {
        assert_eq!(EntityRef::new("42", "product").to_string(), "product#42");
    }

    #[test]
    fn test_entity_ref_serializes_type_key() {
        let json = serde_json::to_value(EntityRef::new("42", "product")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "42", "type": "product" }));
    }

    #[test]
    fn test_ensure_purchaseable() {
        let ok = Ticket { id: "t-1", kind: "ticket" };
        assert_eq!(ensure_purchaseable(&ok).unwrap(), EntityRef::new("t-1", "ticket"));

        let no_id = Ticket { id: " ", kind: "ticket" };
        assert!(matches!(
            ensure_purchaseable(&no_id),
            Err(CheckoutError::InvalidPurchaseable(_))
        ));

        let no_type = Ticket { id: "t-2", kind: "" };
        assert!(matches!(
            ensure_purchaseable(&no_type),
            Err(CheckoutError::InvalidPurchaseable(_))
        ));
    }

    #[test]
    fn test_ensure_purchaser() {
        assert!(ensure_purchaser(&PurchaserRef::new("u-1", "user")).is_ok());
        assert!(matches!(
            ensure_purchaser(&PurchaserRef::new("u-1", "")),
            Err(CheckoutError::InvalidPurchaser(_))
        ));
        assert!(matches!(
            ensure_purchaser(&PurchaserRef::new("", "user")),
            Err(CheckoutError::InvalidPurchaser(_))
        ));
    }
}
