//! # Checkout Error Types
//!
//! Typed error handling for the checkout engine.
//! All checkout operations return `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart missing, or soft-deleted and looked up without `include_deleted`
    #[error("Checkout not found: {checkout_id}")]
    CheckoutNotFound { checkout_id: String },

    /// Caller-supplied entity does not satisfy the purchaseable capability
    #[error("Item is not purchaseable: {0}")]
    InvalidPurchaseable(String),

    /// Caller-supplied entity does not satisfy the purchaser capability
    #[error("Invalid purchaser: {0}")]
    InvalidPurchaser(String),

    /// Item missing, owned by another cart, or in the wrong lifecycle state
    #[error("Cart item not found: {item_id}")]
    ItemNotFound { item_id: u64 },

    /// Restoring the item would leave two live items for one purchaseable
    #[error("Cart item {item_id} conflicts with a live item for {purchaseable}")]
    ItemConflict { item_id: u64, purchaseable: String },

    /// A price needed the purchaseable and it could not be resolved
    #[error("Purchaseable could not be resolved: {purchaseable_type}#{purchaseable_id}")]
    ReferenceUnresolved {
        purchaseable_type: String,
        purchaseable_id: String,
    },

    /// The cart logistics pre-add hook rejected the operation
    #[error("Rejected by cart logistics: {0}")]
    LogisticsPrecondition(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors (unreadable or malformed store config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Persistence collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CheckoutError {
    pub fn checkout_not_found(checkout_id: impl ToString) -> Self {
        CheckoutError::CheckoutNotFound {
            checkout_id: checkout_id.to_string(),
        }
    }

    /// Returns true for failures raised by infrastructure rather than the caller
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            CheckoutError::Storage(_) | CheckoutError::Configuration(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::CheckoutNotFound { .. } => 404,
            CheckoutError::InvalidPurchaseable(_) => 422,
            CheckoutError::InvalidPurchaser(_) => 422,
            CheckoutError::ItemNotFound { .. } => 404,
            CheckoutError::ItemConflict { .. } => 409,
            CheckoutError::ReferenceUnresolved { .. } => 404,
            CheckoutError::LogisticsPrecondition(_) => 422,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::Configuration(_) => 500,
            CheckoutError::Storage(_) => 503,
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_errors() {
        assert!(CheckoutError::Storage("lock poisoned".into()).is_infrastructure());
        assert!(!CheckoutError::ItemNotFound { item_id: 7 }.is_infrastructure());
        assert!(!CheckoutError::LogisticsPrecondition("out of stock".into()).is_infrastructure());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CheckoutError::checkout_not_found("abc").status_code(), 404);
        assert_eq!(
            CheckoutError::InvalidPurchaseable("empty identifier".into()).status_code(),
            422
        );
        assert_eq!(
            CheckoutError::ItemConflict {
                item_id: 3,
                purchaseable: "product#sku-1".into()
            }
            .status_code(),
            409
        );
        assert_eq!(CheckoutError::Storage("down".into()).status_code(), 503);
    }

    #[test]
    fn test_messages() {
        let err = CheckoutError::ReferenceUnresolved {
            purchaseable_type: "product".into(),
            purchaseable_id: "sku-9".into(),
        };
        assert_eq!(err.to_string(), "Purchaseable could not be resolved: product#sku-9");
    }
}
