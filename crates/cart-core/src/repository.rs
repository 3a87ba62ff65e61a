//! # Cart Persistence
//!
//! The checkout engine only needs a handful of persistence operations; any
//! store that provides them can back it. [`InMemoryCartRepository`] is the
//! bundled implementation used by the API server and the tests.

use crate::cart::Cart;
use crate::error::{CheckoutError, CheckoutResult};
use crate::item::{CartItem, ItemId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Persistence operations required by the checkout engine.
///
/// Carts returned from `find_cart` carry their live items, eagerly loaded.
/// Soft-deleted records stay stored and are only visible when asked for.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Persist a new empty cart
    async fn create_cart(&self) -> CheckoutResult<Cart>;

    async fn find_cart(&self, id: Uuid, include_deleted: bool) -> CheckoutResult<Option<Cart>>;

    /// Save the cart row (purchaser, discount, custom fields); items are saved separately
    async fn save_cart(&self, cart: &Cart) -> CheckoutResult<()>;

    async fn soft_delete_cart(&self, id: Uuid) -> CheckoutResult<()>;

    async fn find_item(&self, id: ItemId, include_deleted: bool) -> CheckoutResult<Option<CartItem>>;

    /// Insert or update an item, assigning an id on first save
    async fn save_item(&self, item: CartItem) -> CheckoutResult<CartItem>;

    async fn soft_delete_item(&self, id: ItemId) -> CheckoutResult<CartItem>;

    async fn restore_item(&self, id: ItemId) -> CheckoutResult<CartItem>;
}

/// Type alias for a shared repository (dynamic dispatch)
pub type BoxedCartRepository = Arc<dyn CartRepository>;

#[derive(Debug, Default)]
struct Tables {
    carts: HashMap<Uuid, Cart>,
    // BTreeMap keeps items in insertion order since ids are monotonic
    items: BTreeMap<ItemId, CartItem>,
    next_item_id: ItemId,
}

/// In-process repository; last write wins per record
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    tables: RwLock<Tables>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CheckoutResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| CheckoutError::Storage("cart store lock poisoned".to_string()))
    }

    fn write(&self) -> CheckoutResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| CheckoutError::Storage("cart store lock poisoned".to_string()))
    }

    /// Number of stored carts, deleted ones included
    pub fn cart_count(&self) -> CheckoutResult<usize> {
        Ok(self.read()?.carts.len())
    }
}

fn item_not_found(id: ItemId) -> CheckoutError {
    CheckoutError::ItemNotFound { item_id: id }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn create_cart(&self) -> CheckoutResult<Cart> {
        let cart = Cart::new();
        self.write()?.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn find_cart(&self, id: Uuid, include_deleted: bool) -> CheckoutResult<Option<Cart>> {
        let tables = self.read()?;
        let Some(stored) = tables.carts.get(&id) else {
            return Ok(None);
        };
        if stored.is_deleted() && !include_deleted {
            return Ok(None);
        }

        let mut cart = stored.clone();
        cart.items = tables
            .items
            .values()
            .filter(|item| item.cart_id == id && !item.is_deleted())
            .cloned()
            .collect();
        Ok(Some(cart))
    }

    async fn save_cart(&self, cart: &Cart) -> CheckoutResult<()> {
        let mut tables = self.write()?;
        if !tables.carts.contains_key(&cart.id) {
            return Err(CheckoutError::checkout_not_found(cart.id));
        }
        let mut row = cart.clone();
        row.items.clear();
        tables.carts.insert(cart.id, row);
        Ok(())
    }

    async fn soft_delete_cart(&self, id: Uuid) -> CheckoutResult<()> {
        let mut tables = self.write()?;
        let cart = tables
            .carts
            .get_mut(&id)
            .filter(|cart| !cart.is_deleted())
            .ok_or_else(|| CheckoutError::checkout_not_found(id))?;
        cart.delete(Utc::now());
        Ok(())
    }

    async fn find_item(&self, id: ItemId, include_deleted: bool) -> CheckoutResult<Option<CartItem>> {
        let tables = self.read()?;
        Ok(tables
            .items
            .get(&id)
            .filter(|item| include_deleted || !item.is_deleted())
            .cloned())
    }

    async fn save_item(&self, mut item: CartItem) -> CheckoutResult<CartItem> {
        let mut tables = self.write()?;
        if !tables.carts.contains_key(&item.cart_id) {
            return Err(CheckoutError::checkout_not_found(item.cart_id));
        }

        let id = match item.id {
            Some(id) => {
                if !tables.items.contains_key(&id) {
                    return Err(item_not_found(id));
                }
                id
            }
            None => {
                tables.next_item_id += 1;
                tables.next_item_id
            }
        };
        item.id = Some(id);
        tables.items.insert(id, item.clone());
        Ok(item)
    }

    async fn soft_delete_item(&self, id: ItemId) -> CheckoutResult<CartItem> {
        let mut tables = self.write()?;
        let item = tables
            .items
            .get_mut(&id)
            .filter(|item| !item.is_deleted())
            .ok_or_else(|| item_not_found(id))?;
        item.delete(Utc::now());
        Ok(item.clone())
    }

    async fn restore_item(&self, id: ItemId) -> CheckoutResult<CartItem> {
        let mut tables = self.write()?;
        let item = tables
            .items
            .get_mut(&id)
            .filter(|item| item.is_deleted())
            .ok_or_else(|| item_not_found(id))?;
        item.restore();
        Ok(item.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRef;
    use crate::money::Money;

    async fn saved_item(repo: &InMemoryCartRepository, cart: &Cart, id: &str) -> CartItem {
        let mut item = CartItem::new(cart.id, EntityRef::new(id, "product"));
        item.set_qty(1);
        item.calculate_price(Some(Money::from_units(3)), None).unwrap();
        repo.save_item(item).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_cart() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.create_cart().await.unwrap();

        let found = repo.find_cart(cart.id, false).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);
        assert!(found.items.is_empty());
        assert!(repo.find_cart(Uuid::new_v4(), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_deleted_cart_needs_include_deleted() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.create_cart().await.unwrap();
        repo.soft_delete_cart(cart.id).await.unwrap();

        assert!(repo.find_cart(cart.id, false).await.unwrap().is_none());
        let deleted = repo.find_cart(cart.id, true).await.unwrap().unwrap();
        assert!(deleted.is_deleted());
        assert_eq!(repo.cart_count().unwrap(), 1);

        assert!(matches!(
            repo.soft_delete_cart(cart.id).await,
            Err(CheckoutError::CheckoutNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_item_ids_are_assigned_in_order() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.create_cart().await.unwrap();

        let first = saved_item(&repo, &cart, "a").await;
        let second = saved_item(&repo, &cart, "b").await;
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let loaded = repo.find_cart(cart.id, false).await.unwrap().unwrap();
        let ids: Vec<_> = loaded.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_save_cart_does_not_store_items() {
        let repo = InMemoryCartRepository::new();
        let mut cart = repo.create_cart().await.unwrap();
        saved_item(&repo, &cart, "a").await;

        cart.items.push(CartItem::new(cart.id, EntityRef::new("ghost", "product")));
        repo.save_cart(&cart).await.unwrap();

        let loaded = repo.find_cart(cart.id, false).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].purchaseable.id, "a");
    }

    #[tokio::test]
    async fn test_save_item_requires_cart() {
        let repo = InMemoryCartRepository::new();
        let orphan = CartItem::new(Uuid::new_v4(), EntityRef::new("a", "product"));
        assert!(matches!(
            repo.save_item(orphan).await,
            Err(CheckoutError::CheckoutNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore_item() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.create_cart().await.unwrap();
        let item = saved_item(&repo, &cart, "a").await;
        let id = item.id.unwrap();

        let deleted = repo.soft_delete_item(id).await.unwrap();
        assert!(deleted.is_deleted());
        assert!(repo.find_item(id, false).await.unwrap().is_none());
        assert!(repo.find_item(id, true).await.unwrap().is_some());
        assert!(repo.find_cart(cart.id, false).await.unwrap().unwrap().items.is_empty());

        assert!(matches!(
            repo.soft_delete_item(id).await,
            Err(CheckoutError::ItemNotFound { item_id }) if item_id == id
        ));

        let restored = repo.restore_item(id).await.unwrap();
        assert!(!restored.is_deleted());
        assert_eq!(restored.price, item.price);

        assert!(matches!(
            repo.restore_item(id).await,
            Err(CheckoutError::ItemNotFound { .. })
        ));
    }
}
