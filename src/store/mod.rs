//! Persistence boundary
//!
//! The core never talks to storage directly; it goes through [`CartStore`].
//! One cart per owner: either an authenticated customer or a guest session.
//! The bundled [`InMemoryCartStore`] backs the guest/ephemeral path and the
//! tests; a database-backed adapter implements the same trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::aggregates::Cart;
use crate::Result;

/// Identifies the exclusive owner of one cart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerRef {
    Customer(String),
    Guest(String),
}

impl OwnerRef {
    /// Parse the path form used by the gateway: `guest:<session>` for guest
    /// sessions, anything else is a customer id.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("guest:") {
            Some(session) => Self::Guest(session.to_string()),
            None => Self::Customer(raw.to_string()),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer(id) => write!(f, "{}", id),
            Self::Guest(session) => write!(f, "guest:{}", session),
        }
    }
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, owner: &OwnerRef) -> Result<Option<Cart>>;
    async fn save(&self, owner: &OwnerRef, cart: &Cart) -> Result<()>;
    async fn delete(&self, owner: &OwnerRef) -> Result<()>;
}

/// In-memory adapter: one map entry per owner behind an async `RwLock`.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<OwnerRef, Cart>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, owner: &OwnerRef) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(owner).cloned())
    }

    async fn save(&self, owner: &OwnerRef, cart: &Cart) -> Result<()> {
        self.carts.write().await.insert(owner.clone(), cart.clone());
        Ok(())
    }

    async fn delete(&self, owner: &OwnerRef) -> Result<()> {
        self.carts.write().await.remove(owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Cart, NewLineItem};
    use crate::domain::value_objects::Money;
    use rust_decimal::Decimal;

    fn cart_with_one_item(owner: &OwnerRef) -> Cart {
        let mut cart = match owner {
            OwnerRef::Customer(id) => Cart::for_customer(id.clone(), "INR"),
            OwnerRef::Guest(session) => Cart::for_guest(session.clone(), "INR"),
        };
        cart.add_item(NewLineItem {
            product_id: "P1".into(),
            size: "50ml".into(),
            quantity: 1,
            unit_price: Money::new(Decimal::from(80), "INR"),
            original_unit_price: Money::new(Decimal::from(100), "INR"),
            discount_percent: Decimal::from(20),
        })
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn save_load_delete_roundtrip() {
        let store = InMemoryCartStore::new();
        let owner = OwnerRef::Customer("C1".into());
        assert!(store.load(&owner).await.unwrap().is_none());

        let cart = cart_with_one_item(&owner);
        store.save(&owner, &cart).await.unwrap();
        let loaded = store.load(&owner).await.unwrap().unwrap();
        assert_eq!(loaded.id(), cart.id());
        assert_eq!(loaded.total_items(), 1);

        store.delete(&owner).await.unwrap();
        assert!(store.load(&owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let store = InMemoryCartStore::new();
        let customer = OwnerRef::Customer("C1".into());
        let guest = OwnerRef::Guest("C1".into()); // same raw id, different owner kind
        store.save(&customer, &cart_with_one_item(&customer)).await.unwrap();
        assert!(store.load(&guest).await.unwrap().is_none());
    }

    #[test]
    fn owner_ref_parse_roundtrip() {
        let guest = OwnerRef::parse("guest:abc-123");
        assert_eq!(guest, OwnerRef::Guest("abc-123".into()));
        assert!(guest.is_guest());
        assert_eq!(guest.to_string(), "guest:abc-123");
        let customer = OwnerRef::parse("C42");
        assert_eq!(customer, OwnerRef::Customer("C42".into()));
        assert_eq!(customer.to_string(), "C42");
    }
}
