//! Mutation orchestration
//!
//! Every operation follows the same sequence: validate input → load and
//! normalize the owner's cart (or create it empty) → mutate the aggregate →
//! persist → return the full recomputed cart. Callers always get the whole
//! cart back, never a delta, so the response is the new source of truth.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;
use validator::Validate;

use crate::domain::aggregates::{Cart, NewBundleItem, NewLineItem, DEFAULT_CURRENCY};
use crate::domain::pricing;
use crate::domain::value_objects::Money;
use crate::store::{CartStore, OwnerRef};
use crate::{CartError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[validate(length(min = 1, message = "product id is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "size is required"))]
    pub size: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Pre-discount price. When omitted it is derived from the effective
    /// price and the discount percentage.
    #[serde(default)]
    pub original_unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddBundleRequest {
    #[validate(length(min = 1, message = "bundle id is required"))]
    pub bundle_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetQuantityRequest {
    /// Zero removes the entry.
    pub quantity: u32,
}

pub struct CartService<S: CartStore> {
    store: S,
    currency: String,
}

impl<S: CartStore> CartService<S> {
    pub fn new(store: S) -> Self {
        Self::with_currency(store, DEFAULT_CURRENCY)
    }

    pub fn with_currency(store: S, currency: &str) -> Self {
        Self { store, currency: currency.to_string() }
    }

    /// Fetch the owner's cart, creating and persisting an empty one on first
    /// access. Loaded state is normalized; serialized totals are never
    /// returned as-is.
    pub async fn get_cart(&self, owner: &OwnerRef) -> Result<Cart> {
        match self.store.load(owner).await? {
            Some(mut cart) => {
                cart.normalize();
                Ok(cart)
            }
            None => {
                let cart = self.new_cart_for(owner);
                self.store.save(owner, &cart).await?;
                Ok(cart)
            }
        }
    }

    pub async fn add_item(&self, owner: &OwnerRef, req: AddItemRequest) -> Result<Cart> {
        req.validate().map_err(|e| CartError::Validation(e.to_string()))?;
        debug!(owner = %owner, product_id = %req.product_id, size = %req.size,
               quantity = req.quantity, "add item");
        let unit_price = Money::new(req.unit_price, &self.currency);
        let original_unit_price = match req.original_unit_price {
            Some(amount) => Money::new(amount, &self.currency),
            None => pricing::original_price(&unit_price, req.discount_percent)?,
        };
        let mut cart = self.load_or_create(owner).await?;
        cart.add_item(NewLineItem {
            product_id: req.product_id,
            size: req.size,
            quantity: req.quantity,
            unit_price,
            original_unit_price,
            discount_percent: req.discount_percent,
        })?;
        self.commit(owner, cart).await
    }

    pub async fn add_bundle(&self, owner: &OwnerRef, req: AddBundleRequest) -> Result<Cart> {
        req.validate().map_err(|e| CartError::Validation(e.to_string()))?;
        debug!(owner = %owner, bundle_id = %req.bundle_id, quantity = req.quantity, "add bundle");
        let mut cart = self.load_or_create(owner).await?;
        cart.add_bundle(NewBundleItem {
            bundle_id: req.bundle_id,
            quantity: req.quantity,
            unit_price: Money::new(req.unit_price, &self.currency),
        })?;
        self.commit(owner, cart).await
    }

    pub async fn set_quantity(
        &self,
        owner: &OwnerRef,
        entry_id: &str,
        quantity: u32,
    ) -> Result<Cart> {
        debug!(owner = %owner, entry_id = %entry_id, quantity = quantity, "set quantity");
        let mut cart = self.load_or_create(owner).await?;
        cart.set_quantity(entry_id, quantity)?;
        self.commit(owner, cart).await
    }

    pub async fn increment(&self, owner: &OwnerRef, entry_id: &str) -> Result<Cart> {
        debug!(owner = %owner, entry_id = %entry_id, "increment");
        let mut cart = self.load_or_create(owner).await?;
        cart.increment(entry_id)?;
        self.commit(owner, cart).await
    }

    pub async fn decrement(&self, owner: &OwnerRef, entry_id: &str) -> Result<Cart> {
        debug!(owner = %owner, entry_id = %entry_id, "decrement");
        let mut cart = self.load_or_create(owner).await?;
        cart.decrement(entry_id)?;
        self.commit(owner, cart).await
    }

    /// Remove an entry. Idempotent: removing an absent id succeeds and
    /// returns the cart unchanged, so retries are safe.
    pub async fn remove_item(&self, owner: &OwnerRef, entry_id: &str) -> Result<Cart> {
        debug!(owner = %owner, entry_id = %entry_id, "remove item");
        let mut cart = self.load_or_create(owner).await?;
        cart.remove_entry(entry_id);
        self.commit(owner, cart).await
    }

    pub async fn clear(&self, owner: &OwnerRef) -> Result<Cart> {
        debug!(owner = %owner, "clear cart");
        let mut cart = self.load_or_create(owner).await?;
        cart.clear();
        self.commit(owner, cart).await
    }

    /// Fold a guest-session cart into the authenticated user's cart on
    /// login. Best effort: colliding lines sum quantities capped at the line
    /// maximum, and the guest cart is discarded after a successful merge.
    /// Concurrent logins race; last merge wins.
    pub async fn merge_guest_into_user(
        &self,
        guest_owner: &OwnerRef,
        user_owner: &OwnerRef,
    ) -> Result<Cart> {
        let guest = match self.store.load(guest_owner).await? {
            Some(mut guest) => {
                guest.normalize();
                guest
            }
            None => return self.get_cart(user_owner).await,
        };
        debug!(guest = %guest_owner, user = %user_owner,
               guest_lines = guest.items().len() + guest.bundle_items().len(), "merge guest cart");
        let mut user = self.load_or_create(user_owner).await?;
        user.merge_from_guest(guest);
        let user = self.commit(user_owner, user).await?;
        self.store.delete(guest_owner).await?;
        Ok(user)
    }

    async fn load_or_create(&self, owner: &OwnerRef) -> Result<Cart> {
        match self.store.load(owner).await? {
            Some(mut cart) => {
                cart.normalize();
                Ok(cart)
            }
            None => Ok(self.new_cart_for(owner)),
        }
    }

    fn new_cart_for(&self, owner: &OwnerRef) -> Cart {
        match owner {
            OwnerRef::Customer(id) => Cart::for_customer(id.clone(), &self.currency),
            OwnerRef::Guest(session) => Cart::for_guest(session.clone(), &self.currency),
        }
    }

    /// Persist only after the in-memory recompute succeeded, then hand the
    /// full cart back. Domain events are drained into the log here.
    async fn commit(&self, owner: &OwnerRef, mut cart: Cart) -> Result<Cart> {
        for event in cart.take_events() {
            debug!(?event, "cart event");
        }
        self.store.save(owner, &cart).await?;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCartStore;

    fn service() -> CartService<InMemoryCartStore> {
        CartService::new(InMemoryCartStore::new())
    }

    fn add_req(product_id: &str, size: &str, quantity: u32) -> AddItemRequest {
        AddItemRequest {
            product_id: product_id.into(),
            size: size.into(),
            quantity,
            unit_price: Decimal::from(80),
            original_unit_price: Some(Decimal::from(100)),
            discount_percent: Decimal::from(20),
        }
    }

    #[tokio::test]
    async fn get_cart_creates_empty_on_first_access() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        let cart = svc.get_cart(&owner).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        // the created cart was persisted, not just returned
        let again = svc.get_cart(&owner).await.unwrap();
        assert_eq!(again.id(), cart.id());
    }

    #[tokio::test]
    async fn add_item_scenario_end_to_end() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        svc.add_item(&owner, add_req("P1", "50ml", 1)).await.unwrap();
        let cart = svc.add_item(&owner, add_req("P1", "50ml", 2)).await.unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price().amount(), Decimal::from(240));
        assert_eq!(cart.total_discount().amount(), Decimal::from(60));
        // and the persisted copy agrees
        let reloaded = svc.get_cart(&owner).await.unwrap();
        assert_eq!(reloaded.total_price().amount(), Decimal::from(240));
    }

    #[tokio::test]
    async fn missing_original_price_is_derived() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        let mut req = add_req("P1", "50ml", 1);
        req.original_unit_price = None;
        let cart = svc.add_item(&owner, req).await.unwrap();
        assert_eq!(cart.items()[0].original_unit_price.amount(), Decimal::from(100));
        assert_eq!(cart.total_discount().amount(), Decimal::from(20));
    }

    #[tokio::test]
    async fn capacity_error_leaves_stored_cart_untouched() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        svc.add_item(&owner, add_req("P1", "50ml", 7)).await.unwrap();
        let err = svc.add_item(&owner, add_req("P1", "50ml", 5)).await.unwrap_err();
        assert!(matches!(err, CartError::Capacity { .. }));
        let cart = svc.get_cart(&owner).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[tokio::test]
    async fn blank_identifiers_are_rejected() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        let err = svc.add_item(&owner, add_req("", "50ml", 1)).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        let err = svc
            .add_bundle(&owner, AddBundleRequest {
                bundle_id: "".into(),
                quantity: 1,
                unit_price: Decimal::from(50),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[tokio::test]
    async fn set_quantity_zero_removes_and_persists() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        let cart = svc.add_item(&owner, add_req("P1", "50ml", 2)).await.unwrap();
        let entry_id = cart.items()[0].id.clone();
        let cart = svc.set_quantity(&owner, &entry_id, 0).await.unwrap();
        assert!(cart.is_empty());
        let reloaded = svc.get_cart(&owner).await.unwrap();
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.total_price().amount(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn update_like_operations_report_not_found() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        svc.add_item(&owner, add_req("P1", "50ml", 1)).await.unwrap();
        for result in [
            svc.set_quantity(&owner, "missing", 2).await,
            svc.increment(&owner, "missing").await,
            svc.decrement(&owner, "missing").await,
        ] {
            assert!(matches!(result.unwrap_err(), CartError::NotFound(_)));
        }
        // but remove stays idempotent
        let cart = svc.remove_item(&owner, "missing").await.unwrap();
        assert_eq!(cart.total_items(), 1);
    }

    #[tokio::test]
    async fn merge_discards_guest_cart() {
        let svc = service();
        let guest = OwnerRef::Guest("session-1".into());
        let user = OwnerRef::Customer("C1".into());
        svc.add_item(&guest, add_req("P1", "50ml", 2)).await.unwrap();
        svc.add_item(&user, add_req("P1", "50ml", 3)).await.unwrap();

        let merged = svc.merge_guest_into_user(&guest, &user).await.unwrap();
        assert_eq!(merged.items().len(), 1);
        assert_eq!(merged.items()[0].quantity, 5);

        // guest cart is gone: next access starts empty
        let guest_cart = svc.get_cart(&guest).await.unwrap();
        assert!(guest_cart.is_empty());
    }

    #[tokio::test]
    async fn merge_with_no_guest_cart_is_a_noop() {
        let svc = service();
        let guest = OwnerRef::Guest("session-1".into());
        let user = OwnerRef::Customer("C1".into());
        svc.add_item(&user, add_req("P1", "50ml", 3)).await.unwrap();
        let merged = svc.merge_guest_into_user(&guest, &user).await.unwrap();
        assert_eq!(merged.total_items(), 3);
    }

    #[tokio::test]
    async fn clear_resets_to_empty() {
        let svc = service();
        let owner = OwnerRef::Customer("C1".into());
        svc.add_item(&owner, add_req("P1", "50ml", 2)).await.unwrap();
        svc.add_bundle(&owner, AddBundleRequest {
            bundle_id: "B1".into(),
            quantity: 1,
            unit_price: Decimal::from(50),
        })
        .await
        .unwrap();
        let cart = svc.clear(&owner).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price().amount(), Decimal::ZERO);
    }
}
