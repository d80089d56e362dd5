//! Cart Aggregate
//!
//! Owns the line items and bundles of one cart and keeps the derived totals
//! consistent: every mutation ends with a full [`Cart::recalculate`] pass, so
//! `totalItems`/`totalPrice`/`totalDiscount` are never written independently.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::pricing;
use crate::domain::value_objects::{Money, Quantity, MAX_PER_LINE};
use crate::{CartError, Result};

pub const DEFAULT_CURRENCY: &str = "INR";

/// A single product+size entry with its price snapshot locked in at add time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub original_unit_price: Money,
    pub discount_percent: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Savings contributed by this line: `(original − unit) × quantity`.
    pub fn line_discount(&self) -> Money {
        self.original_unit_price
            .subtract(&self.unit_price)
            .map(|d| d.multiply(self.quantity))
            .unwrap_or_else(|_| Money::zero(self.unit_price.currency()))
    }
}

/// A fixed-price group of products sold as one cart entry. Bundles carry no
/// per-item discount, so they never contribute to the discount total.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleItem {
    pub id: String,
    pub bundle_id: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl BundleItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Input for [`Cart::add_item`]: everything but the entry id, which the cart
/// assigns on insert.
#[derive(Clone, Debug)]
pub struct NewLineItem {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub original_unit_price: Money,
    pub discount_percent: Decimal,
}

#[derive(Clone, Debug)]
pub struct NewBundleItem {
    pub bundle_id: String,
    pub quantity: u32,
    pub unit_price: Money,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cart {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    currency: String,
    items: Vec<LineItem>,
    bundle_items: Vec<BundleItem>,
    total_items: u32,
    total_price: Money,
    total_discount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id: None,
            session_id: None,
            currency: currency.to_string(),
            items: vec![],
            bundle_items: vec![],
            total_items: 0,
            total_price: Money::zero(currency),
            total_discount: Money::zero(currency),
            created_at: now,
            updated_at: now,
            events: vec![],
        }
    }

    pub fn for_customer(customer_id: impl Into<String>, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.customer_id = Some(customer_id.into());
        cart
    }

    pub fn for_guest(session_id: impl Into<String>, currency: &str) -> Self {
        let mut cart = Self::new(currency);
        cart.session_id = Some(session_id.into());
        cart
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn customer_id(&self) -> Option<&str> { self.customer_id.as_deref() }
    pub fn session_id(&self) -> Option<&str> { self.session_id.as_deref() }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn bundle_items(&self) -> &[BundleItem] { &self.bundle_items }
    pub fn total_items(&self) -> u32 { self.total_items }
    pub fn total_price(&self) -> &Money { &self.total_price }
    pub fn total_discount(&self) -> &Money { &self.total_discount }
    pub fn is_empty(&self) -> bool { self.items.is_empty() && self.bundle_items.is_empty() }

    /// Add a product line, merging by `(product_id, size)`.
    ///
    /// On merge the stored price snapshot wins: a different snapshot in the
    /// incoming request does not overwrite what the cart locked in. A merged
    /// quantity past the cap is rejected and the stored quantity is left
    /// untouched.
    pub fn add_item(&mut self, new: NewLineItem) -> Result<()> {
        if new.product_id.is_empty() {
            return Err(CartError::validation("missing product id"));
        }
        pricing::validate_discount(new.discount_percent)?;
        self.check_currency(&new.unit_price)?;
        self.check_currency(&new.original_unit_price)?;
        let qty = Quantity::new(new.quantity)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == new.product_id && i.size == new.size)
        {
            let merged = Quantity::new(existing.quantity)?.checked_add(qty.value())?;
            existing.quantity = merged.value();
        } else {
            self.items.push(LineItem {
                id: Uuid::new_v4().to_string(),
                product_id: new.product_id.clone(),
                size: new.size.clone(),
                quantity: qty.value(),
                unit_price: new.unit_price,
                original_unit_price: new.original_unit_price,
                discount_percent: new.discount_percent,
            });
        }
        self.raise_event(CartEvent::ItemAdded {
            cart_id: self.id.clone(),
            product_id: new.product_id,
            size: new.size,
            quantity: qty.value(),
        });
        self.recalculate();
        Ok(())
    }

    /// Add a bundle line, merging by `bundle_id`.
    pub fn add_bundle(&mut self, new: NewBundleItem) -> Result<()> {
        if new.bundle_id.is_empty() {
            return Err(CartError::validation("missing bundle id"));
        }
        self.check_currency(&new.unit_price)?;
        let qty = Quantity::new(new.quantity)?;

        if let Some(existing) = self
            .bundle_items
            .iter_mut()
            .find(|b| b.bundle_id == new.bundle_id)
        {
            let merged = Quantity::new(existing.quantity)?.checked_add(qty.value())?;
            existing.quantity = merged.value();
        } else {
            self.bundle_items.push(BundleItem {
                id: Uuid::new_v4().to_string(),
                bundle_id: new.bundle_id.clone(),
                quantity: qty.value(),
                unit_price: new.unit_price,
            });
        }
        self.raise_event(CartEvent::BundleAdded {
            cart_id: self.id.clone(),
            bundle_id: new.bundle_id,
            quantity: qty.value(),
        });
        self.recalculate();
        Ok(())
    }

    /// Overwrite an entry's quantity. Zero removes the entry; past-cap values
    /// are rejected; an unknown id is NotFound. Entry ids are unique across
    /// items and bundles, so one id space addresses both.
    pub fn set_quantity(&mut self, entry_id: &str, quantity: u32) -> Result<()> {
        if self.entry_quantity(entry_id).is_none() {
            return Err(CartError::NotFound(entry_id.to_string()));
        }
        if quantity == 0 {
            self.delete_entry(entry_id);
            self.raise_event(CartEvent::EntryRemoved {
                cart_id: self.id.clone(),
                entry_id: entry_id.to_string(),
            });
            self.recalculate();
            return Ok(());
        }
        let qty = Quantity::new(quantity)?;
        if let Some(item) = self.items.iter_mut().find(|i| i.id == entry_id) {
            item.quantity = qty.value();
        } else if let Some(bundle) = self.bundle_items.iter_mut().find(|b| b.id == entry_id) {
            bundle.quantity = qty.value();
        }
        self.raise_event(CartEvent::QuantityChanged {
            cart_id: self.id.clone(),
            entry_id: entry_id.to_string(),
            quantity: qty.value(),
        });
        self.recalculate();
        Ok(())
    }

    pub fn increment(&mut self, entry_id: &str) -> Result<()> {
        let current = self
            .entry_quantity(entry_id)
            .ok_or_else(|| CartError::NotFound(entry_id.to_string()))?;
        self.set_quantity(entry_id, current.saturating_add(1))
    }

    /// Decrement by one; at quantity 1 the entry is removed, never negative.
    pub fn decrement(&mut self, entry_id: &str) -> Result<()> {
        let current = self
            .entry_quantity(entry_id)
            .ok_or_else(|| CartError::NotFound(entry_id.to_string()))?;
        self.set_quantity(entry_id, current - 1)
    }

    /// Delete by entry id. Absent ids are a no-op so retries stay idempotent.
    pub fn remove_entry(&mut self, entry_id: &str) {
        let before = self.items.len() + self.bundle_items.len();
        self.delete_entry(entry_id);
        if self.items.len() + self.bundle_items.len() != before {
            self.raise_event(CartEvent::EntryRemoved {
                cart_id: self.id.clone(),
                entry_id: entry_id.to_string(),
            });
            self.recalculate();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.bundle_items.clear();
        self.raise_event(CartEvent::Cleared { cart_id: self.id.clone() });
        self.recalculate();
    }

    /// Fold a guest-session cart into this one on login.
    ///
    /// Union of lines; colliding keys sum quantities capped at the line
    /// maximum, silently dropping the excess — this runs without user
    /// confirmation, so it must not fail. The guest cart is consumed.
    pub fn merge_from_guest(&mut self, guest: Cart) {
        let mut merged_lines = 0usize;
        for line in guest.items {
            merged_lines += 1;
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|i| i.product_id == line.product_id && i.size == line.size)
            {
                existing.quantity =
                    existing.quantity.saturating_add(line.quantity).min(MAX_PER_LINE);
            } else {
                self.items.push(LineItem {
                    id: Uuid::new_v4().to_string(),
                    quantity: line.quantity.min(MAX_PER_LINE).max(1),
                    ..line
                });
            }
        }
        for bundle in guest.bundle_items {
            merged_lines += 1;
            if let Some(existing) = self
                .bundle_items
                .iter_mut()
                .find(|b| b.bundle_id == bundle.bundle_id)
            {
                existing.quantity =
                    existing.quantity.saturating_add(bundle.quantity).min(MAX_PER_LINE);
            } else {
                self.bundle_items.push(BundleItem {
                    id: Uuid::new_v4().to_string(),
                    quantity: bundle.quantity.min(MAX_PER_LINE).max(1),
                    ..bundle
                });
            }
        }
        self.recalculate();
        self.raise_event(CartEvent::GuestMerged {
            cart_id: self.id.clone(),
            merged_lines,
            total_price: self.total_price.amount(),
        });
    }

    /// Defensive pass over freshly loaded state: drop rows with no quantity,
    /// clamp rows past the cap, and recompute the totals. Stored totals are
    /// never trusted.
    pub fn normalize(&mut self) {
        self.items.retain(|i| i.quantity > 0);
        self.bundle_items.retain(|b| b.quantity > 0);
        for item in &mut self.items {
            item.quantity = item.quantity.min(MAX_PER_LINE);
        }
        for bundle in &mut self.bundle_items {
            bundle.quantity = bundle.quantity.min(MAX_PER_LINE);
        }
        self.recalculate();
    }

    /// Aggregator: recompute the derived totals from the current lines.
    ///
    /// Pure over the cart's own state — nothing outside the line items is
    /// read, so two consecutive passes yield identical totals.
    fn recalculate(&mut self) {
        let mut total_items = 0u32;
        let mut price = Decimal::ZERO;
        let mut discount = Decimal::ZERO;
        for item in &self.items {
            total_items += item.quantity;
            price += item.line_total().amount();
            discount += item.line_discount().amount();
        }
        for bundle in &self.bundle_items {
            total_items += bundle.quantity;
            price += bundle.line_total().amount();
        }
        self.total_items = total_items;
        self.total_price = Money::new(price, &self.currency).rounded();
        self.total_discount = Money::new(discount, &self.currency).rounded();
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn entry_quantity(&self, entry_id: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|i| i.id == entry_id)
            .map(|i| i.quantity)
            .or_else(|| {
                self.bundle_items
                    .iter()
                    .find(|b| b.id == entry_id)
                    .map(|b| b.quantity)
            })
    }

    fn delete_entry(&mut self, entry_id: &str) {
        self.items.retain(|i| i.id != entry_id);
        self.bundle_items.retain(|b| b.id != entry_id);
    }

    fn check_currency(&self, price: &Money) -> Result<()> {
        if price.currency() != self.currency {
            return Err(CartError::validation(format!(
                "price currency {} does not match cart currency {}",
                price.currency(),
                self.currency
            )));
        }
        Ok(())
    }

    fn raise_event(&mut self, e: CartEvent) {
        self.events.push(DomainEvent::Cart(e));
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
