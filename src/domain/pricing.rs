//! Pricing Calculator
//!
//! Pure price arithmetic: no catalog access, no I/O. Discounts outside
//! `[0, 100]` are rejected rather than clamped so a corrupt percentage can
//! never propagate into cart totals.

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::value_objects::Money;
use crate::{CartError, Result};

/// A size-specific price override on a product (e.g. "50ml", "100ml").
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SizePrice {
    pub label: String,
    pub price: Money,
}

/// Reject discount percentages outside `[0, 100]`.
pub fn validate_discount(discount_percent: Decimal) -> Result<()> {
    if discount_percent < Decimal::ZERO || discount_percent > Decimal::from(100) {
        return Err(CartError::validation(format!(
            "discount percent {} outside 0..=100",
            discount_percent
        )));
    }
    Ok(())
}

/// Effective (post-discount) unit price: `base × (1 − d/100)`, 2dp half-up.
pub fn effective_price(base: &Money, discount_percent: Decimal) -> Result<Money> {
    validate_discount(discount_percent)?;
    if discount_percent.is_zero() {
        return Ok(base.clone());
    }
    let factor = Decimal::ONE - discount_percent / Decimal::from(100);
    Ok(Money::new(base.amount() * factor, base.currency()).rounded())
}

/// Back-compute the pre-discount price from an effective price:
/// `effective / (1 − d/100)`, 2dp half-up.
///
/// A discount of exactly 100% is rejected: the original price is not
/// recoverable from a zero effective price.
pub fn original_price(effective: &Money, discount_percent: Decimal) -> Result<Money> {
    validate_discount(discount_percent)?;
    if discount_percent.is_zero() {
        return Ok(effective.clone());
    }
    if discount_percent == Decimal::from(100) {
        return Err(CartError::validation(
            "cannot derive original price from a 100% discount",
        ));
    }
    let factor = Decimal::ONE - discount_percent / Decimal::from(100);
    Ok(Money::new(effective.amount() / factor, effective.currency()).rounded())
}

/// Resolve the base price for a requested size label.
///
/// A missing size entry is a catalog data-quality issue, not a cart failure:
/// the product's base price is used and the mismatch is logged.
pub fn price_for_size(base: &Money, size_prices: &[SizePrice], size: &str) -> Money {
    match size_prices.iter().find(|sp| sp.label == size) {
        Some(sp) => sp.price.clone(),
        None => {
            if !size_prices.is_empty() {
                warn!(size = %size, "no price entry for requested size, falling back to base price");
            }
            base.clone()
        }
    }
}
