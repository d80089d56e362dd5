//! Value Objects for the cart core

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on the quantity of any single cart entry.
pub const MAX_PER_LINE: u32 = 10;

/// Money value object
///
/// Amounts are kept as exact decimals; rounding to the currency's 2-digit
/// minor unit happens explicitly via [`Money::rounded`], round-half-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount - other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }

    /// Round to 2 decimal places, half-up.
    pub fn rounded(&self) -> Money {
        let amount = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Money::new(amount, &self.currency)
    }
}

#[derive(Debug, Clone)]
pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency mismatch")
    }
}

/// Quantity value object, bounded to `1..=MAX_PER_LINE` at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        if value > MAX_PER_LINE { return Err(QuantityError::OverCap(value)); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }

    /// Sum with another quantity, rejecting totals past the cap.
    pub fn checked_add(&self, other: u32) -> Result<Self, QuantityError> {
        Self::new(self.0.saturating_add(other))
    }
}

#[derive(Debug, Clone)]
pub enum QuantityError { Zero, OverCap(u32) }
impl std::error::Error for QuantityError {}

impl From<QuantityError> for crate::CartError {
    fn from(e: QuantityError) -> Self {
        match e {
            QuantityError::Zero => crate::CartError::validation(e.to_string()),
            QuantityError::OverCap(v) => crate::CartError::capacity(v),
        }
    }
}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "Quantity must be at least 1"),
            Self::OverCap(v) => write!(f, "Quantity {} exceeds cap of {}", v, MAX_PER_LINE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add_subtract() {
        let a = Money::new(Decimal::new(100, 0), "INR");
        let b = Money::new(Decimal::new(50, 0), "INR");
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
        assert_eq!(a.subtract(&b).unwrap().amount(), Decimal::new(50, 0));
        let c = Money::new(Decimal::new(50, 0), "USD");
        assert!(a.add(&c).is_err());
    }

    #[test]
    fn test_money_rounded_half_up() {
        let m = Money::new(Decimal::new(33335, 3), "INR"); // 33.335
        assert_eq!(m.rounded().amount(), Decimal::new(3334, 2)); // 33.34
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(11).is_err());
        let q = Quantity::new(7).unwrap();
        assert!(q.checked_add(5).is_err());
        assert_eq!(q.checked_add(3).unwrap().value(), 10);
    }
}
