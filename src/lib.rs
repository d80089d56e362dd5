//! ScentCart — Cart Pricing & Aggregation Engine
//!
//! One pricing/aggregation core for a fragrance storefront, shared by the
//! server-persisted cart and the guest-session cart.
//!
//! ## Features
//! - Merge-aware line items (product + size) and fixed-price bundles
//! - Locked-in price snapshots per line item
//! - Derived totals recomputed after every mutation
//! - Guest-to-authenticated cart merge
//! - Pluggable persistence behind `CartStore`

use thiserror::Error;

pub mod domain;
pub mod service;
pub mod store;

pub use domain::aggregates::{BundleItem, Cart, LineItem};
pub use domain::value_objects::{Money, Quantity, MAX_PER_LINE};
pub use service::CartService;
pub use store::{CartStore, InMemoryCartStore, OwnerRef};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CartError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cart entry not found: {0}")]
    NotFound(String),

    #[error("quantity cap of {max} reached (requested {requested})")]
    Capacity { requested: u32, max: u32 },

    #[error("storage error: {0}")]
    Persistence(String),
}

impl CartError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn capacity(requested: u32) -> Self {
        Self::Capacity {
            requested,
            max: domain::value_objects::MAX_PER_LINE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CartError>;
