//! Aggregates module
pub mod cart;

pub use cart::{BundleItem, Cart, LineItem, NewBundleItem, NewLineItem, DEFAULT_CURRENCY};
