//! Domain events
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Cart(CartEvent),
}

#[derive(Clone, Debug)]
pub enum CartEvent {
    ItemAdded { cart_id: String, product_id: String, size: String, quantity: u32 },
    BundleAdded { cart_id: String, bundle_id: String, quantity: u32 },
    QuantityChanged { cart_id: String, entry_id: String, quantity: u32 },
    EntryRemoved { cart_id: String, entry_id: String },
    Cleared { cart_id: String },
    GuestMerged { cart_id: String, merged_lines: usize, total_price: Decimal },
}
