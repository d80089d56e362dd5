//! Domain layer: value objects, pricing, and the cart aggregate.

pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod value_objects;
