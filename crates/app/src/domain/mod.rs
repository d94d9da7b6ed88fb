//! Inventory Domain Concerns

pub mod categories;
pub mod errors;
pub mod orders;
pub mod products;
