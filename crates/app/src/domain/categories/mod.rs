//! Product Categories

pub mod models;
pub mod records;
pub mod service;
pub mod store;

pub use service::*;
