//! Products

pub mod models;
pub mod records;
pub mod repository;
pub mod service;
pub mod store;

pub use service::*;
