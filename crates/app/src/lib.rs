//! Inventory and order persistence: stores, aggregate repositories and services.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod ids;

#[cfg(test)]
mod test;
