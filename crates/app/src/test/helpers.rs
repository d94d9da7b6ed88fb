//! Builders for unsaved transfer models.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::domain::{
    categories::{models::ProductCategory, records::CategoryType},
    products::models::Product,
};

pub(crate) fn new_category(name: &str, types: &[CategoryType]) -> ProductCategory {
    ProductCategory {
        id: None,
        name: name.to_string(),
        types: types.iter().copied().collect::<BTreeSet<_>>(),
    }
}

pub(crate) fn new_product(name: &str, price: Decimal, quantity: u32) -> Product {
    Product {
        id: None,
        name: name.to_string(),
        price,
        quantity,
        available: true,
        categories: Vec::new(),
    }
}
