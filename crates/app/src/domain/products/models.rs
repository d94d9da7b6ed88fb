//! Product Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    categories::models::ProductCategory,
    products::records::{ProductId, ProductRecord},
};

/// Product Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub available: bool,
    #[serde(default, rename = "productCategories")]
    pub categories: Vec<ProductCategory>,
}

impl Product {
    /// Line value of this product: `price × quantity`, `None` on overflow.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            id: record.id.map(ProductId::into_i64),
            name: record.name,
            price: record.price,
            quantity: record.quantity,
            available: record.available,
            categories: record.categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Product> for ProductRecord {
    fn from(model: Product) -> Self {
        Self {
            id: model.id.map(ProductId::from_i64),
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            available: model.available,
            categories: model.categories.into_iter().map(Into::into).collect(),
        }
    }
}
