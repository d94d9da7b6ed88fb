//! Product Category Models

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::categories::records::{CategoryId, CategoryType, ProductCategoryRecord};

/// Product Category Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub types: BTreeSet<CategoryType>,
}

impl From<ProductCategoryRecord> for ProductCategory {
    fn from(record: ProductCategoryRecord) -> Self {
        Self {
            id: record.id.map(CategoryId::into_i64),
            name: record.name,
            types: record.types,
        }
    }
}

impl From<ProductCategory> for ProductCategoryRecord {
    fn from(model: ProductCategory) -> Self {
        Self {
            id: model.id.map(CategoryId::from_i64),
            name: model.name,
            types: model.types,
        }
    }
}
