//! Product Category Records

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{domain::errors::UnknownVariant, ids::TypedId};

/// Category Id
pub type CategoryId = TypedId<ProductCategoryRecord>;

/// Product Category Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCategoryRecord {
    pub id: Option<CategoryId>,
    pub name: String,
    pub types: BTreeSet<CategoryType>,
}

/// Storage classification attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Perishable,
    LongTerm,
    FridgeStorage,
    FreezerStorage,
    PantryStorage,
}

impl CategoryType {
    pub const ALL: [Self; 5] = [
        Self::Perishable,
        Self::LongTerm,
        Self::FridgeStorage,
        Self::FreezerStorage,
        Self::PantryStorage,
    ];

    /// Stable key persisted in `categories_to_types.type_key`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Perishable => "PERISHABLE",
            Self::LongTerm => "LONG_TERM",
            Self::FridgeStorage => "FRIDGE_STORAGE",
            Self::FreezerStorage => "FREEZER_STORAGE",
            Self::PantryStorage => "PANTRY_STORAGE",
        }
    }
}

impl FromStr for CategoryType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| UnknownVariant {
                kind: "category type",
                value: value.to_string(),
            })
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
