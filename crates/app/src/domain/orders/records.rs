//! Order Records

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{errors::UnknownVariant, products::records::ProductRecord},
    ids::TypedId,
};

/// Order Id
pub type OrderId = TypedId<OrderDetailsRecord>;

/// Order Details Record
///
/// `products` are the line items in position order; one product may appear more
/// than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetailsRecord {
    pub id: Option<OrderId>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub products: Vec<ProductRecord>,
}

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::Confirmed, Self::Completed, Self::Cancelled];

    /// Stable key persisted in `order_details.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| UnknownVariant {
                kind: "order status",
                value: value.to_string(),
            })
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_from_their_keys() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = "SHIPPED".parse::<OrderStatus>();

        assert!(matches!(result, Err(UnknownVariant { kind: "order status", .. })));
    }
}
