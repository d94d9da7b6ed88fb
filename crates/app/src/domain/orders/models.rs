//! Order Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    orders::records::{OrderDetailsRecord, OrderId, OrderStatus},
    products::models::Product,
};

/// Order Details Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "orderStatus")]
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl From<OrderDetailsRecord> for OrderDetails {
    fn from(record: OrderDetailsRecord) -> Self {
        Self {
            id: record.id.map(OrderId::into_i64),
            status: record.status,
            total_amount: record.total_amount,
            products: record.products.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderDetails> for OrderDetailsRecord {
    fn from(model: OrderDetails) -> Self {
        Self {
            id: model.id.map(OrderId::from_i64),
            status: model.status,
            total_amount: model.total_amount,
            products: model.products.into_iter().map(Into::into).collect(),
        }
    }
}
