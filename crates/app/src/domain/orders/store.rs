//! Orders Store

use async_trait::async_trait;
use mockall::automock;
use sqlx::{FromRow, PgConnection, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::domain::{
    errors::{StoreError, WriteFailure, decode_error, expect_rows},
    orders::records::{OrderDetailsRecord, OrderId, OrderStatus},
    products::records::{ProductId, ProductRecord},
};

const ENTITY: &str = "order";

const COLUMN_STATUS: &str = "status";

const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LIST_ORDER_IDS_SQL: &str = include_str!("sql/list_order_ids.sql");
const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_PRODUCTS_SQL: &str = include_str!("sql/create_order_products.sql");
const UPDATE_ORDER_SQL: &str = include_str!("sql/update_order.sql");
const DELETE_ORDER_PRODUCTS_SQL: &str = include_str!("sql/delete_order_products.sql");
const DELETE_ORDER_SQL: &str = include_str!("sql/delete_order.sql");

/// Row access for `order_details` and its `details_to_products` line items.
///
/// Reads return the scalar columns only; the order repository loads the line items.
#[automock]
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<OrderDetailsRecord, StoreError>;

    async fn get_all(&self, conn: &mut PgConnection)
    -> Result<Vec<OrderDetailsRecord>, StoreError>;

    /// Insert the order row, then one line item per product in list order.
    async fn create(
        &self,
        conn: &mut PgConnection,
        order: OrderDetailsRecord,
    ) -> Result<OrderDetailsRecord, StoreError>;

    /// Rewrite status and total, then replace the line items.
    async fn update(
        &self,
        conn: &mut PgConnection,
        order: OrderDetailsRecord,
    ) -> Result<OrderDetailsRecord, StoreError>;

    async fn delete_by_id(&self, conn: &mut PgConnection, id: OrderId)
    -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct PgOrderStore;

impl PgOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[tracing::instrument(
        name = "orders.store.get_by_id",
        skip(self, conn),
        fields(order_id = %id),
        err
    )]
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<OrderDetailsRecord, StoreError> {
        query_as::<Postgres, OrderDetailsRecord>(GET_ORDER_SQL)
            .bind(id.into_i64())
            .fetch_optional(&mut *conn)
            .await
            .map_err(StoreError::read)?
            .ok_or(StoreError::NotFound {
                entity: ENTITY,
                id: id.into_i64(),
            })
    }

    #[tracing::instrument(name = "orders.store.get_all", skip(self, conn), err)]
    async fn get_all(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<OrderDetailsRecord>, StoreError> {
        let ids = query_scalar::<Postgres, i64>(LIST_ORDER_IDS_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        let mut orders = Vec::with_capacity(ids.len());

        for id in ids {
            orders.push(self.get_by_id(&mut *conn, OrderId::from_i64(id)).await?);
        }

        debug!(order_count = orders.len(), "fetched orders");

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.store.create",
        skip(self, conn, order),
        fields(
            order_id = tracing::field::Empty,
            status = %order.status,
            line_count = order.products.len()
        ),
        err
    )]
    async fn create(
        &self,
        conn: &mut PgConnection,
        order: OrderDetailsRecord,
    ) -> Result<OrderDetailsRecord, StoreError> {
        let product_ids = line_product_ids(&order.products)
            .map_err(|failure| StoreError::create(ENTITY, failure))?;

        let id = query_scalar::<Postgres, i64>(CREATE_ORDER_SQL)
            .bind(order.status.as_str())
            .bind(order.total_amount)
            .fetch_one(&mut *conn)
            .await
            .map(OrderId::from_i64)
            .map_err(|error| StoreError::create(ENTITY, error))?;

        tracing::Span::current().record("order_id", id.into_i64());

        insert_order_products(&mut *conn, id, &product_ids)
            .await
            .map_err(|failure| StoreError::create(ENTITY, failure))?;

        debug!(order_id = %id, "created order");

        Ok(OrderDetailsRecord {
            id: Some(id),
            ..order
        })
    }

    #[tracing::instrument(
        name = "orders.store.update",
        skip(self, conn, order),
        fields(order_id = ?order.id, status = %order.status, line_count = order.products.len()),
        err
    )]
    async fn update(
        &self,
        conn: &mut PgConnection,
        order: OrderDetailsRecord,
    ) -> Result<OrderDetailsRecord, StoreError> {
        let Some(id) = order.id else {
            return Err(StoreError::update(ENTITY, WriteFailure::MissingIdentity));
        };

        let product_ids = line_product_ids(&order.products)
            .map_err(|failure| StoreError::update(ENTITY, failure))?;

        let rows_affected = query(UPDATE_ORDER_SQL)
            .bind(id.into_i64())
            .bind(order.status.as_str())
            .bind(order.total_amount)
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?
            .rows_affected();

        expect_rows(rows_affected, 1).map_err(|failure| StoreError::update(ENTITY, failure))?;

        query(DELETE_ORDER_PRODUCTS_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?;

        insert_order_products(&mut *conn, id, &product_ids)
            .await
            .map_err(|failure| StoreError::update(ENTITY, failure))?;

        debug!(order_id = %id, "updated order");

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.store.delete_by_id",
        skip(self, conn),
        fields(order_id = %id),
        err
    )]
    async fn delete_by_id(
        &self,
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<bool, StoreError> {
        query(DELETE_ORDER_PRODUCTS_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::delete(ENTITY, error))?;

        let rows_affected = query(DELETE_ORDER_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::delete(ENTITY, error))?
            .rows_affected();

        debug!(order_id = %id, rows_affected, "deleted order");

        Ok(rows_affected == 1)
    }
}

/// Product ids of the line items, in order and with repeats.
fn line_product_ids(products: &[ProductRecord]) -> Result<Vec<i64>, WriteFailure> {
    products
        .iter()
        .map(|product| {
            product
                .id
                .map(ProductId::into_i64)
                .ok_or(WriteFailure::UnsavedReference { entity: "product" })
        })
        .collect()
}

async fn insert_order_products(
    conn: &mut PgConnection,
    order: OrderId,
    product_ids: &[i64],
) -> Result<(), WriteFailure> {
    if product_ids.is_empty() {
        return Ok(());
    }

    let rows_affected = query(CREATE_ORDER_PRODUCTS_SQL)
        .bind(order.into_i64())
        .bind(product_ids)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    expect_rows(rows_affected, product_ids.len() as u64)
}

impl<'r> FromRow<'r, PgRow> for OrderDetailsRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = row
            .try_get::<String, _>(COLUMN_STATUS)?
            .parse::<OrderStatus>()
            .map_err(|unknown| decode_error(COLUMN_STATUS, unknown))?;

        Ok(Self {
            id: Some(OrderId::from_i64(row.try_get("id")?)),
            status,
            total_amount: row.try_get("total_amount")?,
            products: Vec::new(),
        })
    }
}
