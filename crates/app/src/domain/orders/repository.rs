//! Orders Repository

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgConnection;
use tracing::debug;

use crate::{
    database::{Db, commit},
    domain::{
        categories::store::{CategoryStore, PgCategoryStore},
        errors::{StoreError, WriteFailure},
        orders::{
            records::{OrderDetailsRecord, OrderId},
            store::{OrderStore, PgOrderStore},
        },
        products::{
            repository::attach_categories,
            store::{PgProductStore, ProductStore},
        },
    },
};

const ENTITY: &str = "order";

/// Reads and writes an order together with its line items.
#[automock]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: OrderId) -> Result<OrderDetailsRecord, StoreError>;

    async fn find_all(&self) -> Result<Vec<OrderDetailsRecord>, StoreError>;

    /// Creates the order when it has no id, otherwise updates it. Returns the order
    /// as stored.
    async fn save(&self, order: OrderDetailsRecord) -> Result<OrderDetailsRecord, StoreError>;

    /// `true` when the order existed and is gone.
    async fn delete(&self, id: OrderId) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgOrderRepository {
    db: Db,
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
}

impl PgOrderRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_stores(
            db,
            Arc::new(PgOrderStore::new()),
            Arc::new(PgProductStore::new()),
            Arc::new(PgCategoryStore::new()),
        )
    }

    #[must_use]
    pub fn with_stores(
        db: Db,
        orders: Arc<dyn OrderStore>,
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
    ) -> Self {
        Self {
            db,
            orders,
            products,
            categories,
        }
    }

    /// Attach line items, each with its categories.
    async fn attach_products(
        &self,
        conn: &mut PgConnection,
        mut order: OrderDetailsRecord,
    ) -> Result<OrderDetailsRecord, StoreError> {
        let Some(id) = order.id else {
            return Ok(order);
        };

        let lines = self.products.get_all_by_order_id(&mut *conn, id).await?;

        let mut products = Vec::with_capacity(lines.len());

        for product in lines {
            products.push(attach_categories(self.categories.as_ref(), &mut *conn, product).await?);
        }

        order.products = products;

        Ok(order)
    }

    async fn load(
        &self,
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<OrderDetailsRecord, StoreError> {
        let order = self.orders.get_by_id(&mut *conn, id).await?;

        self.attach_products(conn, order).await
    }
}

impl std::fmt::Debug for PgOrderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgOrderRepository")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[tracing::instrument(
        name = "orders.repository.find_by_id",
        skip(self),
        fields(order_id = %id),
        err
    )]
    async fn find_by_id(&self, id: OrderId) -> Result<OrderDetailsRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let order = self.load(&mut tx, id).await?;

        commit(tx, StoreError::Sql).await?;

        Ok(order)
    }

    #[tracing::instrument(name = "orders.repository.find_all", skip(self), err)]
    async fn find_all(&self) -> Result<Vec<OrderDetailsRecord>, StoreError> {
        let mut tx = self.db.begin().await?;

        let mut orders = Vec::new();

        for order in self.orders.get_all(&mut tx).await? {
            orders.push(self.attach_products(&mut tx, order).await?);
        }

        commit(tx, StoreError::Sql).await?;

        debug!(order_count = orders.len(), "loaded orders");

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.repository.save",
        skip(self, order),
        fields(order_id = ?order.id, total_amount = %order.total_amount),
        err
    )]
    async fn save(&self, order: OrderDetailsRecord) -> Result<OrderDetailsRecord, StoreError> {
        let creating = order.id.is_none();

        let mut tx = self.db.begin().await?;

        let saved = if creating {
            self.orders.create(&mut tx, order).await?
        } else {
            self.orders.update(&mut tx, order).await?
        };

        let Some(id) = saved.id else {
            return Err(StoreError::create(ENTITY, WriteFailure::MissingIdentity));
        };

        let order = self.load(&mut tx, id).await?;

        commit(tx, |error| {
            if creating {
                StoreError::create(ENTITY, error)
            } else {
                StoreError::update(ENTITY, error)
            }
        })
        .await?;

        debug!(order_id = %id, created = creating, "saved order");

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.repository.delete",
        skip(self),
        fields(order_id = %id),
        err
    )]
    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let deleted = self.orders.delete_by_id(&mut tx, id).await?;

        if deleted {
            commit(tx, |error| StoreError::delete(ENTITY, error)).await?;
        }

        Ok(deleted)
    }
}
