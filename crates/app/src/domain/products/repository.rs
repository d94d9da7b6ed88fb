//! Products Repository

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
        products::{
            records::{ProductId, ProductRecord},
            store::{PgProductStore, ProductStore},
        },
    },
};

const ENTITY: &str = "product";

/// Reads and writes a product together with its categories.
#[automock]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> Result<ProductRecord, StoreError>;

    async fn find_all(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Creates the product when it has no id, otherwise updates it. Returns the
    /// product as stored.
    async fn save(&self, product: ProductRecord) -> Result<ProductRecord, StoreError>;

    /// `true` when the product existed and is gone.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgProductRepository {
    db: Db,
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
}

impl PgProductRepository {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_stores(
            db,
            Arc::new(PgProductStore::new()),
            Arc::new(PgCategoryStore::new()),
        )
    }

    #[must_use]
    pub fn with_stores(
        db: Db,
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
    ) -> Self {
        Self {
            db,
            products,
            categories,
        }
    }

    async fn load(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<ProductRecord, StoreError> {
        let product = self.products.get_by_id(&mut *conn, id).await?;

        attach_categories(self.categories.as_ref(), conn, product).await
    }
}

impl std::fmt::Debug for PgProductRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgProductRepository")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

/// Fill in a product's categories from the link table.
pub(crate) async fn attach_categories(
    categories: &dyn CategoryStore,
    conn: &mut PgConnection,
    mut product: ProductRecord,
) -> Result<ProductRecord, StoreError> {
    let Some(id) = product.id else {
        return Ok(product);
    };

    product.categories = categories.get_all_by_product_id(conn, id).await?;

    Ok(product)
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[tracing::instrument(
        name = "products.repository.find_by_id",
        skip(self),
        fields(product_id = %id),
        err
    )]
    async fn find_by_id(&self, id: ProductId) -> Result<ProductRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let product = self.load(&mut tx, id).await?;

        commit(tx, StoreError::Sql).await?;

        Ok(product)
    }

    #[tracing::instrument(name = "products.repository.find_all", skip(self), err)]
    async fn find_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let mut tx = self.db.begin().await?;

        let mut products = Vec::new();

        for product in self.products.get_all(&mut tx).await? {
            products.push(attach_categories(self.categories.as_ref(), &mut tx, product).await?);
        }

        commit(tx, StoreError::Sql).await?;

        debug!(product_count = products.len(), "loaded products");

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.repository.save",
        skip(self, product),
        fields(product_id = ?product.id),
        err
    )]
    async fn save(&self, product: ProductRecord) -> Result<ProductRecord, StoreError> {
        let creating = product.id.is_none();

        let mut tx = self.db.begin().await?;

        let saved = if creating {
            self.products.create(&mut tx, product).await?
        } else {
            self.products.update(&mut tx, product).await?
        };

        let Some(id) = saved.id else {
            return Err(StoreError::create(ENTITY, WriteFailure::MissingIdentity));
        };

        let product = self.load(&mut tx, id).await?;

        commit(tx, |error| {
            if creating {
                StoreError::create(ENTITY, error)
            } else {
                StoreError::update(ENTITY, error)
            }
        })
        .await?;

        debug!(product_id = %id, created = creating, "saved product");

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.repository.delete",
        skip(self),
        fields(product_id = %id),
        err
    )]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let deleted = self.products.delete_by_id(&mut tx, id).await?;

        if deleted {
            commit(tx, |error| StoreError::delete(ENTITY, error)).await?;
        }

        Ok(deleted)
    }
}
