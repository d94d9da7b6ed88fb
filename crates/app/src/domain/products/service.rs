//! Products service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        errors::StoreError,
        products::{
            models::Product,
            records::{ProductId, ProductRecord},
            repository::{PgProductRepository, ProductRepository},
        },
    },
};

const ENTITY: &str = "product";

#[derive(Clone)]
pub struct PgProductsService {
    repository: Arc<dyn ProductRepository>,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_repository(Arc::new(PgProductRepository::new(db)))
    }

    #[must_use]
    pub fn with_repository(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }
}

impl std::fmt::Debug for PgProductsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgProductsService").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn get_by_id(&self, id: i64) -> Result<Product, StoreError> {
        let product = self.repository.find_by_id(ProductId::from_i64(id)).await?;

        Ok(product.into())
    }

    async fn get_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.repository.find_all().await?;

        Ok(products.into_iter().map(Into::into).collect())
    }

    async fn save(&self, product: Product) -> Result<Product, StoreError> {
        let created = product.id.is_none();

        let saved = self.repository.save(ProductRecord::from(product)).await?;

        info!(product_id = ?saved.id, created, "saved product");

        Ok(saved.into())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !self.repository.delete(ProductId::from_i64(id)).await? {
            return Err(StoreError::NotFound { entity: ENTITY, id });
        }

        info!(product_id = id, "deleted product");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a single product with its categories.
    async fn get_by_id(&self, id: i64) -> Result<Product, StoreError>;

    /// Retrieve all products, ordered by id.
    async fn get_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Creates the product when it has no id, otherwise updates it.
    async fn save(&self, product: Product) -> Result<Product, StoreError>;

    /// Deletes a product and removes it from every order.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
