//! Product Categories service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::{Db, commit},
    domain::{
        categories::{
            models::ProductCategory,
            records::{CategoryId, ProductCategoryRecord},
            store::{CategoryStore, PgCategoryStore},
        },
        errors::{StoreError, WriteFailure},
    },
};

const ENTITY: &str = "product category";

#[derive(Clone)]
pub struct PgCategoriesService {
    db: Db,
    store: Arc<dyn CategoryStore>,
}

impl PgCategoriesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_store(db, Arc::new(PgCategoryStore::new()))
    }

    #[must_use]
    pub fn with_store(db: Db, store: Arc<dyn CategoryStore>) -> Self {
        Self { db, store }
    }
}

impl std::fmt::Debug for PgCategoriesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCategoriesService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CategoriesService for PgCategoriesService {
    async fn get_by_id(&self, id: i64) -> Result<ProductCategory, StoreError> {
        let mut tx = self.db.begin().await?;

        let category = self
            .store
            .get_by_id(&mut tx, CategoryId::from_i64(id))
            .await?;

        commit(tx, StoreError::Sql).await?;

        Ok(category.into())
    }

    async fn get_all(&self) -> Result<Vec<ProductCategory>, StoreError> {
        let mut tx = self.db.begin().await?;

        let categories = self.store.get_all(&mut tx).await?;

        commit(tx, StoreError::Sql).await?;

        Ok(categories.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(
        name = "categories.service.save",
        skip(self, category),
        fields(category_id = ?category.id),
        err
    )]
    async fn save(&self, category: ProductCategory) -> Result<ProductCategory, StoreError> {
        let record = ProductCategoryRecord::from(category);
        let creating = record.id.is_none();

        let mut tx = self.db.begin().await?;

        let saved = if creating {
            self.store.create(&mut tx, record).await?
        } else {
            self.store.update(&mut tx, record).await?
        };

        let Some(id) = saved.id else {
            return Err(StoreError::create(ENTITY, WriteFailure::MissingIdentity));
        };

        let category = self.store.get_by_id(&mut tx, id).await?;

        commit(tx, |error| {
            if creating {
                StoreError::create(ENTITY, error)
            } else {
                StoreError::update(ENTITY, error)
            }
        })
        .await?;

        info!(category_id = %id, created = creating, "saved category");

        Ok(category.into())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        let deleted = self
            .store
            .delete_by_id(&mut tx, CategoryId::from_i64(id))
            .await?;

        if !deleted {
            return Err(StoreError::NotFound { entity: ENTITY, id });
        }

        commit(tx, |error| StoreError::delete(ENTITY, error)).await?;

        info!(category_id = id, "deleted category");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CategoriesService: Send + Sync {
    /// Retrieve a single category.
    async fn get_by_id(&self, id: i64) -> Result<ProductCategory, StoreError>;

    /// Retrieve all categories.
    async fn get_all(&self) -> Result<Vec<ProductCategory>, StoreError>;

    /// Creates the category when it has no id, otherwise updates it.
    async fn save(&self, category: ProductCategory) -> Result<ProductCategory, StoreError>;

    /// Deletes a category and unlinks it from every product.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
