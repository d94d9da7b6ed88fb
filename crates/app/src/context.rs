//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::DatabaseConfig,
    database::Db,
    domain::{
        categories::{CategoriesService, PgCategoriesService},
        errors::StoreError,
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] StoreError),

    #[error("failed to apply database migrations")]
    Migrations(#[source] sqlx::migrate::MigrateError),
}

/// Services wired against one connection pool.
#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub products: Arc<dyn ProductsService>,
    pub orders: Arc<dyn OrdersService>,
    pub categories: Arc<dyn CategoriesService>,
}

impl AppContext {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            categories: Arc::new(PgCategoriesService::new(db.clone())),
            db,
        }
    }

    /// Build application context from database settings.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, AppInitError> {
        let db = Db::connect(config)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(db))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails.
    pub async fn migrate(&self) -> Result<(), AppInitError> {
        self.db.migrate().await.map_err(AppInitError::Migrations)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}
