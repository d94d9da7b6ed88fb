//! Test context for service-level integration tests.

use crate::{
    database::Db,
    domain::{
        categories::PgCategoriesService, orders::PgOrdersService, products::PgProductsService,
    },
};

use super::db::TestDb;

/// Services wired against a private, migrated database.
pub struct TestContext {
    pub db: TestDb,
    pub categories: PgCategoriesService,
    pub products: PgProductsService,
    pub orders: PgOrdersService,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = TestDb::new().await;
        let app_db = db.app_db();

        Self {
            categories: PgCategoriesService::new(app_db.clone()),
            products: PgProductsService::new(app_db.clone()),
            orders: PgOrdersService::new(app_db),
            db,
        }
    }

    /// A fresh handle for building repositories or services by hand.
    pub fn app_db(&self) -> Db {
        self.db.app_db()
    }
}
