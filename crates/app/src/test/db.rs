//! Per-test databases inside one shared PostgreSQL container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers_modules::{
    postgres::Postgres as PostgresImage,
    testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner},
};
use tokio::sync::{OnceCell, mpsc};

use crate::database::Db;

const TEST_USER: &str = "inventory_test";
const TEST_PASSWORD: &str = "inventory_test_password";

/// Rejects names that cannot be interpolated into `CREATE DATABASE` safely.
///
/// Names must be 1-63 characters, start with a letter or underscore and hold only
/// letters, digits, underscores and dollar signs.
fn validate_database_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err("database name must be 1-63 characters long".to_string());
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err("database name must start with a letter or underscore".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return Err(
            "database name can only contain letters, digits, underscores and dollar signs"
                .to_string(),
        );
    }

    Ok(())
}

async fn init_postgres_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(TEST_USER)
        .with_password(TEST_PASSWORD)
        .with_db_name("inventory_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("failed to start PostgreSQL container")
}

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn init_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(db_name) = receiver.recv().await {
            if let Err(err) = drop_database(&db_name).await {
                tracing::warn!(%db_name, %err, "failed to drop test database");
            }
        }
    });

    sender
}

async fn server_url(database: &str) -> String {
    let container = POSTGRES_CONTAINER
        .get_or_init(init_postgres_container)
        .await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get container port");

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgresql://{TEST_USER}:{TEST_PASSWORD}@{host}:{port}/{database}")
}

async fn drop_database(db_name: &str) -> Result<(), sqlx::Error> {
    if POSTGRES_CONTAINER.get().is_none() || validate_database_name(db_name).is_err() {
        return Ok(());
    }

    let mut conn = PgConnection::connect(&server_url("postgres").await).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A freshly migrated database, dropped in the background once the value goes away.
///
/// Every test gets its own database, so services commit normally and no rollback
/// fixture is needed.
#[derive(Debug)]
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let thread_id = std::thread::current().id();

        let name =
            format!("inventory_test_{nanos}_{thread_id:?}").replace([':', ' ', '(', ')'], "");

        Self::with_name(&name).await
    }

    pub async fn with_name(db_name: &str) -> Self {
        CLEANUP_SENDER.get_or_init(init_cleanup_task).await;

        if let Err(error) = validate_database_name(db_name) {
            panic!("invalid database name '{db_name}': {error}");
        }

        let mut conn = PgConnection::connect(&server_url("postgres").await)
            .await
            .expect("failed to connect to the postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
            .execute(&mut conn)
            .await
            .expect("failed to create test database");

        conn.close().await.expect("failed to close admin connection");

        let pool = PgPool::connect(&server_url(db_name).await)
            .await
            .expect("failed to connect to test database");

        let db = Self {
            pool,
            name: db_name.to_string(),
        };

        db.app_db()
            .migrate()
            .await
            .expect("failed to run migrations on test database");

        db
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Application handle over this database's pool.
    pub fn app_db(&self) -> Db {
        Db::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_style_names() {
        assert!(validate_database_name("inventory_test_123_ThreadId2").is_ok());
        assert!(validate_database_name("_leading_underscore").is_ok());
        assert!(validate_database_name("with$dollar").is_ok());
    }

    #[test]
    fn rejects_unsafe_names() {
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
        assert!(validate_database_name("1starts_with_digit").is_err());
        assert!(validate_database_name("has-hyphen").is_err());
        assert!(validate_database_name("quote\"d").is_err());
    }

    #[tokio::test]
    async fn fresh_database_has_seeded_lookup_tables() {
        let test_db = TestDb::new().await;

        let category_types: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category_types")
            .fetch_one(test_db.pool())
            .await
            .expect("category_types should exist");

        let statuses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_statuses")
            .fetch_one(test_db.pool())
            .await
            .expect("order_statuses should exist");

        assert_eq!(category_types, 5);
        assert_eq!(statuses, 4);
    }
}
