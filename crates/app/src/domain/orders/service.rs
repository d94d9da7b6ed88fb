//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        errors::StoreError,
        orders::{
            models::OrderDetails,
            records::{OrderDetailsRecord, OrderId},
            repository::{OrderRepository, PgOrderRepository},
        },
        products::{models::Product, records::price_fits_scale},
    },
};

const ENTITY: &str = "order";

#[derive(Clone)]
pub struct PgOrdersService {
    repository: Arc<dyn OrderRepository>,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self::with_repository(Arc::new(PgOrderRepository::new(db)))
    }

    #[must_use]
    pub fn with_repository(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }
}

impl std::fmt::Debug for PgOrdersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgOrdersService").finish_non_exhaustive()
    }
}

/// Sum of `price × quantity` over the line items.
///
/// # Errors
///
/// Returns [`StoreError::InvalidAmount`] when a price has fractions of a cent or
/// the sum overflows.
pub fn order_total(products: &[Product]) -> Result<Decimal, StoreError> {
    products.iter().try_fold(Decimal::ZERO, |total, product| {
        Some(product)
            .filter(|product| price_fits_scale(product.price))
            .and_then(Product::line_total)
            .and_then(|line| total.checked_add(line))
            .ok_or(StoreError::InvalidAmount)
    })
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_by_id(&self, id: i64) -> Result<OrderDetails, StoreError> {
        let order = self.repository.find_by_id(OrderId::from_i64(id)).await?;

        Ok(order.into())
    }

    async fn get_all(&self) -> Result<Vec<OrderDetails>, StoreError> {
        let orders = self.repository.find_all().await?;

        Ok(orders.into_iter().map(Into::into).collect())
    }

    async fn save(&self, mut order: OrderDetails) -> Result<OrderDetails, StoreError> {
        let created = order.id.is_none();

        order.total_amount = order_total(&order.products)?;

        let saved = self
            .repository
            .save(OrderDetailsRecord::from(order))
            .await?;

        info!(
            order_id = ?saved.id,
            created,
            total_amount = %saved.total_amount,
            "saved order"
        );

        Ok(saved.into())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !self.repository.delete(OrderId::from_i64(id)).await? {
            return Err(StoreError::NotFound { entity: ENTITY, id });
        }

        info!(order_id = id, "deleted order");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve a single order with its line items.
    async fn get_by_id(&self, id: i64) -> Result<OrderDetails, StoreError>;

    /// Retrieve all orders, ordered by id.
    async fn get_all(&self) -> Result<Vec<OrderDetails>, StoreError>;

    /// Recomputes the total from the line items, then creates or updates the order.
    async fn save(&self, order: OrderDetails) -> Result<OrderDetails, StoreError>;

    /// Deletes an order and its line items; the products stay.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{records::OrderStatus, repository::MockOrderRepository},
            products::ProductsService,
        },
        test::{TestContext, helpers::new_product},
    };

    use super::*;

    fn priced(id: i64, price: &str, quantity: u32) -> TestResult<Product> {
        let mut product = new_product("Item", Decimal::from_str(price)?, quantity);
        product.id = Some(id);

        Ok(product)
    }

    #[tokio::test]
    async fn save_overwrites_supplied_total_with_line_sum() -> TestResult {
        let expected = Decimal::from_str("34.00")?;

        let mut repository = MockOrderRepository::new();

        repository
            .expect_save()
            .times(1)
            .withf(move |order| order.total_amount == expected)
            .returning(|order| {
                Ok(OrderDetailsRecord {
                    id: Some(OrderId::from_i64(1)),
                    ..order
                })
            });

        let service = PgOrdersService::with_repository(Arc::new(repository));

        let saved = service
            .save(OrderDetails {
                id: None,
                status: OrderStatus::Open,
                total_amount: Decimal::from_str("999.99")?,
                products: vec![priced(1, "10.00", 2)?, priced(2, "3.50", 4)?],
            })
            .await?;

        assert_eq!(saved.total_amount, expected);

        Ok(())
    }

    #[test]
    fn total_of_no_lines_is_zero() -> Result<(), StoreError> {
        assert_eq!(order_total(&[])?, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn total_overflow_is_invalid_amount() -> TestResult {
        let huge = Product {
            price: Decimal::MAX,
            ..priced(1, "1", 2)?
        };

        assert!(matches!(order_total(&[huge]), Err(StoreError::InvalidAmount)));

        Ok(())
    }

    #[test]
    fn sub_cent_line_price_is_invalid_amount() -> TestResult {
        let bolt = priced(1, "0.004", 3)?;

        assert!(matches!(order_total(&[bolt]), Err(StoreError::InvalidAmount)));

        Ok(())
    }

    #[tokio::test]
    async fn sub_cent_line_price_never_reaches_the_repository() -> TestResult {
        let mut repository = MockOrderRepository::new();

        repository.expect_save().times(0);

        let service = PgOrdersService::with_repository(Arc::new(repository));

        let result = service
            .save(OrderDetails {
                id: None,
                status: OrderStatus::Open,
                total_amount: Decimal::ZERO,
                products: vec![priced(1, "10.00", 1)?, priced(2, "0.004", 3)?],
            })
            .await;

        assert!(
            matches!(result, Err(StoreError::InvalidAmount)),
            "expected InvalidAmount, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn overflowing_total_never_reaches_the_repository() -> TestResult {
        let mut repository = MockOrderRepository::new();

        repository.expect_save().times(0);

        let service = PgOrdersService::with_repository(Arc::new(repository));

        let huge = Product {
            price: Decimal::MAX,
            ..priced(1, "1", 2)?
        };

        let result = service
            .save(OrderDetails {
                id: None,
                status: OrderStatus::Open,
                total_amount: Decimal::ZERO,
                products: vec![huge],
            })
            .await;

        assert!(
            matches!(result, Err(StoreError::InvalidAmount)),
            "expected InvalidAmount, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_of_missing_order_is_not_found() {
        let mut repository = MockOrderRepository::new();

        repository.expect_delete().times(1).returning(|_| Ok(false));

        let service = PgOrdersService::with_repository(Arc::new(repository));

        let result = service.delete(12).await;

        assert!(
            matches!(result, Err(StoreError::NotFound { id: 12, .. })),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn persisted_total_is_recomputed() -> TestResult {
        let ctx = TestContext::new().await;

        let flour = ctx
            .products
            .save(new_product("Flour", Decimal::from_str("10.00")?, 2))
            .await?;
        let sugar = ctx
            .products
            .save(new_product("Sugar", Decimal::from_str("3.50")?, 4))
            .await?;

        let saved = ctx
            .orders
            .save(OrderDetails {
                id: None,
                status: OrderStatus::Open,
                total_amount: Decimal::from_str("1.00")?,
                products: vec![flour, sugar],
            })
            .await?;
        let id = saved.id.ok_or("saved order should have an id")?;

        let found = ctx.orders.get_by_id(id).await?;

        assert_eq!(found.total_amount, Decimal::from_str("34.00")?);
        assert_eq!(found.products.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn get_all_on_empty_store_is_empty() -> TestResult {
        let ctx = TestContext::new().await;

        assert!(ctx.orders.get_all().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let saved = ctx
            .orders
            .save(OrderDetails {
                id: None,
                status: OrderStatus::Cancelled,
                total_amount: Decimal::ZERO,
                products: Vec::new(),
            })
            .await?;
        let id = saved.id.ok_or("saved order should have an id")?;

        ctx.orders.delete(id).await?;

        let result = ctx.orders.get_by_id(id).await;

        assert!(
            matches!(result, Err(StoreError::NotFound { .. })),
            "expected NotFound after deletion, got {result:?}"
        );

        Ok(())
    }
}
