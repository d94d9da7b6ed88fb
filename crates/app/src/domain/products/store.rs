//! Products Store

use async_trait::async_trait;
use mockall::automock;
use smallvec::SmallVec;
use sqlx::{FromRow, PgConnection, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::domain::{
    categories::records::{CategoryId, ProductCategoryRecord},
    errors::{StoreError, WriteFailure, expect_rows},
    orders::records::OrderId,
    products::records::{PRICE_SCALE, ProductId, ProductRecord, price_fits_scale},
};

const ENTITY: &str = "product";

const COLUMN_QUANTITY: &str = "quantity";

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const LIST_PRODUCT_IDS_SQL: &str = include_str!("sql/list_product_ids.sql");
const LIST_ORDER_PRODUCTS_SQL: &str = include_str!("sql/list_order_products.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const CREATE_PRODUCT_CATEGORIES_SQL: &str = include_str!("sql/create_product_categories.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_CATEGORIES_SQL: &str = include_str!("sql/delete_product_categories.sql");
const DELETE_PRODUCT_ORDERS_SQL: &str = include_str!("sql/delete_product_orders.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");

/// Row access for `products` and its `product_to_category` relation.
///
/// Records returned from reads carry no categories; the product repository attaches
/// them.
#[automock]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<ProductRecord, StoreError>;

    async fn get_all(&self, conn: &mut PgConnection) -> Result<Vec<ProductRecord>, StoreError>;

    /// Insert the product row, then one link row per category.
    async fn create(
        &self,
        conn: &mut PgConnection,
        product: ProductRecord,
    ) -> Result<ProductRecord, StoreError>;

    /// Rewrite the product row and replace its category links.
    async fn update(
        &self,
        conn: &mut PgConnection,
        product: ProductRecord,
    ) -> Result<ProductRecord, StoreError>;

    /// Remove category links and order lines for the product, then the product.
    async fn delete_by_id(&self, conn: &mut PgConnection, id: ProductId)
    -> Result<bool, StoreError>;

    /// Line items of an order in position order.
    async fn get_all_by_order_id(
        &self,
        conn: &mut PgConnection,
        order: OrderId,
    ) -> Result<Vec<ProductRecord>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct PgProductStore;

impl PgProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[tracing::instrument(
        name = "products.store.get_by_id",
        skip(self, conn),
        fields(product_id = %id),
        err
    )]
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<ProductRecord, StoreError> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(id.into_i64())
            .fetch_optional(&mut *conn)
            .await
            .map_err(StoreError::read)?
            .ok_or(StoreError::NotFound {
                entity: ENTITY,
                id: id.into_i64(),
            })
    }

    #[tracing::instrument(name = "products.store.get_all", skip(self, conn), err)]
    async fn get_all(&self, conn: &mut PgConnection) -> Result<Vec<ProductRecord>, StoreError> {
        let ids = query_scalar::<Postgres, i64>(LIST_PRODUCT_IDS_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        let mut products = Vec::with_capacity(ids.len());

        for id in ids {
            products.push(self.get_by_id(&mut *conn, ProductId::from_i64(id)).await?);
        }

        debug!(product_count = products.len(), "fetched products");

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.store.create",
        skip(self, conn, product),
        fields(
            product_id = tracing::field::Empty,
            category_count = product.categories.len()
        ),
        err
    )]
    async fn create(
        &self,
        conn: &mut PgConnection,
        product: ProductRecord,
    ) -> Result<ProductRecord, StoreError> {
        let category_ids =
            validate(&product).map_err(|failure| StoreError::create(ENTITY, failure))?;

        let id = query_scalar::<Postgres, i64>(CREATE_PRODUCT_SQL)
            .bind(&product.name)
            .bind(product.price)
            .bind(i64::from(product.quantity))
            .bind(product.available)
            .fetch_one(&mut *conn)
            .await
            .map(ProductId::from_i64)
            .map_err(|error| StoreError::create(ENTITY, error))?;

        tracing::Span::current().record("product_id", id.into_i64());

        insert_product_categories(&mut *conn, id, &category_ids)
            .await
            .map_err(|failure| StoreError::create(ENTITY, failure))?;

        debug!(product_id = %id, "created product");

        Ok(ProductRecord {
            id: Some(id),
            ..product
        })
    }

    #[tracing::instrument(
        name = "products.store.update",
        skip(self, conn, product),
        fields(product_id = ?product.id, category_count = product.categories.len()),
        err
    )]
    async fn update(
        &self,
        conn: &mut PgConnection,
        product: ProductRecord,
    ) -> Result<ProductRecord, StoreError> {
        let Some(id) = product.id else {
            return Err(StoreError::update(ENTITY, WriteFailure::MissingIdentity));
        };

        let category_ids =
            validate(&product).map_err(|failure| StoreError::update(ENTITY, failure))?;

        let rows_affected = query(UPDATE_PRODUCT_SQL)
            .bind(id.into_i64())
            .bind(&product.name)
            .bind(product.price)
            .bind(i64::from(product.quantity))
            .bind(product.available)
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?
            .rows_affected();

        expect_rows(rows_affected, 1).map_err(|failure| StoreError::update(ENTITY, failure))?;

        query(DELETE_PRODUCT_CATEGORIES_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?;

        insert_product_categories(&mut *conn, id, &category_ids)
            .await
            .map_err(|failure| StoreError::update(ENTITY, failure))?;

        debug!(product_id = %id, "updated product");

        Ok(product)
    }

    #[tracing::instrument(
        name = "products.store.delete_by_id",
        skip(self, conn),
        fields(product_id = %id),
        err
    )]
    async fn delete_by_id(
        &self,
        conn: &mut PgConnection,
        id: ProductId,
    ) -> Result<bool, StoreError> {
        for relation_sql in [DELETE_PRODUCT_CATEGORIES_SQL, DELETE_PRODUCT_ORDERS_SQL] {
            query(relation_sql)
                .bind(id.into_i64())
                .execute(&mut *conn)
                .await
                .map_err(|error| StoreError::delete(ENTITY, error))?;
        }

        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::delete(ENTITY, error))?
            .rows_affected();

        debug!(product_id = %id, rows_affected, "deleted product");

        Ok(rows_affected == 1)
    }

    #[tracing::instrument(
        name = "products.store.get_all_by_order_id",
        skip(self, conn),
        fields(order_id = %order, product_count = tracing::field::Empty),
        err
    )]
    async fn get_all_by_order_id(
        &self,
        conn: &mut PgConnection,
        order: OrderId,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let products = query_as::<Postgres, ProductRecord>(LIST_ORDER_PRODUCTS_SQL)
            .bind(order.into_i64())
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        tracing::Span::current().record("product_count", products.len());

        Ok(products)
    }
}

/// Checks the price scale, then collects the category ids to link.
fn validate(product: &ProductRecord) -> Result<SmallVec<[CategoryId; 4]>, WriteFailure> {
    if !price_fits_scale(product.price) {
        return Err(WriteFailure::Scale {
            field: "price",
            max_scale: PRICE_SCALE,
        });
    }

    category_ids(&product.categories)
}

/// Distinct ids of the linked categories, sorted; every category must be saved.
fn category_ids(
    categories: &[ProductCategoryRecord],
) -> Result<SmallVec<[CategoryId; 4]>, WriteFailure> {
    let mut ids = categories
        .iter()
        .map(|category| {
            category.id.ok_or(WriteFailure::UnsavedReference {
                entity: "product category",
            })
        })
        .collect::<Result<SmallVec<[CategoryId; 4]>, _>>()?;

    ids.sort_unstable();
    ids.dedup();

    Ok(ids)
}

async fn insert_product_categories(
    conn: &mut PgConnection,
    product: ProductId,
    categories: &[CategoryId],
) -> Result<(), WriteFailure> {
    if categories.is_empty() {
        return Ok(());
    }

    let category_ids: Vec<i64> = categories.iter().copied().map(Into::into).collect();

    let rows_affected = query(CREATE_PRODUCT_CATEGORIES_SQL)
        .bind(product.into_i64())
        .bind(&category_ids)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    expect_rows(rows_affected, category_ids.len() as u64)
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let quantity_i64: i64 = row.try_get(COLUMN_QUANTITY)?;

        let quantity = u32::try_from(quantity_i64).map_err(|e| sqlx::Error::ColumnDecode {
            index: COLUMN_QUANTITY.to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: Some(ProductId::from_i64(row.try_get("id")?)),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            quantity,
            available: row.try_get("available")?,
            categories: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rust_decimal::Decimal;

    use super::*;

    fn category(id: Option<i64>) -> ProductCategoryRecord {
        ProductCategoryRecord {
            id: id.map(CategoryId::from_i64),
            name: "Any".to_string(),
            types: BTreeSet::new(),
        }
    }

    #[test]
    fn category_ids_are_sorted_and_distinct() {
        let ids = category_ids(&[category(Some(5)), category(Some(2)), category(Some(5))])
            .expect("all categories are saved");

        assert_eq!(
            ids.as_slice(),
            &[CategoryId::from_i64(2), CategoryId::from_i64(5)]
        );
    }

    #[test]
    fn sub_cent_price_is_rejected_before_any_write() {
        let product = ProductRecord {
            id: None,
            name: "Bolt".to_string(),
            price: Decimal::new(4, 3),
            quantity: 3,
            available: true,
            categories: vec![category(Some(1))],
        };

        assert!(matches!(
            validate(&product),
            Err(WriteFailure::Scale {
                field: "price",
                max_scale: 2
            })
        ));
    }

    #[test]
    fn category_ids_reject_unsaved_categories() {
        let result = category_ids(&[category(Some(1)), category(None)]);

        assert!(matches!(
            result,
            Err(WriteFailure::UnsavedReference {
                entity: "product category"
            })
        ));
    }
}
