//! Product Categories Store

use std::collections::BTreeSet;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, PgConnection, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;

use crate::domain::{
    categories::records::{CategoryId, CategoryType, ProductCategoryRecord},
    errors::{StoreError, WriteFailure, decode_error, expect_rows},
    products::records::ProductId,
};

const ENTITY: &str = "product category";

const COLUMN_TYPE_KEY: &str = "type_key";

const GET_CATEGORY_SQL: &str = include_str!("sql/get_category.sql");
const LIST_CATEGORY_IDS_SQL: &str = include_str!("sql/list_category_ids.sql");
const LIST_PRODUCT_CATEGORIES_SQL: &str = include_str!("sql/list_product_categories.sql");
const CREATE_CATEGORY_SQL: &str = include_str!("sql/create_category.sql");
const CREATE_CATEGORY_TYPES_SQL: &str = include_str!("sql/create_category_types.sql");
const UPDATE_CATEGORY_SQL: &str = include_str!("sql/update_category.sql");
const DELETE_CATEGORY_TYPES_SQL: &str = include_str!("sql/delete_category_types.sql");
const DELETE_CATEGORY_PRODUCTS_SQL: &str = include_str!("sql/delete_category_products.sql");
const DELETE_CATEGORY_SQL: &str = include_str!("sql/delete_category.sql");

/// Row access for `product_categories` and its `categories_to_types` relation.
#[automock]
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fetch one category together with its type set.
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: CategoryId,
    ) -> Result<ProductCategoryRecord, StoreError>;

    /// Fetch every category, ordered by id.
    async fn get_all(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<ProductCategoryRecord>, StoreError>;

    /// Insert the category row and one relation row per type.
    async fn create(
        &self,
        conn: &mut PgConnection,
        category: ProductCategoryRecord,
    ) -> Result<ProductCategoryRecord, StoreError>;

    /// Rewrite the category row and replace its type rows.
    async fn update(
        &self,
        conn: &mut PgConnection,
        category: ProductCategoryRecord,
    ) -> Result<ProductCategoryRecord, StoreError>;

    /// Remove type and product links, then the category. `true` when exactly one
    /// category row went away.
    async fn delete_by_id(&self, conn: &mut PgConnection, id: CategoryId)
    -> Result<bool, StoreError>;

    /// Categories linked to a product, ordered by id.
    async fn get_all_by_product_id(
        &self,
        conn: &mut PgConnection,
        product: ProductId,
    ) -> Result<Vec<ProductCategoryRecord>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct PgCategoryStore;

impl PgCategoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    #[tracing::instrument(
        name = "categories.store.get_by_id",
        skip(self, conn),
        fields(category_id = %id),
        err
    )]
    async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: CategoryId,
    ) -> Result<ProductCategoryRecord, StoreError> {
        let rows = query_as::<Postgres, CategoryRow>(GET_CATEGORY_SQL)
            .bind(id.into_i64())
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        assemble_categories(rows)
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound {
                entity: ENTITY,
                id: id.into_i64(),
            })
    }

    #[tracing::instrument(name = "categories.store.get_all", skip(self, conn), err)]
    async fn get_all(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<ProductCategoryRecord>, StoreError> {
        let ids = query_scalar::<Postgres, i64>(LIST_CATEGORY_IDS_SQL)
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        let mut categories = Vec::with_capacity(ids.len());

        for id in ids {
            categories.push(self.get_by_id(conn, CategoryId::from_i64(id)).await?);
        }

        debug!(category_count = categories.len(), "fetched categories");

        Ok(categories)
    }

    #[tracing::instrument(
        name = "categories.store.create",
        skip(self, conn, category),
        fields(category_id = tracing::field::Empty, type_count = category.types.len()),
        err
    )]
    async fn create(
        &self,
        conn: &mut PgConnection,
        category: ProductCategoryRecord,
    ) -> Result<ProductCategoryRecord, StoreError> {
        let id = query_scalar::<Postgres, i64>(CREATE_CATEGORY_SQL)
            .bind(&category.name)
            .fetch_one(&mut *conn)
            .await
            .map(CategoryId::from_i64)
            .map_err(|error| StoreError::create(ENTITY, error))?;

        tracing::Span::current().record("category_id", id.into_i64());

        insert_category_types(conn, id, &category.types)
            .await
            .map_err(|failure| StoreError::create(ENTITY, failure))?;

        debug!(category_id = %id, "created category");

        Ok(ProductCategoryRecord {
            id: Some(id),
            ..category
        })
    }

    #[tracing::instrument(
        name = "categories.store.update",
        skip(self, conn, category),
        fields(category_id = ?category.id, type_count = category.types.len()),
        err
    )]
    async fn update(
        &self,
        conn: &mut PgConnection,
        category: ProductCategoryRecord,
    ) -> Result<ProductCategoryRecord, StoreError> {
        let Some(id) = category.id else {
            return Err(StoreError::update(ENTITY, WriteFailure::MissingIdentity));
        };

        let rows_affected = query(UPDATE_CATEGORY_SQL)
            .bind(id.into_i64())
            .bind(&category.name)
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?
            .rows_affected();

        expect_rows(rows_affected, 1).map_err(|failure| StoreError::update(ENTITY, failure))?;

        query(DELETE_CATEGORY_TYPES_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::update(ENTITY, error))?;

        insert_category_types(conn, id, &category.types)
            .await
            .map_err(|failure| StoreError::update(ENTITY, failure))?;

        debug!(category_id = %id, "updated category");

        Ok(category)
    }

    #[tracing::instrument(
        name = "categories.store.delete_by_id",
        skip(self, conn),
        fields(category_id = %id),
        err
    )]
    async fn delete_by_id(
        &self,
        conn: &mut PgConnection,
        id: CategoryId,
    ) -> Result<bool, StoreError> {
        for relation_sql in [DELETE_CATEGORY_TYPES_SQL, DELETE_CATEGORY_PRODUCTS_SQL] {
            query(relation_sql)
                .bind(id.into_i64())
                .execute(&mut *conn)
                .await
                .map_err(|error| StoreError::delete(ENTITY, error))?;
        }

        let rows_affected = query(DELETE_CATEGORY_SQL)
            .bind(id.into_i64())
            .execute(&mut *conn)
            .await
            .map_err(|error| StoreError::delete(ENTITY, error))?
            .rows_affected();

        debug!(category_id = %id, rows_affected, "deleted category");

        Ok(rows_affected == 1)
    }

    #[tracing::instrument(
        name = "categories.store.get_all_by_product_id",
        skip(self, conn),
        fields(product_id = %product, category_count = tracing::field::Empty),
        err
    )]
    async fn get_all_by_product_id(
        &self,
        conn: &mut PgConnection,
        product: ProductId,
    ) -> Result<Vec<ProductCategoryRecord>, StoreError> {
        let rows = query_as::<Postgres, CategoryRow>(LIST_PRODUCT_CATEGORIES_SQL)
            .bind(product.into_i64())
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::read)?;

        let categories = assemble_categories(rows);

        tracing::Span::current().record("category_count", categories.len());

        Ok(categories)
    }
}

async fn insert_category_types(
    conn: &mut PgConnection,
    category: CategoryId,
    types: &BTreeSet<CategoryType>,
) -> Result<(), WriteFailure> {
    if types.is_empty() {
        return Ok(());
    }

    let keys: Vec<&str> = types.iter().map(|category_type| category_type.as_str()).collect();

    let rows_affected = query(CREATE_CATEGORY_TYPES_SQL)
        .bind(category.into_i64())
        .bind(&keys)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    expect_rows(rows_affected, keys.len() as u64)
}

/// One joined row: a category with at most one of its types.
#[derive(Debug)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    category_type: Option<CategoryType>,
}

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let category_type = row
            .try_get::<Option<String>, _>(COLUMN_TYPE_KEY)?
            .map(|key| {
                key.parse::<CategoryType>()
                    .map_err(|unknown| decode_error(COLUMN_TYPE_KEY, unknown))
            })
            .transpose()?;

        Ok(Self {
            id: CategoryId::from_i64(row.try_get("id")?),
            name: row.try_get("name")?,
            category_type,
        })
    }
}

/// Groups joined rows by category id, keeping first-seen order.
fn assemble_categories(rows: Vec<CategoryRow>) -> Vec<ProductCategoryRecord> {
    let mut positions: FxHashMap<CategoryId, usize> = FxHashMap::default();
    let mut categories: Vec<ProductCategoryRecord> = Vec::new();

    for row in rows {
        let position = *positions.entry(row.id).or_insert_with(|| {
            categories.push(ProductCategoryRecord {
                id: Some(row.id),
                name: row.name.clone(),
                types: BTreeSet::new(),
            });

            categories.len() - 1
        });

        if let (Some(category_type), Some(category)) =
            (row.category_type, categories.get_mut(position))
        {
            category.types.insert(category_type);
        }
    }

    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, category_type: Option<CategoryType>) -> CategoryRow {
        CategoryRow {
            id: CategoryId::from_i64(id),
            name: name.to_string(),
            category_type,
        }
    }

    #[test]
    fn assemble_gives_each_category_its_own_type_set() {
        let categories = assemble_categories(vec![
            row(1, "Dairy", Some(CategoryType::Perishable)),
            row(1, "Dairy", Some(CategoryType::FridgeStorage)),
            row(2, "Canned", Some(CategoryType::PantryStorage)),
            row(3, "Misc", None),
        ]);

        assert_eq!(categories.len(), 3);

        assert_eq!(categories[0].id, Some(CategoryId::from_i64(1)));
        assert_eq!(
            categories[0].types,
            BTreeSet::from([CategoryType::Perishable, CategoryType::FridgeStorage])
        );

        assert_eq!(categories[1].name, "Canned");
        assert_eq!(
            categories[1].types,
            BTreeSet::from([CategoryType::PantryStorage])
        );

        assert!(categories[2].types.is_empty());
    }

    #[test]
    fn assemble_of_no_rows_is_empty() {
        assert!(assemble_categories(Vec::new()).is_empty());
    }

    #[test]
    fn assemble_keeps_first_seen_order() {
        let categories = assemble_categories(vec![
            row(9, "Frozen", Some(CategoryType::FreezerStorage)),
            row(4, "Bakery", None),
            row(9, "Frozen", Some(CategoryType::LongTerm)),
        ]);

        let ids: Vec<Option<CategoryId>> = categories.iter().map(|c| c.id).collect();

        assert_eq!(
            ids,
            vec![Some(CategoryId::from_i64(9)), Some(CategoryId::from_i64(4))]
        );
        assert_eq!(categories[0].types.len(), 2);
    }
}
