use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::application::repos::{ListProductsParams, ProductQuery, ProductsRepo, RepoError};
use crate::domain::entities::ProductRecord;
use crate::domain::types::ProductId;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::types::{PRODUCT_COLUMNS, ProductRow, fetch_liked_by, push_order_by, push_predicates};

const LISTING_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

impl PostgresRepositories {
    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn find_by_id(
        &self,
        id: ProductId,
        with_liked_by: bool,
    ) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let liked_by = if with_liked_by {
            Some(
                fetch_liked_by(self.pool(), id)
                    .await
                    .map_err(map_sqlx_error)?,
            )
        } else {
            None
        };

        row.into_record(liked_by).map(Some)
    }

    async fn list_products(
        &self,
        params: ListProductsParams,
    ) -> Result<(Vec<ProductRecord>, u64), RepoError> {
        let offset = i64::try_from(params.offset).map_err(|_| RepoError::InvalidInput {
            message: format!("offset {} exceeds supported range", params.offset),
        })?;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        // Count and slice must observe the same snapshot.
        sqlx::query(LISTING_ISOLATION)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products p"));
        push_order_by(&mut qb, params.sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(params.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let items = rows
            .into_iter()
            .map(|row| row.into_record(None))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, Self::convert_count(total)?))
    }

    async fn query_products(&self, query: &ProductQuery) -> Result<Vec<ProductRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE 1=1"
        ));
        push_predicates(&mut qb, &query.predicates);
        push_order_by(&mut qb, query.sort);

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(|row| row.into_record(None)).collect()
    }
}
