use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::repos::{
    CreateProductParams, LikeChangeOutcome, ProductsWriteRepo, RepoError, UpdateProductParams,
};
use crate::domain::entities::ProductRecord;
use crate::domain::products::LikeChange;
use crate::domain::types::ProductId;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::types::{PRODUCT_COLUMNS, ProductRow, fetch_liked_by, stock_to_db};

const RETURNING_COLUMNS: &str = "id, name, description, price, category, subcategory, stock, \
     likes_count, created_at, updated_at";

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let CreateProductParams { fields } = params;
        let stock = stock_to_db(fields.stock)?;
        let now = OffsetDateTime::now_utc();

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
                 (name, description, price, category, subcategory, stock, likes_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $7) \
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(fields.name)
        .bind(fields.description)
        .bind(fields.price)
        .bind(fields.category)
        .bind(fields.subcategory)
        .bind(stock)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.into_record(Some(Default::default()))
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        let UpdateProductParams { id, fields } = params;
        let stock = stock_to_db(fields.stock)?;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, category = $5, \
                 subcategory = $6, stock = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {RETURNING_COLUMNS}"
        ))
        .bind(id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(fields.price)
        .bind(fields.category)
        .bind(fields.subcategory)
        .bind(stock)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        let liked_by = fetch_liked_by(&mut *tx, id)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        row.into_record(Some(liked_by))
    }

    async fn save_like_change(
        &self,
        product_id: ProductId,
        change: LikeChange,
    ) -> Result<LikeChangeOutcome, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Serializes concurrent like changes on the same product.
        let locked = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1 FOR UPDATE"
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        let affected = match change {
            LikeChange::Add(user_id) => sqlx::query(
                "INSERT INTO product_likes (product_id, user_id) VALUES ($1, $2) \
                 ON CONFLICT (product_id, user_id) DO NOTHING",
            )
            .bind(product_id)
            .bind(user_id),
            LikeChange::Remove(user_id) => {
                sqlx::query("DELETE FROM product_likes WHERE product_id = $1 AND user_id = $2")
                    .bind(product_id)
                    .bind(user_id)
            }
        }
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();
        let applied = affected == 1;

        let row = if applied {
            sqlx::query_as::<_, ProductRow>(&format!(
                "UPDATE products \
                 SET likes_count = (SELECT COUNT(*) FROM product_likes WHERE product_id = $1)::INTEGER, \
                     updated_at = $2 \
                 WHERE id = $1 \
                 RETURNING {RETURNING_COLUMNS}"
            ))
            .bind(product_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
        } else {
            debug!(
                product_id,
                user_id = change.user_id(),
                "like membership already in requested state"
            );
            locked
        };

        let liked_by = fetch_liked_by(&mut *tx, product_id)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        let product = row.into_record(Some(liked_by))?;
        product
            .ensure_likes_consistent()
            .map_err(|err| RepoError::integrity(err.to_string()))?;

        Ok(LikeChangeOutcome { product, applied })
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
