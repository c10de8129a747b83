use std::collections::BTreeSet;

use sqlx::{Executor, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::repos::RepoError;
use crate::domain::entities::ProductRecord;
use crate::domain::filters::{NumericField, ProductPredicate, ProductSort, TextField};
use crate::domain::types::{ProductId, SortField, UserRef};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category, \
     p.subcategory, p.stock, p.likes_count, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: f64,
    pub(crate) category: String,
    pub(crate) subcategory: String,
    pub(crate) stock: i32,
    pub(crate) likes_count: i32,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl ProductRow {
    pub(crate) fn into_record(
        self,
        liked_by: Option<BTreeSet<UserRef>>,
    ) -> Result<ProductRecord, RepoError> {
        let stock = u32::try_from(self.stock)
            .map_err(|_| RepoError::integrity(format!("product {} has negative stock", self.id)))?;
        let likes_count = u32::try_from(self.likes_count).map_err(|_| {
            RepoError::integrity(format!("product {} has negative likes_count", self.id))
        })?;

        Ok(ProductRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            subcategory: self.subcategory,
            stock,
            likes_count,
            liked_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) fn stock_to_db(stock: u32) -> Result<i32, RepoError> {
    i32::try_from(stock).map_err(|_| RepoError::InvalidInput {
        message: format!("stock {stock} exceeds supported range"),
    })
}

pub(crate) async fn fetch_liked_by<'e, E>(
    executor: E,
    product_id: ProductId,
) -> Result<BTreeSet<UserRef>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let user_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT user_id FROM product_likes WHERE product_id = $1 ORDER BY user_id",
    )
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    Ok(user_ids.into_iter().map(UserRef::new).collect())
}

// Field to column mapping. Every column name reaching SQL comes from here.

fn text_column(field: TextField) -> &'static str {
    match field {
        TextField::Name => "p.name",
        TextField::Category => "p.category",
        TextField::Subcategory => "p.subcategory",
    }
}

fn numeric_column(field: NumericField) -> &'static str {
    match field {
        NumericField::Price => "p.price",
        NumericField::LikesCount => "p.likes_count",
    }
}

pub(crate) fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "p.id",
        SortField::Name => "p.name",
        SortField::Description => "p.description",
        SortField::Price => "p.price",
        SortField::Category => "p.category",
        SortField::Subcategory => "p.subcategory",
        SortField::Stock => "p.stock",
        SortField::LikesCount => "p.likes_count",
        SortField::CreatedAt => "p.created_at",
        SortField::UpdatedAt => "p.updated_at",
    }
}

/// Escapes `LIKE` metacharacters so the needle matches literally.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(crate) fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, predicates: &[ProductPredicate]) {
    for predicate in predicates {
        match predicate {
            ProductPredicate::Equals { field, value } => {
                qb.push(" AND ");
                qb.push(text_column(*field));
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
            ProductPredicate::Contains { field, needle } => {
                qb.push(" AND ");
                qb.push(text_column(*field));
                qb.push(" LIKE ");
                qb.push_bind(format!("%{}%", escape_like(needle)));
            }
            ProductPredicate::Range { field, min, max } => {
                if let Some(min) = min {
                    qb.push(" AND ");
                    qb.push(numeric_column(*field));
                    qb.push(" >= ");
                    qb.push_bind(*min);
                }
                if let Some(max) = max {
                    qb.push(" AND ");
                    qb.push(numeric_column(*field));
                    qb.push(" <= ");
                    qb.push_bind(*max);
                }
            }
        }
    }
}

pub(crate) fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: ProductSort) {
    let direction = sort.direction.as_sql();
    qb.push(" ORDER BY ");
    qb.push(sort_column(sort.field));
    qb.push(" ");
    qb.push(direction);
    if sort.field != SortField::Id {
        qb.push(", p.id ");
        qb.push(direction);
    }
}
