use tracing::{debug, info};

use crate::domain::entities::ProductRecord;
use crate::domain::products::LikeChange;
use crate::domain::types::{ProductId, UserId};

use super::service::CatalogService;
use super::types::CatalogError;

impl CatalogService {
    /// Adds `user_id` to the product's likers.
    ///
    /// Liking twice is a conflict and leaves the product unchanged.
    pub async fn like(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<ProductRecord, CatalogError> {
        let product = self.load_product(product_id).await?;
        if product.has_liked(user_id) {
            return Err(CatalogError::AlreadyLiked {
                product_id,
                user_id,
            });
        }

        let outcome = self
            .writer
            .save_like_change(product_id, LikeChange::Add(user_id))
            .await
            .map_err(|err| CatalogError::from_repo(err, product_id))?;

        // A concurrent like by the same user landed between the check and the write.
        if !outcome.applied {
            return Err(CatalogError::AlreadyLiked {
                product_id,
                user_id,
            });
        }

        self.invalidate_listing("product.like").await;
        info!(
            product_id,
            user_id,
            likes_count = outcome.product.likes_count,
            "product liked"
        );
        Ok(outcome.product)
    }

    /// Removes `user_id` from the product's likers.
    ///
    /// Unliking a product the user does not like returns it unchanged.
    pub async fn unlike(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<ProductRecord, CatalogError> {
        let product = self.load_product(product_id).await?;
        if !product.has_liked(user_id) {
            debug!(product_id, user_id, "unlike ignored; product not liked");
            return Ok(product);
        }

        let outcome = self
            .writer
            .save_like_change(product_id, LikeChange::Remove(user_id))
            .await
            .map_err(|err| CatalogError::from_repo(err, product_id))?;

        if outcome.applied {
            self.invalidate_listing("product.unlike").await;
            info!(
                product_id,
                user_id,
                likes_count = outcome.product.likes_count,
                "product unliked"
            );
        }
        Ok(outcome.product)
    }
}
