use tracing::info;

use crate::application::repos::{CreateProductParams, UpdateProductParams};
use crate::domain::entities::{ProductFields, ProductRecord};
use crate::domain::types::ProductId;

use super::service::CatalogService;
use super::types::CatalogError;

impl CatalogService {
    /// Persists a new product with no likes and refreshes listings.
    pub async fn create(&self, fields: ProductFields) -> Result<ProductRecord, CatalogError> {
        fields.validate()?;

        let product = self
            .writer
            .create_product(CreateProductParams { fields })
            .await
            .map_err(CatalogError::store)?;

        self.invalidate_listing("product.create").await;
        info!(product_id = product.id, "product created");
        Ok(product)
    }

    /// Overwrites the editable fields of an existing product.
    pub async fn update(
        &self,
        id: ProductId,
        fields: ProductFields,
    ) -> Result<ProductRecord, CatalogError> {
        let current = self.load_product(id).await?;
        fields.validate()?;

        let product = self
            .writer
            .update_product(UpdateProductParams {
                id: current.id,
                fields,
            })
            .await
            .map_err(|err| CatalogError::from_repo(err, id))?;

        self.invalidate_listing("product.update").await;
        info!(product_id = id, "product updated");
        Ok(product)
    }

    pub async fn remove(&self, id: ProductId) -> Result<(), CatalogError> {
        let current = self.load_product(id).await?;

        self.writer
            .delete_product(current.id)
            .await
            .map_err(|err| CatalogError::from_repo(err, id))?;

        self.invalidate_listing("product.remove").await;
        info!(product_id = id, "product removed");
        Ok(())
    }
}
