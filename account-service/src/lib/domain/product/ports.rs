use async_trait::async_trait;

use crate::product::errors::ProductError;
use crate::product::models::Product;
use crate::product::models::ProductId;

/// Port for product domain service operations.
#[async_trait]
pub trait ProductServicePort: Send + Sync + 'static {
    /// Delete a product; premium owners get a best-effort removal notice.
    ///
    /// # Errors
    /// * `NotFound` - Product does not exist
    /// * `DatabaseError` - Store operation failed
    async fn delete_product(&self, id: &ProductId) -> Result<Product, ProductError>;
}

/// Persistence operations for products.
#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Retrieve a product by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, ProductError>;

    /// Remove a product.
    ///
    /// # Errors
    /// * `NotFound` - Product does not exist
    /// * `DatabaseError` - Store operation failed
    async fn delete(&self, id: &ProductId) -> Result<(), ProductError>;
}
