use std::sync::Arc;

use async_trait::async_trait;

use crate::account::ports::AccountRepository;
use crate::account::ports::Notifier;
use crate::product::errors::ProductError;
use crate::product::models::Product;
use crate::product::models::ProductId;
use crate::product::ports::ProductRepository;
use crate::product::ports::ProductServicePort;

/// Domain service for product operations.
pub struct ProductService<PR, AR, N>
where
    PR: ProductRepository,
    AR: AccountRepository,
    N: Notifier,
{
    products: Arc<PR>,
    accounts: Arc<AR>,
    notifier: Arc<N>,
}

impl<PR, AR, N> ProductService<PR, AR, N>
where
    PR: ProductRepository,
    AR: AccountRepository,
    N: Notifier,
{
    pub fn new(products: Arc<PR>, accounts: Arc<AR>, notifier: Arc<N>) -> Self {
        Self {
            products,
            accounts,
            notifier,
        }
    }
}

#[async_trait]
impl<PR, AR, N> ProductServicePort for ProductService<PR, AR, N>
where
    PR: ProductRepository,
    AR: AccountRepository,
    N: Notifier,
{
    async fn delete_product(&self, id: &ProductId) -> Result<Product, ProductError> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;

        self.products.delete(id).await?;

        // Premium owners are told their listing went away; everyone else is
        // not notified, matching the original behavior
        let owner = self
            .accounts
            .find_by_id(&product.owner_id)
            .await
            .map_err(ProductError::from)?;

        if let Some(owner) = owner {
            if owner.is_premium {
                if let Err(e) = self
                    .notifier
                    .send_product_removed(&owner.email, &product.name)
                    .await
                {
                    tracing::error!(
                        product_id = %product.id,
                        owner_id = %owner.id,
                        error = %e,
                        "Failed to send product removal notice"
                    );
                }
            }
        }

        Ok(product)
    }
}
