use thiserror::Error;

use crate::account::errors::AccountError;

/// Error for product operations
#[derive(Debug, Clone, Error)]
pub enum ProductError {
    #[error("Invalid product ID: {0}")]
    InvalidProductId(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<AccountError> for ProductError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DatabaseError(msg) => ProductError::DatabaseError(msg),
            other => ProductError::Unknown(other.to_string()),
        }
    }
}
