use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Error for upload storage operations
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to write upload: {0}")]
    WriteFailed(String),
}

/// Error for outbound notification delivery
#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Failed to build message: {0}")]
    InvalidMessage(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    // Domain-level errors
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("No account registered for email: {0}")]
    NotFoundByEmail(String),

    #[error("Email already registered: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Required documents missing: {}", missing.join(", "))]
    DocumentsIncomplete { missing: Vec<String> },

    #[error("New password must differ from the current one")]
    SamePassword,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        AccountError::Unknown(err.to_string())
    }
}
