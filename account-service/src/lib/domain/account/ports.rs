use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::errors::NotifierError;
use crate::account::errors::StorageError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::Document;
use crate::account::models::EmailAddress;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::Role;
use crate::account::models::UploadCategory;
use crate::account::models::UploadedFile;
use crate::account::service::ReapOutcome;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account with a hashed password.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterAccountCommand) -> Result<Account, AccountError>;

    /// Verify credentials, stamp the activity timestamp, and issue a signed
    /// session token.
    ///
    /// The activity stamp is written only after the password verifies; a
    /// failed login leaves the account untouched.
    ///
    /// # Errors
    /// * `NotFoundByEmail` - No account with this email
    /// * `InvalidCredentials` - Password mismatch
    /// * `DatabaseError` - Store operation failed
    async fn login(&self, email: &str, password: &str) -> Result<(Account, String), AccountError>;

    /// Retrieve all accounts.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Store uploaded files and record document metadata on the account.
    ///
    /// Account existence is checked before any file is written. Only files
    /// from the generic document category are recorded on the account;
    /// profile and product images are stored without metadata. Returns the
    /// recorded documents in upload order.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist (nothing is stored)
    /// * `Storage` - A file write failed
    /// * `DatabaseError` - Metadata append failed
    async fn upload_documents(
        &self,
        id: &AccountId,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Document>, AccountError>;

    /// Upgrade the account to premium if its document set is complete.
    ///
    /// Fails closed: when any required document name is missing nothing is
    /// persisted and the premium flag is untouched.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DocumentsIncomplete` - One or more required documents missing
    /// * `DatabaseError` - Store operation failed
    async fn upgrade_to_premium(&self, id: &AccountId) -> Result<Account, AccountError>;

    /// Set the account's role.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Store operation failed
    async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError>;

    /// Issue a short-lived reset token and email it to the account.
    ///
    /// Token delivery is best-effort; a notifier failure is logged and the
    /// operation still succeeds.
    ///
    /// # Errors
    /// * `NotFoundByEmail` - No account with this email
    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError>;

    /// Validate a reset token and store a new password.
    ///
    /// # Errors
    /// * `NotFoundByEmail` - No account with this email
    /// * `InvalidResetToken` - Token invalid, expired, wrong purpose, or
    ///   bound to a different account
    /// * `SamePassword` - New password equals the current one
    /// * `DatabaseError` - Store operation failed
    async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        token: &str,
    ) -> Result<(), AccountError>;

    /// Delete accounts inactive beyond the fixed window and best-effort
    /// notify each one.
    ///
    /// Deletion is scoped to the snapshot taken at the start of the run.
    /// Notification failures never roll back deletions nor abort the
    /// remaining notifications.
    ///
    /// # Errors
    /// * `DatabaseError` - Snapshot or delete failed
    async fn reap_inactive(&self) -> Result<ReapOutcome, AccountError>;
}

/// Persistence operations for the account aggregate.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Unique email constraint violated
    /// * `DatabaseError` - Store operation failed
    async fn create(&self, account: Account) -> Result<Account, AccountError>;

    /// Retrieve an account (with documents) by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Retrieve an account (with documents) by email.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Retrieve all accounts, newest first.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn list_all(&self) -> Result<Vec<Account>, AccountError>;

    /// Update the account's scalar fields (password hash, premium flag,
    /// role, activity stamp). Documents are not touched here.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `EmailAlreadyExists` - Unique email constraint violated
    /// * `DatabaseError` - Store operation failed
    async fn update(&self, account: Account) -> Result<Account, AccountError>;

    /// Append document metadata rows, preserving the slice order.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn append_documents(
        &self,
        id: &AccountId,
        documents: &[Document],
    ) -> Result<(), AccountError>;

    /// Accounts whose last activity predates `cutoff`. Accounts that never
    /// logged in qualify once their creation time predates `cutoff`.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Account>, AccountError>;

    /// Delete exactly the given accounts. Returns the number removed.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn delete_by_ids(&self, ids: &[AccountId]) -> Result<u64, AccountError>;
}

/// Outbound email delivery. All sends are fire-and-forget from the caller's
/// perspective; failures are reported so they can be logged, never to abort
/// the surrounding operation.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Tell an account holder their account was deleted for inactivity.
    async fn send_deletion_notice(&self, email: &EmailAddress) -> Result<(), NotifierError>;

    /// Deliver a password-reset token.
    async fn send_password_reset(
        &self,
        email: &EmailAddress,
        token: &str,
    ) -> Result<(), NotifierError>;

    /// Tell a premium owner their product was removed.
    async fn send_product_removed(
        &self,
        email: &EmailAddress,
        product_name: &str,
    ) -> Result<(), NotifierError>;
}

/// Upload storage backend.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Persist file bytes under the category's partition and return an
    /// opaque storage reference. Stored names are namespaced by category and
    /// timestamp, so original-filename collisions are not a concern here.
    ///
    /// # Errors
    /// * `WriteFailed` - The backend could not persist the file
    async fn store(
        &self,
        category: UploadCategory,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError>;
}
