use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::account::eligibility::missing_documents;
use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::Document;
use crate::account::models::EmailAddress;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::Role;
use crate::account::models::UploadCategory;
use crate::account::models::UploadedFile;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::DocumentStore;
use crate::account::ports::Notifier;

/// Accounts with no activity for this long are eligible for reaping.
pub const INACTIVITY_WINDOW_MINUTES: i64 = 30;

/// Lifetime of an emailed password-reset token.
pub const RESET_TOKEN_MINUTES: i64 = 30;

/// Inactivity predicate.
///
/// An account that never logged in counts as inactive from its creation
/// time: the rule is "no activity within the window", not "activity went
/// stale".
pub fn is_inactive(
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    let cutoff = now - Duration::minutes(INACTIVITY_WINDOW_MINUTES);
    match last_login_at {
        Some(stamp) => stamp < cutoff,
        None => created_at < cutoff,
    }
}

/// Snapshot entry for an account removed by the reaper.
#[derive(Debug, Clone)]
pub struct ReapedAccount {
    pub id: AccountId,
    pub email: EmailAddress,
}

/// Result of one reap run.
#[derive(Debug, Clone, Default)]
pub struct ReapOutcome {
    pub reaped: Vec<ReapedAccount>,
    pub notified: usize,
    pub notification_failures: usize,
}

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
pub struct AccountService<AR, N, DS>
where
    AR: AccountRepository,
    N: Notifier,
    DS: DocumentStore,
{
    repository: Arc<AR>,
    notifier: Arc<N>,
    document_store: Arc<DS>,
    authenticator: Arc<auth::Authenticator>,
    session_expiration_hours: i64,
}

impl<AR, N, DS> AccountService<AR, N, DS>
where
    AR: AccountRepository,
    N: Notifier,
    DS: DocumentStore,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account persistence implementation
    /// * `notifier` - Outbound email implementation
    /// * `document_store` - Upload storage implementation
    /// * `authenticator` - Password hashing and token signing
    /// * `session_expiration_hours` - Lifetime of issued session tokens
    pub fn new(
        repository: Arc<AR>,
        notifier: Arc<N>,
        document_store: Arc<DS>,
        authenticator: Arc<auth::Authenticator>,
        session_expiration_hours: i64,
    ) -> Self {
        Self {
            repository,
            notifier,
            document_store,
            authenticator,
            session_expiration_hours,
        }
    }

    async fn account_by_email(&self, email: &str) -> Result<Account, AccountError> {
        self.repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| AccountError::NotFoundByEmail(email.to_string()))
    }
}

#[async_trait]
impl<AR, N, DS> AccountServicePort for AccountService<AR, N, DS>
where
    AR: AccountRepository,
    N: Notifier,
    DS: DocumentStore,
{
    async fn register(&self, command: RegisterAccountCommand) -> Result<Account, AccountError> {
        let password_hash = self
            .authenticator
            .hash_password(&command.password)
            .map_err(|e| AccountError::Unknown(format!("Password hashing failed: {}", e)))?;

        let account = Account {
            id: AccountId::new(),
            email: command.email,
            password_hash,
            documents: Vec::new(),
            last_login_at: None,
            is_premium: false,
            role: Role::User,
            created_at: Utc::now(),
        };

        self.repository.create(account).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<(Account, String), AccountError> {
        let mut account = self.account_by_email(email).await?;

        let claims = auth::Claims::for_account(
            account.id,
            account.role.to_string(),
            self.session_expiration_hours,
        );

        let result = self
            .authenticator
            .authenticate(password, &account.password_hash, &claims)
            .map_err(|e| match e {
                auth::AuthenticationError::InvalidCredentials => AccountError::InvalidCredentials,
                other => AccountError::Unknown(other.to_string()),
            })?;

        // Stamp activity only after the password verified
        account.last_login_at = Some(Utc::now());
        let account = self.repository.update(account).await?;

        Ok((account, result.access_token))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AccountError> {
        self.repository.list_all().await
    }

    async fn upload_documents(
        &self,
        id: &AccountId,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Document>, AccountError> {
        // Resolve the account before any file write so a bad id cannot
        // leave stored files behind
        let account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;

        let mut recorded = Vec::new();
        for file in files {
            let category = UploadCategory::from_field_name(&file.field_name);
            let storage_reference = self
                .document_store
                .store(category, &file.original_filename, &file.bytes)
                .await?;

            if category == UploadCategory::Document {
                recorded.push(Document {
                    name: file.original_filename,
                    storage_reference,
                    uploaded_at: Utc::now(),
                });
            }
        }

        if !recorded.is_empty() {
            if let Err(e) = self.repository.append_documents(&account.id, &recorded).await {
                // Files already on disk have no metadata rows now; orphaned
                // storage is accepted, the append error is what matters
                tracing::warn!(
                    account_id = %account.id,
                    orphaned = recorded.len(),
                    error = %e,
                    "Document metadata append failed after files were stored"
                );
                return Err(e);
            }
        }

        Ok(recorded)
    }

    async fn upgrade_to_premium(&self, id: &AccountId) -> Result<Account, AccountError> {
        let mut account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;

        if account.is_premium {
            // Already upgraded; the flag never goes back down
            return Ok(account);
        }

        let missing = missing_documents(&account.documents);
        if !missing.is_empty() {
            return Err(AccountError::DocumentsIncomplete {
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        account.is_premium = true;
        self.repository.update(account).await
    }

    async fn update_role(&self, id: &AccountId, role: Role) -> Result<Account, AccountError> {
        let mut account = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;

        account.role = role;
        self.repository.update(account).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let account = self.account_by_email(email).await?;

        let claims = auth::Claims::for_password_reset(account.id, RESET_TOKEN_MINUTES);
        let token = self
            .authenticator
            .generate_token(&claims)
            .map_err(|e| AccountError::Unknown(format!("Token generation failed: {}", e)))?;

        if let Err(e) = self
            .notifier
            .send_password_reset(&account.email, &token)
            .await
        {
            tracing::error!(
                account_id = %account.id,
                error = %e,
                "Failed to send password reset email"
            );
        }

        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        token: &str,
    ) -> Result<(), AccountError> {
        let mut account = self.account_by_email(email).await?;

        let claims: auth::Claims = self
            .authenticator
            .validate_token(token)
            .map_err(|_| AccountError::InvalidResetToken)?;

        let subject_matches = claims.sub.as_deref() == Some(account.id.to_string().as_str());
        if !claims.is_password_reset() || !subject_matches {
            return Err(AccountError::InvalidResetToken);
        }

        let unchanged = self
            .authenticator
            .verify_password(new_password, &account.password_hash)
            .map_err(|e| AccountError::Unknown(format!("Password verification failed: {}", e)))?;
        if unchanged {
            return Err(AccountError::SamePassword);
        }

        account.password_hash = self
            .authenticator
            .hash_password(new_password)
            .map_err(|e| AccountError::Unknown(format!("Password hashing failed: {}", e)))?;

        self.repository.update(account).await?;
        Ok(())
    }

    async fn reap_inactive(&self) -> Result<ReapOutcome, AccountError> {
        let cutoff = Utc::now() - Duration::minutes(INACTIVITY_WINDOW_MINUTES);

        let snapshot = self.repository.find_inactive(cutoff).await?;
        if snapshot.is_empty() {
            return Ok(ReapOutcome::default());
        }

        let reaped: Vec<ReapedAccount> = snapshot
            .iter()
            .map(|account| ReapedAccount {
                id: account.id,
                email: account.email.clone(),
            })
            .collect();

        // Delete exactly the snapshot, not a re-evaluated predicate
        let ids: Vec<AccountId> = reaped.iter().map(|r| r.id).collect();
        let removed = self.repository.delete_by_ids(&ids).await?;
        tracing::info!(removed, "Inactive accounts deleted");

        let mut notified = 0;
        let mut notification_failures = 0;
        for account in &reaped {
            match self.notifier.send_deletion_notice(&account.email).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    notification_failures += 1;
                    tracing::error!(
                        account_id = %account.id,
                        error = %e,
                        "Failed to send deletion notice"
                    );
                }
            }
        }

        Ok(ReapOutcome {
            reaped,
            notified,
            notification_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::account::eligibility::REQUIRED_DOCUMENTS;
    use crate::account::errors::NotifierError;
    use crate::account::errors::StorageError;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn create(&self, account: Account) -> Result<Account, AccountError>;
            async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;
            async fn list_all(&self) -> Result<Vec<Account>, AccountError>;
            async fn update(&self, account: Account) -> Result<Account, AccountError>;
            async fn append_documents(&self, id: &AccountId, documents: &[Document]) -> Result<(), AccountError>;
            async fn find_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Account>, AccountError>;
            async fn delete_by_ids(&self, ids: &[AccountId]) -> Result<u64, AccountError>;
        }
    }

    mock! {
        pub TestNotifier {}

        #[async_trait]
        impl Notifier for TestNotifier {
            async fn send_deletion_notice(&self, email: &EmailAddress) -> Result<(), NotifierError>;
            async fn send_password_reset(&self, email: &EmailAddress, token: &str) -> Result<(), NotifierError>;
            async fn send_product_removed(&self, email: &EmailAddress, product_name: &str) -> Result<(), NotifierError>;
        }
    }

    mock! {
        pub TestDocumentStore {}

        #[async_trait]
        impl DocumentStore for TestDocumentStore {
            async fn store(&self, category: UploadCategory, original_filename: &str, bytes: &[u8]) -> Result<String, StorageError>;
        }
    }

    const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    fn service(
        repository: MockTestAccountRepository,
        notifier: MockTestNotifier,
        store: MockTestDocumentStore,
    ) -> AccountService<MockTestAccountRepository, MockTestNotifier, MockTestDocumentStore> {
        AccountService::new(
            Arc::new(repository),
            Arc::new(notifier),
            Arc::new(store),
            Arc::new(auth::Authenticator::new(TEST_SECRET)),
            24,
        )
    }

    fn test_account(password_hash: &str) -> Account {
        Account {
            id: AccountId::new(),
            email: EmailAddress::new("test@example.com".to_string()).unwrap(),
            password_hash: password_hash.to_string(),
            documents: Vec::new(),
            last_login_at: None,
            is_premium: false,
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn doc(name: &str) -> Document {
        Document {
            name: name.to_string(),
            storage_reference: format!("documents/{}", name),
            uploaded_at: Utc::now(),
        }
    }

    fn real_hash(password: &str) -> String {
        auth::Authenticator::new(TEST_SECRET)
            .hash_password(password)
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_sets_defaults() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_create()
            .withf(|account| {
                account.password_hash.starts_with("$argon2")
                    && !account.is_premium
                    && account.role == Role::User
                    && account.last_login_at.is_none()
                    && account.documents.is_empty()
            })
            .times(1)
            .returning(|account| Ok(account));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let command = RegisterAccountCommand::new(
            EmailAddress::new("new@example.com".to_string()).unwrap(),
            "password123".to_string(),
        );

        let account = svc.register(command).await.unwrap();
        assert_eq!(account.email.as_str(), "new@example.com");
        assert_ne!(account.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut repository = MockTestAccountRepository::new();
        repository.expect_create().times(1).returning(|account| {
            Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ))
        });

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let command = RegisterAccountCommand::new(
            EmailAddress::new("taken@example.com".to_string()).unwrap(),
            "password123".to_string(),
        );

        let result = svc.register(command).await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_login_success_stamps_activity_and_issues_token() {
        let account = test_account(&real_hash("password123"));
        let account_id = account.id;

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .withf(|email| email == "test@example.com")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository
            .expect_update()
            .withf(|account| account.last_login_at.is_some())
            .times(1)
            .returning(|account| Ok(account));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let (logged_in, token) = svc.login("test@example.com", "password123").await.unwrap();
        assert!(logged_in.last_login_at.is_some());

        let claims: auth::Claims = auth::Authenticator::new(TEST_SECRET)
            .validate_token(&token)
            .unwrap();
        assert_eq!(claims.sub, Some(account_id.to_string()));
        assert_eq!(claims.role(), Some("user".to_string()));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_activity_untouched() {
        let account = test_account(&real_hash("password123"));

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        // No update call on a failed login
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc.login("test@example.com", "wrong_password").await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc.login("ghost@example.com", "password123").await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::NotFoundByEmail(_)
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_account_before_storing() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_append_documents().times(0);

        let mut store = MockTestDocumentStore::new();
        // Nothing must reach storage when the account does not exist
        store.expect_store().times(0);

        let svc = service(repository, MockTestNotifier::new(), store);

        let files = vec![UploadedFile {
            field_name: "documents".to_string(),
            original_filename: "Identificación".to_string(),
            bytes: vec![1, 2, 3],
        }];

        let result = svc.upload_documents(&AccountId::new(), files).await;
        assert!(matches!(result.unwrap_err(), AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_records_documents_in_order_and_skips_images() {
        let account = test_account("$argon2id$hash");
        let account_id = account.id;

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository
            .expect_append_documents()
            .withf(move |id, documents| {
                *id == account_id
                    && documents.len() == 2
                    && documents[0].name == "Identificación"
                    && documents[1].name == "Comprobante de domicilio"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut store = MockTestDocumentStore::new();
        store
            .expect_store()
            .times(3)
            .returning(|category, filename, _| Ok(format!("{}/{}", category.directory(), filename)));

        let svc = service(repository, MockTestNotifier::new(), store);

        let files = vec![
            UploadedFile {
                field_name: "documents".to_string(),
                original_filename: "Identificación".to_string(),
                bytes: vec![1],
            },
            UploadedFile {
                field_name: "profileImage".to_string(),
                original_filename: "avatar.png".to_string(),
                bytes: vec![2],
            },
            UploadedFile {
                field_name: "documents".to_string(),
                original_filename: "Comprobante de domicilio".to_string(),
                bytes: vec![3],
            },
        ];

        let recorded = svc.upload_documents(&account_id, files).await.unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].name, "Identificación");
        assert_eq!(recorded[1].name, "Comprobante de domicilio");
        assert_eq!(recorded[0].storage_reference, "documents/Identificación");
    }

    #[tokio::test]
    async fn test_premium_upgrade_fails_closed_when_documents_missing() {
        let mut account = test_account("$argon2id$hash");
        account.documents = vec![doc("Identificación"), doc("Comprobante de domicilio")];

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        // The premium flag must not be persisted on failure
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc.upgrade_to_premium(&account.id).await;
        match result.unwrap_err() {
            AccountError::DocumentsIncomplete { missing } => {
                assert_eq!(missing, vec!["Comprobante de estado de cuenta"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_premium_upgrade_succeeds_with_complete_documents() {
        let mut account = test_account("$argon2id$hash");
        account.documents = REQUIRED_DOCUMENTS.iter().map(|n| doc(n)).collect();

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository
            .expect_update()
            .withf(|account| account.is_premium)
            .times(1)
            .returning(|account| Ok(account));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let upgraded = svc.upgrade_to_premium(&account.id).await.unwrap();
        assert!(upgraded.is_premium);
    }

    #[tokio::test]
    async fn test_premium_upgrade_is_idempotent_once_set() {
        let mut account = test_account("$argon2id$hash");
        account.is_premium = true;
        // Even with an empty document set the flag stays up

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc.upgrade_to_premium(&account.id).await.unwrap();
        assert!(result.is_premium);
    }

    #[tokio::test]
    async fn test_update_role_persists_new_role() {
        let account = test_account("$argon2id$hash");

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository
            .expect_update()
            .withf(|account| account.role == Role::Admin)
            .times(1)
            .returning(|account| Ok(account));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let updated = svc.update_role(&account.id, Role::Admin).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_request_password_reset_survives_notifier_failure() {
        let account = test_account("$argon2id$hash");

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let mut notifier = MockTestNotifier::new();
        notifier
            .expect_send_password_reset()
            .times(1)
            .returning(|_, _| Err(NotifierError::SendFailed("smtp down".to_string())));

        let svc = service(repository, notifier, MockTestDocumentStore::new());

        // Delivery is best-effort; the request itself succeeds
        assert!(svc.request_password_reset("test@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_same_password() {
        let account = test_account(&real_hash("current_password"));
        let token = auth::Authenticator::new(TEST_SECRET)
            .generate_token(&auth::Claims::for_password_reset(account.id, 30))
            .unwrap();

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc
            .reset_password("test@example.com", "current_password", &token)
            .await;
        assert!(matches!(result.unwrap_err(), AccountError::SamePassword));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_session_token() {
        let account = test_account(&real_hash("current_password"));
        // Right signature, wrong purpose
        let token = auth::Authenticator::new(TEST_SECRET)
            .generate_token(&auth::Claims::for_account(account.id, "user".to_string(), 24))
            .unwrap();

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc
            .reset_password("test@example.com", "brand_new_password", &token)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidResetToken
        ));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_token_for_other_account() {
        let account = test_account(&real_hash("current_password"));
        let token = auth::Authenticator::new(TEST_SECRET)
            .generate_token(&auth::Claims::for_password_reset(AccountId::new(), 30))
            .unwrap();

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repository.expect_update().times(0);

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        let result = svc
            .reset_password("test@example.com", "brand_new_password", &token)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            AccountError::InvalidResetToken
        ));
    }

    #[tokio::test]
    async fn test_reset_password_stores_new_hash() {
        let old_hash = real_hash("current_password");
        let account = test_account(&old_hash);
        let token = auth::Authenticator::new(TEST_SECRET)
            .generate_token(&auth::Claims::for_password_reset(account.id, 30))
            .unwrap();

        let mut repository = MockTestAccountRepository::new();
        let found = account.clone();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        let old_hash_check = old_hash.clone();
        repository
            .expect_update()
            .withf(move |account| {
                account.password_hash != old_hash_check
                    && account.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|account| Ok(account));

        let svc = service(
            repository,
            MockTestNotifier::new(),
            MockTestDocumentStore::new(),
        );

        svc.reset_password("test@example.com", "brand_new_password", &token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reap_deletes_snapshot_and_notifies_best_effort() {
        let stale = |email: &str| {
            let mut account = test_account("$argon2id$hash");
            account.email = EmailAddress::new(email.to_string()).unwrap();
            account.last_login_at = Some(Utc::now() - Duration::minutes(45));
            account
        };
        let accounts = vec![
            stale("one@example.com"),
            stale("two@example.com"),
            stale("three@example.com"),
        ];
        let ids: Vec<AccountId> = accounts.iter().map(|a| a.id).collect();
        let failing_email = accounts[1].email.clone();

        let mut repository = MockTestAccountRepository::new();
        let snapshot = accounts.clone();
        repository
            .expect_find_inactive()
            .times(1)
            .returning(move |_| Ok(snapshot.clone()));
        let expected_ids = ids.clone();
        repository
            .expect_delete_by_ids()
            .withf(move |ids| ids == expected_ids.as_slice())
            .times(1)
            .returning(|ids| Ok(ids.len() as u64));

        let mut notifier = MockTestNotifier::new();
        // Account #2's notice fails; #1 and #3 still go out
        notifier
            .expect_send_deletion_notice()
            .times(3)
            .returning(move |email| {
                if *email == failing_email {
                    Err(NotifierError::SendFailed("mailbox gone".to_string()))
                } else {
                    Ok(())
                }
            });

        let svc = service(repository, notifier, MockTestDocumentStore::new());

        let outcome = svc.reap_inactive().await.unwrap();
        assert_eq!(outcome.reaped.len(), 3);
        assert_eq!(outcome.notified, 2);
        assert_eq!(outcome.notification_failures, 1);
    }

    #[tokio::test]
    async fn test_reap_with_no_inactive_accounts() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_inactive()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        repository.expect_delete_by_ids().times(0);

        let mut notifier = MockTestNotifier::new();
        notifier.expect_send_deletion_notice().times(0);

        let svc = service(repository, notifier, MockTestDocumentStore::new());

        let outcome = svc.reap_inactive().await.unwrap();
        assert!(outcome.reaped.is_empty());
    }

    #[test]
    fn test_inactivity_predicate_boundary() {
        let now = Utc::now();
        let old_creation = now - Duration::days(1);

        // 29 minutes ago: inside the window, kept
        assert!(!is_inactive(
            Some(now - Duration::minutes(29)),
            old_creation,
            now
        ));
        // 31 minutes ago: outside the window, reaped
        assert!(is_inactive(
            Some(now - Duration::minutes(31)),
            old_creation,
            now
        ));
        // Never logged in, created long ago: reaped
        assert!(is_inactive(None, old_creation, now));
        // Never logged in but freshly created: kept
        assert!(!is_inactive(None, now - Duration::minutes(5), now));
    }
}
