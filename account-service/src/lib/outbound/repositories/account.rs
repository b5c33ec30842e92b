use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::Document;
use crate::account::models::EmailAddress;
use crate::account::models::Role;
use crate::account::ports::AccountRepository;

pub struct PostgresAccountRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    last_login_at: Option<DateTime<Utc>>,
    is_premium: bool,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    account_id: Uuid,
    name: String,
    storage_reference: String,
    uploaded_at: DateTime<Utc>,
}

const SELECT_ACCOUNT: &str = r#"
    SELECT id, email, password_hash, last_login_at, is_premium, role, created_at
    FROM accounts
"#;

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn into_account(row: AccountRow, documents: Vec<Document>) -> Result<Account, AccountError> {
        Ok(Account {
            id: AccountId(row.id),
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            documents,
            last_login_at: row.last_login_at,
            is_premium: row.is_premium,
            role: row.role.parse::<Role>()?,
            created_at: row.created_at,
        })
    }

    /// Documents for the given accounts, in upload order, grouped by owner.
    async fn load_documents(
        &self,
        account_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Document>>, AccountError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT account_id, name, storage_reference, uploaded_at
            FROM account_documents
            WHERE account_id = ANY($1)
            ORDER BY seq
            "#,
        )
        .bind(account_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let mut grouped: HashMap<Uuid, Vec<Document>> = HashMap::new();
        for row in rows {
            grouped.entry(row.account_id).or_default().push(Document {
                name: row.name,
                storage_reference: row.storage_reference,
                uploaded_at: row.uploaded_at,
            });
        }

        Ok(grouped)
    }

    async fn hydrate(&self, row: AccountRow) -> Result<Account, AccountError> {
        let mut documents = self.load_documents(&[row.id]).await?;
        let documents = documents.remove(&row.id).unwrap_or_default();
        Self::into_account(row, documents)
    }

    async fn hydrate_all(&self, rows: Vec<AccountRow>) -> Result<Vec<Account>, AccountError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut documents = self.load_documents(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let docs = documents.remove(&row.id).unwrap_or_default();
                Self::into_account(row, docs)
            })
            .collect()
    }

    fn map_unique_violation(e: sqlx::Error, email: &EmailAddress) -> AccountError {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("accounts_email_key") {
                return AccountError::EmailAlreadyExists(email.as_str().to_string());
            }
        }
        AccountError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, last_login_at, is_premium, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.last_login_at)
        .bind(account.is_premium)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &account.email))?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE email = $1", SELECT_ACCOUNT))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountError> {
        let rows: Vec<AccountRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at DESC", SELECT_ACCOUNT))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        self.hydrate_all(rows).await
    }

    async fn update(&self, account: Account) -> Result<Account, AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2, password_hash = $3, last_login_at = $4, is_premium = $5, role = $6
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.last_login_at)
        .bind(account.is_premium)
        .bind(account.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &account.email))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(account.id.to_string()));
        }

        Ok(account)
    }

    async fn append_documents(
        &self,
        id: &AccountId,
        documents: &[Document],
    ) -> Result<(), AccountError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        // Inserted one by one inside the transaction so seq assignment
        // matches the slice order
        for document in documents {
            sqlx::query(
                r#"
                INSERT INTO account_documents (account_id, name, storage_reference, uploaded_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id.0)
            .bind(&document.name)
            .bind(&document.storage_reference)
            .bind(document.uploaded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Account>, AccountError> {
        // Accounts that never logged in count from creation time
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            r#"
            {}
            WHERE (last_login_at IS NOT NULL AND last_login_at < $1)
               OR (last_login_at IS NULL AND created_at < $1)
            "#,
            SELECT_ACCOUNT
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        self.hydrate_all(rows).await
    }

    async fn delete_by_ids(&self, ids: &[AccountId]) -> Result<u64, AccountError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();

        // account_documents rows go with the account via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM accounts WHERE id = ANY($1)")
            .bind(&uuids)
            .execute(&self.pool)
            .await
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
