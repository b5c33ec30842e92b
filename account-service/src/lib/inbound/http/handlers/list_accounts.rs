use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::Account;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<AccountSummaryData>>, ApiError> {
    state
        .account_service
        .list_accounts()
        .await
        .map_err(ApiError::from)
        .map(|accounts| {
            let summaries = accounts.iter().map(AccountSummaryData::from).collect();
            ApiSuccess::new(StatusCode::OK, summaries)
        })
}

/// Public projection of an account: no credentials, no documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummaryData {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl From<&Account> for AccountSummaryData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.to_string(),
        }
    }
}
