use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiMessageData;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::AccountId;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn upgrade_premium(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<ApiSuccess<ApiMessageData>, ApiError> {
    let account_id = AccountId::from_string(&uid).map_err(AccountError::from)?;

    state
        .account_service
        .upgrade_to_premium(&account_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ApiMessageData::new("Usuario actualizado a premium exitosamente"),
    ))
}
