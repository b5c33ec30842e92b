use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiMessageData;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::AccountId;
use crate::account::models::Role;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateRoleRequestBody>,
) -> Result<ApiSuccess<ApiMessageData>, ApiError> {
    let account_id = AccountId::from_string(&user_id).map_err(AccountError::from)?;
    let role = body.role.parse::<Role>().map_err(AccountError::from)?;

    state
        .account_service
        .update_role(&account_id, role)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ApiMessageData::new("Rol de usuario actualizado exitosamente"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateRoleRequestBody {
    role: String,
}
