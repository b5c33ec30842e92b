use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::ports::AccountServicePort;
use crate::account::service::ReapOutcome;
use crate::inbound::http::router::AppState;

pub async fn reap_inactive(
    State(state): State<AppState>,
) -> Result<ApiSuccess<ReapInactiveResponseData>, ApiError> {
    state
        .account_service
        .reap_inactive()
        .await
        .map_err(ApiError::from)
        .map(|outcome| ApiSuccess::new(StatusCode::OK, ReapInactiveResponseData::from(&outcome)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReapInactiveResponseData {
    pub message: String,
    pub removed: usize,
    pub notified: usize,
}

impl From<&ReapOutcome> for ReapInactiveResponseData {
    fn from(outcome: &ReapOutcome) -> Self {
        Self {
            message: "Usuarios inactivos eliminados exitosamente".to_string(),
            removed: outcome.reaped.len(),
            notified: outcome.notified,
        }
    }
}
