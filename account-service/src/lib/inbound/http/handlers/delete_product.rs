use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiMessageData;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::product::models::ProductId;
use crate::product::ports::ProductServicePort;

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<ApiSuccess<ApiMessageData>, ApiError> {
    let product_id = ProductId::from_string(&product_id)?;

    state
        .product_service
        .delete_product(&product_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ApiMessageData::new("Producto eliminado exitosamente"),
    ))
}
