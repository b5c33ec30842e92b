use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiMessageData;
use super::ApiSuccess;
use crate::account::errors::AccountError;
use crate::account::models::AccountId;
use crate::account::models::UploadedFile;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

/// Multipart fields without a filename are skipped; fields without a name
/// land in the generic document category.
pub async fn upload_documents(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<ApiMessageData>, ApiError> {
    let account_id = AccountId::from_string(&uid).map_err(AccountError::from)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or("documents").to_string();
        let Some(original_filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
            .to_vec();

        files.push(UploadedFile {
            field_name,
            original_filename,
            bytes,
        });
    }

    state
        .account_service
        .upload_documents(&account_id, files)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ApiMessageData::new("Documentos subidos exitosamente"),
    ))
}
