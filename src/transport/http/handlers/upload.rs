use crate::app::ServiceError;
use crate::domain::upload::{IncomingFile, StoredObject};
use crate::transport::http::types::{AppState, ErrorBody, UploadForm};
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = StoredObject),
        (status = 400, description = "No file part in the form", body = ErrorBody),
        (status = 500, description = "Object storage rejected the upload", body = ErrorBody)
    )
)]
pub async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    let (file, bucket) = match read_form(multipart).await {
        Ok(parts) => parts,
        Err(e) => return e.into_response(),
    };

    match state.uploads.upload(file, bucket.as_deref()).await {
        Ok(stored) => Json(stored).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Pulls the `file` and `bucket` parts out of the form; other parts are ignored.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(Option<IncomingFile>, Option<String>), ServiceError> {
    let mut file = None;
    let mut bucket = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("Malformed multipart body: {}", e.body_text())))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ServiceError::validation(format!("Failed to read file part: {}", e.body_text()))
                })?;
                debug!(?original_name, size = bytes.len(), "Received file part");
                file = Some(IncomingFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            Some("bucket") => {
                let value = field.text().await.map_err(|e| {
                    ServiceError::validation(format!("Failed to read bucket part: {}", e.body_text()))
                })?;
                bucket = Some(value);
            }
            _ => {}
        }
    }

    Ok((file, bucket))
}
