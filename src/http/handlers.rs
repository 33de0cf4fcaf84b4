use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::catalog::{CatalogError, UploadForm};
use crate::database::repo::Item;
use crate::http::error::ApiError;
use crate::http::form::read_upload_form;
use crate::http::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    message: &'static str,
    filename: String,
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    // A body that is not multipart carries no image part.
    let form = match multipart {
        Ok(multipart) => read_upload_form(multipart).await?,
        Err(rejection) => {
            debug!("Upload body is not multipart: {}", rejection);
            UploadForm::default()
        }
    };

    let catalog = state.catalog.clone();
    let stored = spawn_blocking(move || catalog.upload(form)).await??;
    debug!(id = stored.id, image_path = %stored.image_path, "Upload recorded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully",
            filename: stored.filename,
        }),
    ))
}

pub(crate) async fn list_items_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let catalog = state.catalog.clone();
    let items = spawn_blocking(move || catalog.list_items()).await??;
    Ok(Json(items))
}

pub(crate) async fn get_item_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let id: i64 = raw_id.parse().map_err(|_| CatalogError::NotFound)?;
    let catalog = state.catalog.clone();
    let item = spawn_blocking(move || catalog.get_item(id)).await??;
    Ok(Json(item))
}
