//! Image difference endpoint.
//!
//! `POST /api/findimgdiff`: multipart fields `original` and `modified`.
//! Decoding and the pixel scan run on the blocking pool; each request is
//! independent.

use axum::extract::Multipart;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::compare::{compare, Coordinate};
use crate::uploads::MultipartFields;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub original_file_name: String,
    pub modified_file_name: String,
    /// `[x, y]` pairs in row-major scan order.
    pub differences: Vec<Coordinate>,
}

/// `POST /api/findimgdiff`
pub async fn find_image_diff(multipart: Multipart) -> Result<Json<DiffResponse>, ApiError> {
    let mut fields = MultipartFields::collect(multipart)
        .await
        .map_err(ApiError::BadRequest)?;

    let (original, modified) = match (fields.take_file("original"), fields.take_file("modified")) {
        (Some(original), Some(modified)) => (original, modified),
        _ => {
            return Err(ApiError::BadRequest(
                "Both original and modified images are required".into(),
            ))
        }
    };

    let (original_bytes, modified_bytes) = (original.bytes, modified.bytes);
    let differences =
        tokio::task::spawn_blocking(move || compare(&original_bytes, &modified_bytes)).await??;

    tracing::info!(
        original = %original.filename,
        modified = %modified.filename,
        differences = differences.len(),
        "Image comparison completed"
    );

    Ok(Json(DiffResponse {
        original_file_name: original.filename,
        modified_file_name: modified.filename,
        differences,
    }))
}
