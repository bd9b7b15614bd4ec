//! Marked-image gallery endpoints, forwarded to the image backend.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::backend::{MarkedImageList, MessageResponse};

/// `GET /api/marked_images`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<MarkedImageList>, ApiError> {
    Ok(Json(ctx.backend.list_marked_images().await?))
}

/// `DELETE /api/marked_images/:name`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = ctx.backend.delete_marked_image(&name).await?;
    tracing::info!(name = %name, "Marked image removed");
    Ok(Json(response))
}
