//! Image index routes, mounted under `/db` on the image backend.
//!
//! - `POST   /db/images/init` (alias `POST /db/populate`): index new files
//!   from the marked-image directory
//! - `GET    /db/images`
//! - `POST   /db/images`       body `{ "filename": .. }`
//! - `GET    /db/images/:id`
//! - `PUT    /db/images/:id`   body `{ "filename": .. }`
//! - `DELETE /db/images/:id`   returns the removed row

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::service::BackendContext;
use super::types::{ImageRecord, InitResponse, NewImage};
use crate::api::error::ApiError;
use crate::db::DatabaseError;

pub fn image_index_routes() -> Router<BackendContext> {
    Router::new()
        .route("/db/images/init", post(populate))
        .route("/db/populate", post(populate))
        .route("/db/images", get(list).post(create))
        .route(
            "/db/images/:id",
            get(fetch).put(update).delete(remove),
        )
}

/// Run an index operation on the blocking pool.
async fn blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, DatabaseError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}

fn checked_filename(ctx: &BackendContext, body: NewImage) -> Result<String, ApiError> {
    let filename = body.filename.trim().to_string();
    if ctx.store.resolve(&filename).is_none() {
        return Err(ApiError::BadRequest(format!("Invalid filename: {filename:?}")));
    }
    Ok(filename)
}

async fn populate(State(ctx): State<BackendContext>) -> Result<Json<InitResponse>, ApiError> {
    let names = ctx.store.list().await?;
    let index = ctx.index.clone();
    let outcome = blocking(move || index.populate(&names)).await?;

    Ok(Json(InitResponse {
        message: outcome.message(),
        added_images: outcome.added,
    }))
}

async fn list(State(ctx): State<BackendContext>) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let index = ctx.index.clone();
    Ok(Json(blocking(move || index.list()).await?))
}

async fn fetch(
    State(ctx): State<BackendContext>,
    Path(id): Path<i64>,
) -> Result<Json<ImageRecord>, ApiError> {
    let index = ctx.index.clone();
    Ok(Json(blocking(move || index.get(id)).await?))
}

async fn create(
    State(ctx): State<BackendContext>,
    Json(body): Json<NewImage>,
) -> Result<Json<ImageRecord>, ApiError> {
    let filename = checked_filename(&ctx, body)?;
    let index = ctx.index.clone();
    Ok(Json(blocking(move || index.create(&filename)).await?))
}

async fn update(
    State(ctx): State<BackendContext>,
    Path(id): Path<i64>,
    Json(body): Json<NewImage>,
) -> Result<Json<ImageRecord>, ApiError> {
    let filename = checked_filename(&ctx, body)?;
    let index = ctx.index.clone();
    Ok(Json(blocking(move || index.update(id, &filename)).await?))
}

async fn remove(
    State(ctx): State<BackendContext>,
    Path(id): Path<i64>,
) -> Result<Json<ImageRecord>, ApiError> {
    let index = ctx.index.clone();
    Ok(Json(blocking(move || index.delete(id)).await?))
}
