//! Image-info and marking endpoints, forwarded to the image backend.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::backend::{ImageInfo, MarkResult};
use crate::uploads::{is_jpeg_or_png, MultipartFields, UploadedFile};

/// Coordinate used when the form leaves x or y blank.
pub const DEFAULT_MARK_COORDINATE: i64 = 150;

/// `POST /api/imageinfo`: field `ImageInfo`, JPEG or PNG only.
pub async fn image_info(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<ImageInfo>, ApiError> {
    let mut fields = MultipartFields::collect(multipart)
        .await
        .map_err(ApiError::BadRequest)?;
    let upload = image_upload(&mut fields, "ImageInfo")?;

    let info = ctx.backend.image_info(&upload.filename, upload.bytes).await?;
    Ok(Json(info))
}

/// `POST /api/markimage`: fields `image`, `x`, `y`.
pub async fn mark_image(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<MarkResult>, ApiError> {
    let mut fields = MultipartFields::collect(multipart)
        .await
        .map_err(ApiError::BadRequest)?;
    let x = coordinate_or_default(fields.text("x"))?;
    let y = coordinate_or_default(fields.text("y"))?;
    let upload = image_upload(&mut fields, "image")?;

    let result = ctx
        .backend
        .mark_image(&upload.filename, upload.bytes, x, y)
        .await?;
    tracing::info!(file = %result.filename, x, y, "Mark requested");
    Ok(Json(result))
}

fn image_upload(fields: &mut MultipartFields, name: &str) -> Result<UploadedFile, ApiError> {
    let upload = fields
        .take_file(name)
        .ok_or_else(|| ApiError::BadRequest("Please select an image first.".into()))?;
    if !is_jpeg_or_png(&upload.bytes) {
        return Err(ApiError::UnsupportedMedia(
            "Only JPEG and PNG images are allowed.".into(),
        ));
    }
    Ok(upload)
}

/// Blank or missing → [`DEFAULT_MARK_COORDINATE`]; anything else must parse.
pub fn coordinate_or_default(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_MARK_COORDINATE),
        Some(value) => value.parse::<i64>().map_err(|_| {
            ApiError::BadRequest("Please enter valid numeric values for coordinates.".into())
        }),
    }
}
