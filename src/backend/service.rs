//! Image backend HTTP service.
//!
//! - `GET    /`                     : service landing page
//! - `GET    /health`               : liveness
//! - `POST   /getimageinfo/`        : file name and pixel dimensions of an upload
//! - `POST   /putmarkonimage/`      : draw a ring at (x, y), store the result
//! - `GET    /images`               : public URLs of stored marked images
//! - `DELETE /images/:image_name`   : remove a stored marked image
//! - `GET    /marked_images/:file`  : serve a stored marked image
//! - `/db/...`                      : image index, see [`super::image_index`]
//!
//! The front-end's origin is allowed through CORS so the pages can call the
//! service directly from the browser as well as through the `/api` proxy.

use std::io::Cursor;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use super::image_index::image_index_routes;
use super::store::MarkedImageStore;
use super::types::{ImageInfo, MarkResult, MarkedImageList, MessageResponse};
use crate::api::endpoints::health;
use crate::api::error::ApiError;
use crate::config::{self, ServiceConfig};
use crate::db::{DatabaseError, ImageIndex};
use crate::marking::{mark_image, MarkStyle};
use crate::uploads::{marked_file_name, sanitize_filename, MultipartFields, UploadedFile};

/// Shared state of the image backend routes.
#[derive(Clone)]
pub struct BackendContext {
    pub store: MarkedImageStore,
    pub index: ImageIndex,
    /// Prefix for links handed back to clients, without trailing slash.
    pub public_base_url: String,
    pub style: MarkStyle,
    pub body_limit_bytes: usize,
    pub allowed_origin: String,
}

impl BackendContext {
    /// Opens (or creates) the image index database.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, DatabaseError> {
        Ok(Self {
            store: MarkedImageStore::new(config.marked_dir.clone()),
            index: ImageIndex::open(&config.db_path)?,
            public_base_url: config.public_base_url.clone(),
            style: MarkStyle::default(),
            body_limit_bytes: config.body_limit_bytes,
            allowed_origin: config.allowed_origin.clone(),
        })
    }

    fn image_url(&self, name: &str) -> String {
        format!("{}/marked_images/{}", self.public_base_url, name)
    }
}

/// Build the image backend router.
pub fn image_service_router(ctx: BackendContext) -> Router {
    let body_limit = ctx.body_limit_bytes;
    let cors = cors_layer(&ctx.allowed_origin);

    let router = Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health::check))
        .route("/getimageinfo/", post(get_image_info))
        .route("/getimageinfo", post(get_image_info))
        .route("/putmarkonimage/", post(put_mark_on_image))
        .route("/putmarkonimage", post(put_mark_on_image))
        .route("/images", get(list_marked_images))
        .route("/images/:image_name", delete(delete_marked_image))
        .route("/marked_images/:file", get(serve_marked_image))
        .merge(image_index_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ctx);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    match HeaderValue::from_str(origin) {
        Ok(value) => Some(
            CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        Err(e) => {
            tracing::warn!(origin, error = %e, "Invalid CORS origin, CORS disabled");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════

async fn landing_page() -> Html<String> {
    Html(format!(
        "<html>\n  <head><title>{name} image API</title></head>\n  <body>\n    \
         <h3>{name} image API</h3>\n    <p>Version: {version}</p>\n    \
         <a href=\"/images\">Marked images</a>\n  </body>\n</html>\n",
        name = config::APP_NAME,
        version = config::APP_VERSION,
    ))
}

/// `POST /getimageinfo/`: field `ImageInfo`.
async fn get_image_info(multipart: Multipart) -> Result<Json<ImageInfo>, ApiError> {
    let mut fields = MultipartFields::collect(multipart)
        .await
        .map_err(ApiError::BadRequest)?;
    // Reported back as uploaded; only stored names are sanitised
    let upload = fields
        .take_file("ImageInfo")
        .ok_or_else(|| ApiError::BadRequest("Missing file field 'ImageInfo'".into()))?;

    let (width, height) = read_dimensions(&upload.bytes)?;
    tracing::info!(filename = %upload.filename, width, height, "Image info requested");

    Ok(Json(ImageInfo {
        filename: upload.filename,
        width,
        height,
    }))
}

/// `POST /putmarkonimage/`: fields `image`, `x`, `y`.
async fn put_mark_on_image(
    State(ctx): State<BackendContext>,
    multipart: Multipart,
) -> Result<Json<MarkResult>, ApiError> {
    let mut fields = MultipartFields::collect(multipart)
        .await
        .map_err(ApiError::BadRequest)?;
    let x = require_coordinate(&fields, "x")?;
    let y = require_coordinate(&fields, "y")?;
    let upload = require_file(&mut fields, "image")?;

    let output_name = marked_file_name(&upload.filename);
    let style = ctx.style;
    let name_for_encoder = output_name.clone();
    let marked = tokio::task::spawn_blocking(move || {
        mark_image(&upload.bytes, &name_for_encoder, x, y, &style)
    })
    .await??;

    ctx.store.save(&output_name, &marked).await?;
    tracing::info!(file = %output_name, x, y, "Image marked");

    Ok(Json(MarkResult {
        url: ctx.image_url(&output_name),
        filename: output_name,
        message: "Image marked and saved successfully.".into(),
    }))
}

/// `GET /images`
async fn list_marked_images(
    State(ctx): State<BackendContext>,
) -> Result<Json<MarkedImageList>, ApiError> {
    let images = ctx
        .store
        .list()
        .await?
        .iter()
        .map(|name| ctx.image_url(name))
        .collect();
    Ok(Json(MarkedImageList { images }))
}

/// `DELETE /images/:image_name`
async fn delete_marked_image(
    State(ctx): State<BackendContext>,
    Path(image_name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if ctx.store.delete(&image_name).await? {
        Ok(Json(MessageResponse::new(format!(
            "Image {image_name} deleted successfully"
        ))))
    } else {
        Err(ApiError::NotFound("Image not found".into()))
    }
}

/// `GET /marked_images/:file`
async fn serve_marked_image(
    State(ctx): State<BackendContext>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = ctx
        .store
        .read(&file)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image not found".into()))?;

    let mime = mime_guess::from_path(&file)
        .first_or_octet_stream()
        .to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        bytes,
    )
        .into_response())
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

fn require_file(fields: &mut MultipartFields, name: &str) -> Result<UploadedFile, ApiError> {
    let mut upload = fields
        .take_file(name)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing file field '{name}'")))?;
    upload.filename = sanitize_filename(&upload.filename);
    Ok(upload)
}

fn require_coordinate(fields: &MultipartFields, name: &str) -> Result<i64, ApiError> {
    let raw = fields
        .text(name)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing field '{name}'")))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Field '{name}' must be an integer")))
}

fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), ApiError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::DecodeFailure(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ApiError::DecodeFailure(format!("Cannot read image: {e}")))
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{multipart_request, png_bytes, read_json, MultipartPart};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_ctx() -> (BackendContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = BackendContext {
            store: MarkedImageStore::new(tmp.path().join("marked")),
            index: ImageIndex::open_in_memory().unwrap(),
            public_base_url: "http://img.test".into(),
            style: MarkStyle::default(),
            body_limit_bytes: 5 * 1024 * 1024,
            allowed_origin: "http://localhost:3000".into(),
        };
        (ctx, tmp)
    }

    #[tokio::test]
    async fn image_info_reports_dimensions() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/getimageinfo/",
            &[MultipartPart::file("ImageInfo", "cat.png", png_bytes(40, 30, [1, 2, 3, 255]))],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let info: ImageInfo = read_json(response).await;
        assert_eq!(
            info,
            ImageInfo {
                filename: "cat.png".into(),
                width: 40,
                height: 30
            }
        );
    }

    #[tokio::test]
    async fn image_info_keeps_uploaded_filename() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/getimageinfo/",
            &[MultipartPart::file(
                "ImageInfo",
                "my photo (1).png",
                png_bytes(3, 2, [9, 9, 9, 255]),
            )],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let info: ImageInfo = read_json(response).await;
        assert_eq!(info.filename, "my photo (1).png");
        assert_eq!((info.width, info.height), (3, 2));
    }

    #[tokio::test]
    async fn mark_accepts_extreme_coordinate() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/putmarkonimage/",
            &[
                MultipartPart::file("image", "tiny.png", png_bytes(8, 8, [0, 0, 0, 255])),
                MultipartPart::text("x", "9223372036854775807"),
                MultipartPart::text("y", "4"),
            ],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let result: MarkResult = read_json(response).await;
        assert_eq!(result.filename, "tiny_marked.png");
    }

    #[tokio::test]
    async fn image_info_rejects_non_image() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/getimageinfo/",
            &[MultipartPart::file("ImageInfo", "x.png", b"not an image".to_vec())],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn image_info_requires_field() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request("/getimageinfo/", &[MultipartPart::text("other", "1")]);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mark_stores_and_lists_image() {
        let (ctx, _tmp) = test_ctx();
        let store = ctx.store.clone();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/putmarkonimage/",
            &[
                MultipartPart::file("image", "shot.png", png_bytes(80, 80, [255, 255, 255, 255])),
                MultipartPart::text("x", "40"),
                MultipartPart::text("y", "40"),
            ],
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let result: MarkResult = read_json(response).await;
        assert_eq!(result.filename, "shot_marked.png");
        assert_eq!(result.url, "http://img.test/marked_images/shot_marked.png");

        let stored = store.read("shot_marked.png").await.unwrap().unwrap();
        let decoded = image::load_from_memory(&stored).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(60, 40).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(40, 40).0, [255, 255, 255, 255]);

        let req = Request::builder()
            .uri("/images")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let list: MarkedImageList = read_json(response).await;
        assert_eq!(
            list.images,
            vec!["http://img.test/marked_images/shot_marked.png".to_string()]
        );
    }

    #[tokio::test]
    async fn mark_rejects_non_numeric_coordinate() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = multipart_request(
            "/putmarkonimage/",
            &[
                MultipartPart::file("image", "shot.png", png_bytes(8, 8, [0, 0, 0, 255])),
                MultipartPart::text("x", "left"),
                MultipartPart::text("y", "4"),
            ],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_missing_image_is_404() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = Request::builder()
            .method("DELETE")
            .uri("/images/ghost.png")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = read_json(response).await;
        assert_eq!(json["error"]["message"], "Image not found");
    }

    #[tokio::test]
    async fn delete_existing_image() {
        let (ctx, _tmp) = test_ctx();
        ctx.store.save("old_marked.png", b"x").await.unwrap();
        let store = ctx.store.clone();
        let app = image_service_router(ctx);

        let req = Request::builder()
            .method("DELETE")
            .uri("/images/old_marked.png")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let msg: MessageResponse = read_json(response).await;
        assert_eq!(msg.message, "Image old_marked.png deleted successfully");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn serves_stored_image_with_mime() {
        let (ctx, _tmp) = test_ctx();
        ctx.store.save("a_marked.png", b"pngdata").await.unwrap();
        let app = image_service_router(ctx);

        let req = Request::builder()
            .uri("/marked_images/a_marked.png")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"pngdata");

        let req = Request::builder()
            .uri("/marked_images/..%2Fsecret.png")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_allows_frontend_origin() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = Request::builder()
            .uri("/images")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn landing_page_names_service() {
        let (ctx, _tmp) = test_ctx();
        let app = image_service_router(ctx);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(config::APP_VERSION));
    }
}
