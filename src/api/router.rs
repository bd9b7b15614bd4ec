//! Front-end router.
//!
//! Pages at the root, JSON under `/api/`. Bodies are capped by the
//! configured limit (multipart overhead included).

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the front-end router.
pub fn frontend_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.body_limit_bytes;

    let api = Router::new()
        .route("/findimgdiff", post(endpoints::diff::find_image_diff))
        .route(
            "/batchjob",
            post(endpoints::batch_job::start).delete(endpoints::batch_job::stop),
        )
        .route("/imageinfo", post(endpoints::image_info::image_info))
        .route("/markimage", post(endpoints::image_info::mark_image))
        .route("/marked_images", get(endpoints::marked_images::list))
        .route(
            "/marked_images/:name",
            delete(endpoints::marked_images::remove),
        );

    let pages = Router::new()
        .route("/", get(endpoints::pages::index))
        .route("/findimgdiff", get(endpoints::pages::find_image_diff))
        .route("/imageinfo", get(endpoints::pages::image_info))
        .route("/marked_images", get(endpoints::pages::marked_images))
        .route("/batchjob", get(endpoints::pages::batch_job))
        .route("/health", get(endpoints::health::check));

    Router::new()
        .nest("/api", api)
        .merge(pages)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(ctx)
}
