//! Front-end HTTP layer.
//!
//! Serves the HTML pages and the JSON endpoints they call. Image info and
//! marking are forwarded to the image backend; comparison runs in-process.
//!
//! The router is composable. `frontend_router()` returns a `Router` that
//! can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::frontend_router;
pub use server::{start_server_on, HttpServer, ServerSession};
pub use types::ApiContext;
