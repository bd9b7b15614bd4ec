//! Image backend: the service that reports image info and stores marked
//! images, and the client the front-end uses to reach it.

pub mod client;
pub mod image_index;
pub mod service;
pub mod store;
pub mod types;

pub use client::{BackendError, ImageBackendClient};
pub use service::{image_service_router, BackendContext};
pub use store::MarkedImageStore;
pub use types::{
    ImageInfo, ImageRecord, InitResponse, MarkResult, MarkedImageList, MessageResponse, NewImage,
};
