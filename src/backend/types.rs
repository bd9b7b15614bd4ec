//! Wire types of the image backend, shared by the service and its client.

use serde::{Deserialize, Serialize};

/// `POST /getimageinfo/` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// `POST /putmarkonimage/` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkResult {
    pub filename: String,
    pub message: String,
    pub url: String,
}

/// `GET /images` response: public URLs of stored marked images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedImageList {
    pub images: Vec<String>,
}

/// Plain `{ "message": ... }` acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One row of the image index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub filename: String,
}

/// Body of `POST /db/images` and `PUT /db/images/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub filename: String,
}

/// `POST /db/images/init` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    pub message: String,
    pub added_images: Vec<ImageRecord>,
}
