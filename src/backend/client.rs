//! HTTP client for the image backend.
//!
//! The front-end never touches image pixels for info or marking; it forwards
//! the upload here and relays the answer.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::types::{ImageInfo, MarkResult, MarkedImageList, MessageResponse};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Image backend unreachable at {0}")]
    Connection(String),
    #[error("Image backend timed out after {0}s")]
    Timeout(u64),
    #[error("Image backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response from image backend: {0}")]
    Decode(String),
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl BackendError {
    /// Human-readable detail from a non-success response body.
    ///
    /// Understands `{"error":{"message":..}}` and `{"detail":..}` bodies and
    /// falls back to the raw text.
    pub fn detail(&self) -> String {
        match self {
            BackendError::Status { body, .. } => {
                let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
                parsed
                    .as_ref()
                    .and_then(|v| {
                        v.pointer("/error/message")
                            .or_else(|| v.get("detail"))
                            .and_then(|m| m.as_str())
                    })
                    .map(str::to_string)
                    .unwrap_or_else(|| body.clone())
            }
            other => other.to_string(),
        }
    }
}

/// Async client for the image backend's REST API.
#[derive(Debug, Clone)]
pub struct ImageBackendClient {
    base_url: Url,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ImageBackendClient {
    /// `base_url` is the backend root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| BackendError::Http(format!("Invalid backend URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `POST /getimageinfo/` with the upload in field `ImageInfo`.
    pub async fn image_info(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageInfo, BackendError> {
        let form = Form::new().part("ImageInfo", file_part(filename, bytes)?);
        let url = self.endpoint(&["getimageinfo", ""])?;
        let response = self.client.post(url).multipart(form).send().await;
        self.read_json(response).await
    }

    /// `POST /putmarkonimage/` with fields `image`, `x`, `y`.
    pub async fn mark_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        x: i64,
        y: i64,
    ) -> Result<MarkResult, BackendError> {
        let form = Form::new()
            .part("image", file_part(filename, bytes)?)
            .text("x", x.to_string())
            .text("y", y.to_string());
        let url = self.endpoint(&["putmarkonimage", ""])?;
        let response = self.client.post(url).multipart(form).send().await;
        self.read_json(response).await
    }

    /// `GET /images`.
    pub async fn list_marked_images(&self) -> Result<MarkedImageList, BackendError> {
        let url = self.endpoint(&["images"])?;
        let response = self.client.get(url).send().await;
        self.read_json(response).await
    }

    /// `DELETE /images/{name}`. The name is sent as a single path segment.
    pub async fn delete_marked_image(&self, name: &str) -> Result<MessageResponse, BackendError> {
        let url = self.endpoint(&["images", name])?;
        let response = self.client.delete(url).send().await;
        self.read_json(response).await
    }

    // ── Internal ────────────────────────────────────────────

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| BackendError::Http("Backend URL cannot be a base".into()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, BackendError> {
        let response = response.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            BackendError::Connection(self.base_url().to_string())
        } else {
            BackendError::Http(e.to_string())
        }
    }
}

fn file_part(filename: &str, bytes: Vec<u8>) -> Result<Part, BackendError> {
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime.as_ref())
        .map_err(|e| BackendError::Http(e.to_string()))
}

/// Whether a backend failure is the backend saying "no such image".
pub fn is_not_found(err: &BackendError) -> bool {
    matches!(err, BackendError::Status { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
}
