//! Shared helpers for router tests: in-memory images and hand-built
//! multipart requests.

use std::io::Cursor;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request};
use axum::response::Response;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::de::DeserializeOwned;

const BOUNDARY: &str = "----imgdiff-test-boundary";

pub enum MultipartPart {
    File {
        name: &'static str,
        filename: &'static str,
        bytes: Vec<u8>,
    },
    Text {
        name: &'static str,
        value: &'static str,
    },
}

impl MultipartPart {
    pub fn file(name: &'static str, filename: &'static str, bytes: Vec<u8>) -> Self {
        Self::File {
            name,
            filename,
            bytes,
        }
    }

    pub fn text(name: &'static str, value: &'static str) -> Self {
        Self::Text { name, value }
    }
}

pub fn multipart_body(parts: &[MultipartPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            MultipartPart::File {
                name,
                filename,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            MultipartPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[MultipartPart]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn png_from(img: RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    png_from(RgbaImage::from_pixel(width, height, Rgba(color)))
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}
