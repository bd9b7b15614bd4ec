//! Circle markers drawn onto uploaded images.
//!
//! Re-encodes in the format implied by the file extension so a marked
//! `photo.jpg` is still a JPEG. Unknown extensions fall back to PNG.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Marker appearance. Defaults to a red ring, radius 20, 3 px stroke.
#[derive(Debug, Clone, Copy)]
pub struct MarkStyle {
    pub radius: u32,
    pub stroke: u32,
    pub color: Rgba<u8>,
}

impl Default for MarkStyle {
    fn default() -> Self {
        Self {
            radius: 20,
            stroke: 3,
            color: Rgba([255, 0, 0, 255]),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MarkError {
    #[error("Cannot decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Cannot encode marked image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Paint a ring centred at (cx, cy). Parts outside the image are clipped.
pub fn draw_circle_outline(img: &mut RgbaImage, cx: i64, cy: i64, style: &MarkStyle) {
    let r = i64::from(style.radius);
    let outer = style.radius as f64 + 0.5;
    let inner = style.radius as f64 - style.stroke as f64 + 0.5;

    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    // Coordinates come straight from requests; saturate instead of overflowing
    let x0 = cx.saturating_sub(r).max(0);
    let x1 = cx.saturating_add(r).min(w - 1);
    let y0 = cy.saturating_sub(r).max(0);
    let y1 = cy.saturating_add(r).min(h - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            let d = (dx * dx + dy * dy).sqrt();
            if d <= outer && d > inner {
                img.put_pixel(x as u32, y as u32, style.color);
            }
        }
    }
}

/// Output format for a file name; PNG when the extension is unknown or
/// this build cannot encode it.
pub fn format_for(filename: &str) -> ImageFormat {
    ImageFormat::from_path(filename)
        .ok()
        .filter(|format| format.writing_enabled())
        .unwrap_or(ImageFormat::Png)
}

/// Decode, draw one marker, re-encode.
pub fn mark_image(
    bytes: &[u8],
    filename: &str,
    x: i64,
    y: i64,
    style: &MarkStyle,
) -> Result<Vec<u8>, MarkError> {
    let decoded = image::load_from_memory(bytes).map_err(MarkError::Decode)?;
    let mut canvas = decoded.to_rgba8();
    draw_circle_outline(&mut canvas, x, y, style);

    let format = format_for(filename);
    // JPEG has no alpha channel
    let output = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()),
        _ => DynamicImage::ImageRgba8(canvas),
    };

    let mut buf = Cursor::new(Vec::new());
    output.write_to(&mut buf, format).map_err(MarkError::Encode)?;

    tracing::debug!(filename, x, y, ?format, "Marker drawn");
    Ok(buf.into_inner())
}
