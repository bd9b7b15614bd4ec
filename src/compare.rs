//! Pixel-level image difference.
//!
//! Decodes two encoded images to RGBA (opaque alpha synthesised when the
//! source has none) and reports every coordinate whose packed RGBA value
//! differs, in row-major scan order. Pure and synchronous; callers on an
//! async runtime should run it on the blocking pool.

use std::fmt;

use image::RgbaImage;
use serde::Serialize;

/// Which of the two inputs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Original,
    Modified,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error(
        "Images must have the same dimensions (original {original_width}x{original_height}, \
         modified {modified_width}x{modified_height})"
    )]
    DimensionMismatch {
        original_width: u32,
        original_height: u32,
        modified_width: u32,
        modified_height: u32,
    },
    #[error("Cannot decode {slot} image: {source}")]
    Decode {
        slot: ImageSlot,
        #[source]
        source: image::ImageError,
    },
}

/// A pixel coordinate. Serialises as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Coordinate(pub u32, pub u32);

impl Coordinate {
    pub fn x(&self) -> u32 {
        self.0
    }

    pub fn y(&self) -> u32 {
        self.1
    }
}

/// Decoded image: dimensions plus a row-major RGBA grid.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// Decode any format the `image` crate was built with.
    pub fn decode(bytes: &[u8], slot: ImageSlot) -> Result<Self, CompareError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| CompareError::Decode { slot, source })?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Raw samples, 4 bytes per pixel, row-major.
    pub fn samples(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

/// Pack one RGBA tuple into a comparison key, R in the most significant byte.
#[inline]
pub fn pack_rgba(px: [u8; 4]) -> u32 {
    u32::from_be_bytes(px)
}

/// Decode both payloads and diff them.
pub fn compare(original: &[u8], modified: &[u8]) -> Result<Vec<Coordinate>, CompareError> {
    let original = RasterImage::decode(original, ImageSlot::Original)?;
    let modified = RasterImage::decode(modified, ImageSlot::Modified)?;
    compare_rasters(&original, &modified)
}

/// Diff two already-decoded images.
pub fn compare_rasters(
    original: &RasterImage,
    modified: &RasterImage,
) -> Result<Vec<Coordinate>, CompareError> {
    if original.dimensions() != modified.dimensions() {
        return Err(CompareError::DimensionMismatch {
            original_width: original.width(),
            original_height: original.height(),
            modified_width: modified.width(),
            modified_height: modified.height(),
        });
    }

    let width = original.width();
    let mut differences = Vec::new();

    // ImageBuffer::pixels walks row-major
    let pairs = original.pixels.pixels().zip(modified.pixels.pixels());

    for (index, (a, b)) in pairs.enumerate() {
        if pack_rgba(a.0) != pack_rgba(b.0) {
            let index = index as u32;
            differences.push(Coordinate(index % width, index / width));
        }
    }

    Ok(differences)
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba};
    use std::collections::BTreeSet;
    use std::io::Cursor;

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn solid_png(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        encode(DynamicImage::ImageRgba8(img.clone()), ImageFormat::Png)
    }

    #[test]
    fn identical_images_have_no_differences() {
        let img = solid_png(16, 9, [10, 20, 30, 255]);
        let bytes = png_bytes(&img);
        assert!(compare(&bytes, &bytes).unwrap().is_empty());
    }

    #[test]
    fn red_channel_change_at_one_pixel() {
        let a = solid_png(2, 2, [100, 100, 100, 255]);
        let mut b = a.clone();
        b.put_pixel(1, 0, Rgba([101, 100, 100, 255]));

        let diff = compare(&png_bytes(&a), &png_bytes(&b)).unwrap();
        assert_eq!(diff, vec![Coordinate(1, 0)]);
        assert_eq!(serde_json::to_string(&diff).unwrap(), "[[1,0]]");
    }

    #[test]
    fn reports_known_set_in_scan_order() {
        let a = solid_png(5, 4, [0, 0, 0, 255]);
        let mut b = a.clone();
        // Inserted out of scan order on purpose
        for (x, y) in [(4, 3), (0, 0), (2, 1), (3, 1), (0, 2)] {
            b.put_pixel(x, y, Rgba([0, 0, 0, 254]));
        }

        let diff = compare(&png_bytes(&a), &png_bytes(&b)).unwrap();
        assert_eq!(
            diff,
            vec![
                Coordinate(0, 0),
                Coordinate(2, 1),
                Coordinate(3, 1),
                Coordinate(0, 2),
                Coordinate(4, 3),
            ]
        );
    }

    #[test]
    fn every_channel_is_significant() {
        let a = solid_png(4, 1, [50, 50, 50, 200]);
        let mut b = a.clone();
        b.put_pixel(0, 0, Rgba([51, 50, 50, 200]));
        b.put_pixel(1, 0, Rgba([50, 51, 50, 200]));
        b.put_pixel(2, 0, Rgba([50, 50, 51, 200]));
        b.put_pixel(3, 0, Rgba([50, 50, 50, 201]));

        let diff = compare(&png_bytes(&a), &png_bytes(&b)).unwrap();
        assert_eq!(diff.len(), 4);
    }

    #[test]
    fn transposed_dimensions_are_rejected() {
        let a = png_bytes(&solid_png(3, 2, [0, 0, 0, 255]));
        let b = png_bytes(&solid_png(2, 3, [0, 0, 0, 255]));

        match compare(&a, &b) {
            Err(CompareError::DimensionMismatch {
                original_width,
                original_height,
                modified_width,
                modified_height,
            }) => {
                assert_eq!((original_width, original_height), (3, 2));
                assert_eq!((modified_width, modified_height), (2, 3));
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_payload_names_its_slot() {
        let good = png_bytes(&solid_png(2, 2, [0, 0, 0, 255]));
        let err = compare(&good, b"definitely not an image").unwrap_err();
        assert!(matches!(
            err,
            CompareError::Decode {
                slot: ImageSlot::Modified,
                ..
            }
        ));

        let err = compare(&[], &good).unwrap_err();
        assert!(matches!(
            err,
            CompareError::Decode {
                slot: ImageSlot::Original,
                ..
            }
        ));
    }

    #[test]
    fn rgb_source_gets_opaque_alpha() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([7, 8, 9]));
        let rgb_bytes = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Png);
        let rgba_bytes = png_bytes(&solid_png(3, 3, [7, 8, 9, 255]));

        let raster = RasterImage::decode(&rgb_bytes, ImageSlot::Original).unwrap();
        assert_eq!(&raster.samples()[..4], &[7, 8, 9, 255]);
        assert!(compare(&rgb_bytes, &rgba_bytes).unwrap().is_empty());
    }

    #[test]
    fn comparison_is_order_stable() {
        let a = solid_png(8, 8, [1, 2, 3, 255]);
        let mut b = a.clone();
        b.put_pixel(7, 0, Rgba([0, 0, 0, 255]));
        b.put_pixel(0, 7, Rgba([0, 0, 0, 255]));
        let (a, b) = (png_bytes(&a), png_bytes(&b));

        let first = compare(&a, &b).unwrap();
        let second = compare(&a, &b).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn detection_is_symmetric() {
        let a = solid_png(6, 5, [200, 10, 10, 255]);
        let mut b = a.clone();
        for (x, y) in [(1, 1), (5, 4), (3, 0)] {
            b.put_pixel(x, y, Rgba([10, 200, 10, 128]));
        }
        let (a, b) = (png_bytes(&a), png_bytes(&b));

        let forward: BTreeSet<_> = compare(&a, &b).unwrap().into_iter().collect();
        let backward: BTreeSet<_> = compare(&b, &a).unwrap().into_iter().collect();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn compares_across_formats() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let bmp = encode(DynamicImage::ImageRgb8(rgb.clone()), ImageFormat::Bmp);
        let png = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Png);
        assert!(compare(&bmp, &png).unwrap().is_empty());
    }

    #[test]
    fn pack_rgba_puts_red_first() {
        assert_eq!(pack_rgba([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(pack_rgba([0xFF, 0, 0, 0]), 0xFF00_0000);
    }
}
