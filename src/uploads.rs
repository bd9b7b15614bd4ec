//! Upload helpers shared by both servers: multipart field collection,
//! magic-byte MIME sniffing and filename sanitisation.

use std::path::Path;

use axum::extract::Multipart;

/// File extensions listed and served as marked images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// A file part pulled out of a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// All fields of a multipart request, files and text kept apart.
#[derive(Debug, Default)]
pub struct MultipartFields {
    files: Vec<(String, UploadedFile)>,
    texts: Vec<(String, String)>,
}

impl MultipartFields {
    /// Drain a multipart body. A field with a filename is a file, anything
    /// else is read as text.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, String> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| format!("Malformed multipart body: {e}"))?
        {
            let name = field.name().unwrap_or("").to_string();
            let filename = field.file_name().map(str::to_string);
            match filename {
                Some(filename) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| format!("Failed to read field '{name}': {e}"))?;
                    fields.files.push((
                        name,
                        UploadedFile {
                            filename,
                            bytes: bytes.to_vec(),
                        },
                    ));
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| format!("Failed to read field '{name}': {e}"))?;
                    fields.texts.push((name, text));
                }
            }
        }

        Ok(fields)
    }

    /// Take the first file part with the given field name.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let pos = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(pos).1)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Detect MIME type from file magic bytes (not extension or Content-Type header).
pub fn detect_mime_from_bytes(bytes: &[u8]) -> &'static str {
    if bytes.len() < 4 {
        return "application/octet-stream";
    }

    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    // PNG: 89 50 4E 47
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return "image/png";
    }
    if bytes.starts_with(b"GIF8") {
        return "image/gif";
    }
    if bytes.starts_with(b"BM") {
        return "image/bmp";
    }
    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return "image/webp";
    }

    "application/octet-stream"
}

/// JPEG and PNG are the formats the image-info form accepts.
pub fn is_jpeg_or_png(bytes: &[u8]) -> bool {
    matches!(detect_mime_from_bytes(bytes), "image/jpeg" | "image/png")
}

/// Sanitize a filename: removes path traversal and special characters.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|&c| c != '/' && c != '\\' && c != '\0')
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Remove consecutive dots (path traversal prevention)
    let sanitized = sanitized.replace("..", "");

    let sanitized: String = sanitized.chars().take(100).collect();

    if sanitized.is_empty() || sanitized == "." {
        "image".into()
    } else {
        sanitized
    }
}

/// `photo.png` → `photo_marked.png`. Extension is kept verbatim.
///
/// A dot-file such as `.png` has no stem of its own and becomes
/// `image_marked.png`.
pub fn marked_file_name(original: &str) -> String {
    let mut safe = sanitize_filename(original);
    if safe.starts_with('.') {
        safe.insert_str(0, "image");
    }
    let path = Path::new(&safe);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_marked.{ext}"),
        None => format!("{stem}_marked"),
    }
}

/// Case-insensitive check against [`IMAGE_EXTENSIONS`].
pub fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
