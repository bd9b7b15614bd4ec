//! On-disk store for marked images. One flat directory; names are plain
//! file names, never paths.

use std::io;
use std::path::{Path, PathBuf};

use crate::uploads::has_image_extension;

#[derive(Debug, Clone)]
pub struct MarkedImageStore {
    dir: PathBuf,
}

impl MarkedImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a stored name, or `None` if the name could escape the directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
            || name.contains("..")
        {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Write (or overwrite) an image.
    pub async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.resolve(name).ok_or_else(|| invalid_name(name))?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), size = bytes.len(), "Marked image stored");
        Ok(path)
    }

    /// Stored image names, sorted. A missing directory lists as empty.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if has_image_extension(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a stored image. `Ok(None)` when absent or the name is invalid.
    pub async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove a stored image. `Ok(false)` when there was nothing to remove.
    pub async fn delete(&self, name: &str) -> io::Result<bool> {
        let Some(path) = self.resolve(name) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Marked image deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn invalid_name(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid image name: {name:?}"),
    )
}
