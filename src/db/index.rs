//! Shared handle on the image index database.
//!
//! One connection behind a mutex. Every method blocks; async callers go
//! through `spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use super::{repository, sqlite, DatabaseError};
use crate::backend::ImageRecord;

/// Result of syncing the index with the marked-image directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOutcome {
    pub added: Vec<ImageRecord>,
    pub skipped: usize,
    /// The database file already existed when the index was opened.
    pub database_existed: bool,
}

impl PopulateOutcome {
    pub fn message(&self) -> String {
        let mut message = String::from("Initialization complete. ");
        if self.database_existed {
            message.push_str("Database already existed. ");
        }
        message.push_str(&format!(
            "Added {} new images. {} images were skipped (already in the database).",
            self.added.len(),
            self.skipped
        ));
        message
    }
}

#[derive(Clone)]
pub struct ImageIndex {
    conn: Arc<Mutex<Connection>>,
    database_existed: bool,
}

impl ImageIndex {
    /// Open (or create) the index at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let database_existed = path.exists();
        let conn = sqlite::open_database(path)?;
        tracing::info!(
            path = %path.display(),
            existed = database_existed,
            "Image index opened"
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            database_existed,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Arc::new(Mutex::new(sqlite::open_memory_database()?)),
            database_existed: false,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    pub fn list(&self) -> Result<Vec<ImageRecord>, DatabaseError> {
        repository::list_images(&*self.lock()?)
    }

    pub fn get(&self, id: i64) -> Result<ImageRecord, DatabaseError> {
        repository::get_image(&*self.lock()?, id)
    }

    pub fn create(&self, filename: &str) -> Result<ImageRecord, DatabaseError> {
        let record = repository::insert_image(&*self.lock()?, filename)?;
        tracing::info!(id = record.id, filename, "Image indexed");
        Ok(record)
    }

    pub fn update(&self, id: i64, filename: &str) -> Result<ImageRecord, DatabaseError> {
        let record = repository::update_image(&*self.lock()?, id, filename)?;
        tracing::info!(id, filename, "Image index entry renamed");
        Ok(record)
    }

    pub fn delete(&self, id: i64) -> Result<ImageRecord, DatabaseError> {
        let record = repository::delete_image(&*self.lock()?, id)?;
        tracing::info!(id, filename = %record.filename, "Image index entry removed");
        Ok(record)
    }

    /// Index every name in `filenames` that is not indexed yet.
    pub fn populate(&self, filenames: &[String]) -> Result<PopulateOutcome, DatabaseError> {
        let mut conn = self.lock()?;
        let (added, skipped) = repository::insert_missing_images(&mut conn, filenames)?;
        tracing::info!(added = added.len(), skipped, "Image index populated");
        Ok(PopulateOutcome {
            added,
            skipped,
            database_existed: self.database_existed,
        })
    }
}
