//! Queries on the `images` table.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;
use crate::backend::ImageRecord;

const DUPLICATE_FILENAME: &str = "Image with this filename already exists.";

fn image_not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "image".into(),
        id: id.to_string(),
    }
}

/// Unique-constraint failures become `ConstraintViolation`.
fn map_write_error(e: rusqlite::Error) -> DatabaseError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(DUPLICATE_FILENAME.into())
        }
        other => DatabaseError::Sqlite(other),
    }
}

fn row_to_image(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
    })
}

/// All indexed images, oldest first.
pub fn list_images(conn: &Connection) -> Result<Vec<ImageRecord>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, filename FROM images ORDER BY id")?;
    let images = stmt
        .query_map([], row_to_image)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(images)
}

pub fn get_image(conn: &Connection, id: i64) -> Result<ImageRecord, DatabaseError> {
    conn.query_row(
        "SELECT id, filename FROM images WHERE id = ?1",
        [id],
        row_to_image,
    )
    .optional()?
    .ok_or_else(|| image_not_found(id))
}

/// Insert a new entry. Duplicate names are a `ConstraintViolation`.
pub fn insert_image(conn: &Connection, filename: &str) -> Result<ImageRecord, DatabaseError> {
    conn.execute("INSERT INTO images (filename) VALUES (?1)", [filename])
        .map_err(map_write_error)?;
    Ok(ImageRecord {
        id: conn.last_insert_rowid(),
        filename: filename.to_string(),
    })
}

/// Rename an entry.
pub fn update_image(
    conn: &Connection,
    id: i64,
    filename: &str,
) -> Result<ImageRecord, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE images SET filename = ?1 WHERE id = ?2",
            params![filename, id],
        )
        .map_err(map_write_error)?;
    if changed == 0 {
        return Err(image_not_found(id));
    }
    Ok(ImageRecord {
        id,
        filename: filename.to_string(),
    })
}

/// Remove an entry and return what was removed.
pub fn delete_image(conn: &Connection, id: i64) -> Result<ImageRecord, DatabaseError> {
    let existing = get_image(conn, id)?;
    conn.execute("DELETE FROM images WHERE id = ?1", [id])?;
    Ok(existing)
}

/// Add every name not yet indexed (transactional). Returns the added rows
/// and how many names were already present.
pub fn insert_missing_images(
    conn: &mut Connection,
    filenames: &[String],
) -> Result<(Vec<ImageRecord>, usize), DatabaseError> {
    let tx = conn.transaction()?;
    let mut added = Vec::new();
    let mut skipped = 0;

    for filename in filenames {
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO images (filename) VALUES (?1)",
            [filename],
        )?;
        if inserted == 0 {
            skipped += 1;
        } else {
            added.push(ImageRecord {
                id: tx.last_insert_rowid(),
                filename: filename.clone(),
            });
        }
    }

    tx.commit()?;
    Ok((added, skipped))
}
