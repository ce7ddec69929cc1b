use std::fs;
use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StorageContext, StoreError};

/// Open (creating if needed) the database file at `path`. Parent directories
/// are created first so a fresh install works without manual setup.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::File {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    debug!(path = %path.display(), "opening database");
    Connection::open(path).storage("failed to open SQLite database")
}

/// Create the four tables if they are missing, turn on foreign key
/// enforcement and register `fold_case(text)` on the connection. Safe to run
/// against an already initialized database.
///
/// `fold_case` lowercases with Unicode rules; SQLite's own `lower()` and
/// `LIKE` only fold ASCII letters.
///
/// Cascading deletes live in the schema: removing an instructor drops its
/// courses, and removing a student or course drops the matching enrollments.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .storage("failed to enable foreign keys")?;

    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )
    .storage("failed to register case folding function")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students (
            student_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )
    .storage("failed to create students table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS instructors (
            instructor_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )
    .storage("failed to create instructors table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            course_id TEXT PRIMARY KEY,
            course_name TEXT NOT NULL,
            instructor_id TEXT,
            FOREIGN KEY(instructor_id) REFERENCES instructors(instructor_id) ON DELETE CASCADE
        )",
        [],
    )
    .storage("failed to create courses table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments (
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            PRIMARY KEY (student_id, course_id),
            FOREIGN KEY(student_id) REFERENCES students(student_id) ON DELETE CASCADE,
            FOREIGN KEY(course_id) REFERENCES courses(course_id) ON DELETE CASCADE
        )",
        [],
    )
    .storage("failed to create enrollments table")?;

    Ok(())
}
