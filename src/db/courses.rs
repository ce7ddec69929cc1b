use rusqlite::{params, Connection, Row};

use crate::error::{constraint_violation, Result, StorageContext, StoreError, Violation};
use crate::models::{Course, DeleteSummary, Entity};

pub(crate) fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        instructor_id: row.get(2)?,
    })
}

/// Every course in insertion order.
pub fn fetch_courses(conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn
        .prepare("SELECT course_id, course_name, instructor_id FROM courses ORDER BY rowid")
        .storage("failed to prepare course query")?;

    let courses = stmt
        .query_map([], course_from_row)
        .storage("failed to load courses")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect courses")?;

    Ok(courses)
}

pub fn course_exists(conn: &Connection, id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM courses WHERE course_id = ?1)",
        [id],
        |row| row.get(0),
    )
    .storage("failed to check course")
}

/// Insert a course. A duplicate id is a conflict and an instructor id with no
/// matching row is a dangling reference.
pub fn insert_course(conn: &Connection, course: &Course) -> Result<()> {
    conn.execute(
        "INSERT INTO courses (course_id, course_name, instructor_id) VALUES (?1, ?2, ?3)",
        params![course.id, course.name, course.instructor_id],
    )
    .map_err(|err| match constraint_violation(&err) {
        Some(Violation::Duplicate) => StoreError::Conflict {
            entity: Entity::Course,
            id: course.id.clone(),
        },
        Some(Violation::Dangling) => StoreError::Reference {
            entity: Entity::Instructor,
            key: course.instructor_id.clone().unwrap_or_default(),
        },
        None => StoreError::Storage {
            context: "failed to insert course",
            source: err,
        },
    })?;
    Ok(())
}

/// Remove a course; its enrollments cascade with it.
pub fn delete_course(conn: &Connection, id: &str) -> Result<DeleteSummary> {
    let enrollments: usize = conn
        .query_row(
            "SELECT COUNT(*) FROM enrollments WHERE course_id = ?1",
            [id],
            |row| row.get(0),
        )
        .storage("failed to count course enrollments")?;

    let deleted = conn
        .execute("DELETE FROM courses WHERE course_id = ?1", [id])
        .storage("failed to delete course")?;

    if deleted == 0 {
        Err(StoreError::not_found(Entity::Course, id))
    } else {
        Ok(DeleteSummary {
            courses: 1,
            enrollments,
        })
    }
}
