use rusqlite::{params, Connection, Row};

use crate::error::{constraint_violation, Result, StorageContext, StoreError, Violation};
use crate::models::{DeleteSummary, Entity, Instructor, InstructorRef};

fn instructor_from_row(row: &Row<'_>) -> rusqlite::Result<Instructor> {
    Ok(Instructor {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        email: row.get(3)?,
    })
}

/// Every instructor in insertion order.
pub fn fetch_instructors(conn: &Connection) -> Result<Vec<Instructor>> {
    let mut stmt = conn
        .prepare("SELECT instructor_id, name, age, email FROM instructors ORDER BY rowid")
        .storage("failed to prepare instructor query")?;

    let instructors = stmt
        .query_map([], instructor_from_row)
        .storage("failed to load instructors")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect instructors")?;

    Ok(instructors)
}

pub fn insert_instructor(conn: &Connection, instructor: &Instructor) -> Result<()> {
    conn.execute(
        "INSERT INTO instructors (instructor_id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
        params![
            instructor.id,
            instructor.name,
            instructor.age,
            instructor.email
        ],
    )
    .map_err(|err| match constraint_violation(&err) {
        Some(Violation::Duplicate) => StoreError::Conflict {
            entity: Entity::Instructor,
            id: instructor.id.clone(),
        },
        _ => StoreError::Storage {
            context: "failed to insert instructor",
            source: err,
        },
    })?;
    Ok(())
}

/// Turn an id or a display name into the id of an existing instructor.
///
/// Names are matched exactly (after trimming). A name shared by several
/// instructors cannot identify one of them, so it is rejected instead of
/// picking the first match.
pub fn resolve_instructor(conn: &Connection, reference: &InstructorRef) -> Result<String> {
    let (sql, key) = match reference {
        InstructorRef::Id(id) => (
            "SELECT instructor_id FROM instructors WHERE instructor_id = ?1",
            id.trim(),
        ),
        InstructorRef::Name(name) => (
            "SELECT instructor_id FROM instructors WHERE name = ?1 ORDER BY rowid",
            name.trim(),
        ),
    };

    let mut stmt = conn
        .prepare(sql)
        .storage("failed to prepare instructor lookup")?;
    let mut ids = stmt
        .query_map([key], |row| row.get::<_, String>(0))
        .storage("failed to look up instructor")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect instructor ids")?;

    match ids.len() {
        0 => Err(StoreError::Reference {
            entity: Entity::Instructor,
            key: key.to_string(),
        }),
        1 => Ok(ids.remove(0)),
        count => Err(StoreError::AmbiguousReference {
            entity: Entity::Instructor,
            key: key.to_string(),
            count,
        }),
    }
}

/// Remove an instructor together with the courses they teach and the
/// enrollments in those courses. The schema performs the cascade; the counts
/// are taken beforehand for reporting.
pub fn delete_instructor(conn: &Connection, id: &str) -> Result<DeleteSummary> {
    let courses: usize = conn
        .query_row(
            "SELECT COUNT(*) FROM courses WHERE instructor_id = ?1",
            [id],
            |row| row.get(0),
        )
        .storage("failed to count instructor courses")?;

    let enrollments: usize = conn
        .query_row(
            "SELECT COUNT(*) FROM enrollments e
             INNER JOIN courses c ON c.course_id = e.course_id
             WHERE c.instructor_id = ?1",
            [id],
            |row| row.get(0),
        )
        .storage("failed to count instructor enrollments")?;

    let deleted = conn
        .execute("DELETE FROM instructors WHERE instructor_id = ?1", [id])
        .storage("failed to delete instructor")?;

    if deleted == 0 {
        Err(StoreError::not_found(Entity::Instructor, id))
    } else {
        Ok(DeleteSummary {
            courses,
            enrollments,
        })
    }
}
