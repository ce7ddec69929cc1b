use rusqlite::{params, Connection, Row};

use crate::error::{constraint_violation, Result, StorageContext, StoreError, Violation};
use crate::models::{DeleteSummary, Enrollment, Entity, Student};

pub(crate) fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        email: row.get(3)?,
    })
}

/// Every student in insertion order.
pub fn fetch_students(conn: &Connection) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare("SELECT student_id, name, age, email FROM students ORDER BY rowid")
        .storage("failed to prepare student query")?;

    let students = stmt
        .query_map([], student_from_row)
        .storage("failed to load students")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect students")?;

    Ok(students)
}

/// Insert a student row. A duplicate id surfaces as a conflict rather than a
/// raw constraint failure.
pub fn insert_student(conn: &Connection, student: &Student) -> Result<()> {
    conn.execute(
        "INSERT INTO students (student_id, name, age, email) VALUES (?1, ?2, ?3, ?4)",
        params![student.id, student.name, student.age, student.email],
    )
    .map_err(|err| match constraint_violation(&err) {
        Some(Violation::Duplicate) => StoreError::Conflict {
            entity: Entity::Student,
            id: student.id.clone(),
        },
        _ => StoreError::Storage {
            context: "failed to insert student",
            source: err,
        },
    })?;
    Ok(())
}

/// Link a student to a course. Both rows must already exist; an unknown
/// course id is reported as a dangling reference.
pub fn insert_enrollment(conn: &Connection, enrollment: &Enrollment) -> Result<()> {
    conn.execute(
        "INSERT INTO enrollments (student_id, course_id) VALUES (?1, ?2)",
        params![enrollment.student_id, enrollment.course_id],
    )
    .map_err(|err| match constraint_violation(&err) {
        Some(Violation::Duplicate) => StoreError::Conflict {
            entity: Entity::Enrollment,
            id: format!("{}/{}", enrollment.student_id, enrollment.course_id),
        },
        Some(Violation::Dangling) => dangling_enrollment(conn, enrollment),
        None => StoreError::Storage {
            context: "failed to insert enrollment",
            source: err,
        },
    })?;
    Ok(())
}

/// Work out which side of a rejected enrollment is missing so the error names
/// the right record. If that lookup fails, its storage error is returned.
fn dangling_enrollment(conn: &Connection, enrollment: &Enrollment) -> StoreError {
    let student_exists = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM students WHERE student_id = ?1)",
            [&enrollment.student_id],
            |row| row.get::<_, bool>(0),
        )
        .storage("failed to look up enrollment student");

    match student_exists {
        Ok(true) => StoreError::Reference {
            entity: Entity::Course,
            key: enrollment.course_id.clone(),
        },
        Ok(false) => StoreError::Reference {
            entity: Entity::Student,
            key: enrollment.student_id.clone(),
        },
        Err(err) => err,
    }
}

/// Every enrollment pair in insertion order.
pub fn fetch_enrollments(conn: &Connection) -> Result<Vec<Enrollment>> {
    let mut stmt = conn
        .prepare("SELECT student_id, course_id FROM enrollments ORDER BY rowid")
        .storage("failed to prepare enrollment query")?;

    let enrollments = stmt
        .query_map([], |row| {
            Ok(Enrollment {
                student_id: row.get(0)?,
                course_id: row.get(1)?,
            })
        })
        .storage("failed to load enrollments")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect enrollments")?;

    Ok(enrollments)
}

/// Students enrolled in one course, in enrollment order.
pub fn fetch_roster(conn: &Connection, course_id: &str) -> Result<Vec<Student>> {
    let mut stmt = conn
        .prepare(
            "SELECT s.student_id, s.name, s.age, s.email
             FROM enrollments e
             INNER JOIN students s ON s.student_id = e.student_id
             WHERE e.course_id = ?1
             ORDER BY e.rowid",
        )
        .storage("failed to prepare roster query")?;

    let students = stmt
        .query_map([course_id], student_from_row)
        .storage("failed to load roster")?
        .collect::<Result<Vec<_>, _>>()
        .storage("failed to collect roster")?;

    Ok(students)
}

/// Remove a student. The schema cascades to `enrollments`; the count is read
/// first so the caller can report what went with it.
pub fn delete_student(conn: &Connection, id: &str) -> Result<DeleteSummary> {
    let enrollments: usize = conn
        .query_row(
            "SELECT COUNT(*) FROM enrollments WHERE student_id = ?1",
            [id],
            |row| row.get(0),
        )
        .storage("failed to count student enrollments")?;

    let deleted = conn
        .execute("DELETE FROM students WHERE student_id = ?1", [id])
        .storage("failed to delete student")?;

    if deleted == 0 {
        Err(StoreError::not_found(Entity::Student, id))
    } else {
        Ok(DeleteSummary {
            courses: 0,
            enrollments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::error::ErrorKind;

    fn enrollment(student_id: &str, course_id: &str) -> Enrollment {
        Enrollment {
            student_id: student_id.into(),
            course_id: course_id.into(),
        }
    }

    #[test]
    fn dangling_enrollment_names_the_missing_side() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        insert_student(
            &conn,
            &Student {
                id: "S1".into(),
                name: "Amy".into(),
                age: 20,
                email: "amy@x.edu".into(),
            },
        )
        .unwrap();

        let err = insert_enrollment(&conn, &enrollment("S1", "C404")).unwrap_err();
        assert!(matches!(err, StoreError::Reference { entity: Entity::Course, .. }));

        let err = insert_enrollment(&conn, &enrollment("S404", "C404")).unwrap_err();
        assert!(matches!(err, StoreError::Reference { entity: Entity::Student, .. }));
    }

    #[test]
    fn failed_lookup_is_a_storage_error() {
        // No schema, so the existence check itself fails.
        let conn = Connection::open_in_memory().unwrap();
        let err = dangling_enrollment(&conn, &enrollment("S1", "C1"));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
