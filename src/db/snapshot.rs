//! Whole-store export and import. A snapshot carries all four tables; the
//! `enrollments` array is always written but may be absent from older files,
//! in which case it reads as empty.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::courses::{fetch_courses, insert_course};
use super::instructors::{fetch_instructors, insert_instructor};
use super::students::{fetch_enrollments, fetch_students, insert_enrollment, insert_student};
use crate::error::{Result, StoreError};
use crate::models::{Course, Enrollment, Instructor, Student};
use crate::validation::{clean_course, clean_instructor, clean_student, required};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub instructors: Vec<Instructor>,
    pub courses: Vec<Course>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Snapshot {
    /// Parse a snapshot document. Missing required keys or wrongly typed
    /// values are reported as a malformed snapshot.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(StoreError::MalformedSnapshot)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(StoreError::MalformedSnapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(StoreError::MalformedSnapshot)
    }

    /// Read a snapshot file from disk.
    pub fn read_from(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| StoreError::File {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| json_error(path, err))
    }

    /// Write the snapshot as pretty-printed JSON, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file_error = |source| StoreError::File {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(file_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|err| json_error(path, err))?;
        writer.write_all(b"\n").map_err(file_error)?;
        writer.flush().map_err(file_error)
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.students.len() + self.instructors.len() + self.courses.len() + self.enrollments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// I/O failures underneath serde stay storage errors; everything else is a
/// problem with the document itself.
fn json_error(path: &Path, err: serde_json::Error) -> StoreError {
    if err.is_io() {
        StoreError::File {
            path: path.to_path_buf(),
            source: err.into(),
        }
    } else {
        StoreError::MalformedSnapshot(err)
    }
}

/// Read every table into a snapshot.
pub fn read_snapshot(conn: &Connection) -> Result<Snapshot> {
    Ok(Snapshot {
        students: fetch_students(conn)?,
        instructors: fetch_instructors(conn)?,
        courses: fetch_courses(conn)?,
        enrollments: fetch_enrollments(conn)?,
    })
}

/// Insert every row of `snapshot` into empty tables. Rows are inserted
/// parents first so the foreign keys hold at every step; the caller owns the
/// surrounding transaction and the clearing of previous contents.
pub fn write_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<()> {
    for instructor in &snapshot.instructors {
        insert_instructor(conn, &clean_instructor(instructor)?)?;
    }
    for course in &snapshot.courses {
        insert_course(conn, &clean_course(course)?)?;
    }
    for student in &snapshot.students {
        insert_student(conn, &clean_student(student)?)?;
    }
    for enrollment in &snapshot.enrollments {
        let enrollment = Enrollment {
            student_id: required("enrollment student id", &enrollment.student_id)?,
            course_id: required("enrollment course id", &enrollment.course_id)?,
        };
        insert_enrollment(conn, &enrollment)?;
    }
    Ok(())
}
