//! Persistence module split across logical submodules. [`SchoolRecordStore`]
//! is the only writer: it owns the connection, validates input, and wraps
//! every multi-statement change in one transaction so a failure never leaves
//! the tables half updated.

mod connection;
mod courses;
mod instructors;
mod search;
mod snapshot;
mod students;

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{Connection, Transaction};
use tracing::{debug, info, warn};

use crate::error::{Result, StorageContext, StoreError};
use crate::models::{
    ClearSummary, Course, CourseDraft, DeleteSummary, Enrollment, Entity, Instructor,
    InstructorRef, PersonDraft, Student,
};
use crate::validation::{course_header, instructor_from_draft, required, student_from_draft};

pub use connection::{ensure_schema, open_database};
pub use courses::{course_exists, delete_course, fetch_courses, insert_course};
pub use instructors::{delete_instructor, fetch_instructors, insert_instructor, resolve_instructor};
pub use search::{SearchCriterion, SearchHit, SearchResults};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot};
pub use students::{
    delete_student, fetch_enrollments, fetch_roster, fetch_students, insert_enrollment,
    insert_student,
};

/// Owner of the school database.
pub struct SchoolRecordStore {
    conn: Connection,
}

impl SchoolRecordStore {
    /// Open the database file at `path`, creating it and its tables if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(open_database(path.as_ref())?)
    }

    /// A throwaway store backed by an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection and make sure the schema is in place.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create any missing tables. Running it again is a no-op.
    pub fn initialize(&self) -> Result<()> {
        ensure_schema(&self.conn)
    }

    /// Read-only access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Register a student and enroll them in every listed course. Either the
    /// student and all enrollments are stored, or nothing is.
    pub fn add_student<I, S>(&mut self, draft: &PersonDraft, course_ids: I) -> Result<Student>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        logged("add student", self.try_add_student(draft, course_ids))
    }

    fn try_add_student<I, S>(&mut self, draft: &PersonDraft, course_ids: I) -> Result<Student>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let student = student_from_draft(draft)?;
        let course_ids = course_ids
            .into_iter()
            .map(|id| required("course id", id.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;

        let tx = self.begin()?;
        insert_student(&tx, &student)?;
        for course_id in &course_ids {
            insert_enrollment(
                &tx,
                &Enrollment {
                    student_id: student.id.clone(),
                    course_id: course_id.clone(),
                },
            )?;
        }
        tx.commit().storage("failed to commit student")?;

        info!(
            student = %student.id,
            enrollments = course_ids.len(),
            "registered student"
        );
        Ok(student)
    }

    /// Add an instructor.
    pub fn add_instructor(&mut self, draft: &PersonDraft) -> Result<Instructor> {
        logged("add instructor", self.try_add_instructor(draft))
    }

    fn try_add_instructor(&mut self, draft: &PersonDraft) -> Result<Instructor> {
        let instructor = instructor_from_draft(draft)?;
        insert_instructor(&self.conn, &instructor)?;
        info!(instructor = %instructor.id, "added instructor");
        Ok(instructor)
    }

    /// Add a course. When the draft names an instructor, by id or by display
    /// name, it must resolve to exactly one existing instructor.
    pub fn add_course(&mut self, draft: &CourseDraft) -> Result<Course> {
        logged("add course", self.try_add_course(draft))
    }

    fn try_add_course(&mut self, draft: &CourseDraft) -> Result<Course> {
        let (id, name) = course_header(draft)?;

        let tx = self.begin()?;
        let instructor_id = draft
            .instructor
            .as_ref()
            .map(|reference| resolve_instructor(&tx, reference))
            .transpose()?;
        let course = Course {
            id,
            name,
            instructor_id,
        };
        insert_course(&tx, &course)?;
        tx.commit().storage("failed to commit course")?;

        info!(
            course = %course.id,
            instructor = course.instructor_id.as_deref().unwrap_or("none"),
            "added course"
        );
        Ok(course)
    }

    /// Look up the id of the instructor a reference points at.
    pub fn resolve_instructor(&self, reference: &InstructorRef) -> Result<String> {
        resolve_instructor(&self.conn, reference)
    }

    /// Delete a student and their enrollments.
    pub fn delete_student(&mut self, id: &str) -> Result<DeleteSummary> {
        logged(
            "delete student",
            self.delete_with(Entity::Student, id, delete_student),
        )
    }

    /// Delete an instructor, the courses they teach, and the enrollments in
    /// those courses.
    pub fn delete_instructor(&mut self, id: &str) -> Result<DeleteSummary> {
        logged(
            "delete instructor",
            self.delete_with(Entity::Instructor, id, delete_instructor),
        )
    }

    /// Delete a course and its enrollments.
    pub fn delete_course(&mut self, id: &str) -> Result<DeleteSummary> {
        logged(
            "delete course",
            self.delete_with(Entity::Course, id, delete_course),
        )
    }

    fn delete_with(
        &mut self,
        entity: Entity,
        id: &str,
        delete: fn(&Connection, &str) -> Result<DeleteSummary>,
    ) -> Result<DeleteSummary> {
        let id = id.trim();
        let tx = self.begin()?;
        let summary = delete(&tx, id)?;
        tx.commit().storage("failed to commit delete")?;

        info!(
            %entity,
            id,
            courses = summary.courses,
            enrollments = summary.enrollments,
            "deleted record"
        );
        Ok(summary)
    }

    /// Empty every table in one transaction.
    pub fn clear_all(&mut self) -> Result<ClearSummary> {
        logged("clear all", self.try_clear_all())
    }

    fn try_clear_all(&mut self) -> Result<ClearSummary> {
        let tx = self.begin()?;
        let summary = clear_tables(&tx)?;
        tx.commit().storage("failed to commit clear")?;

        info!(rows = summary.total(), "cleared all records");
        Ok(summary)
    }

    /// Every student, in insertion order.
    pub fn list_students(&self) -> Result<Vec<Student>> {
        fetch_students(&self.conn)
    }

    /// Every instructor, in insertion order.
    pub fn list_instructors(&self) -> Result<Vec<Instructor>> {
        fetch_instructors(&self.conn)
    }

    /// Every course, in insertion order.
    pub fn list_courses(&self) -> Result<Vec<Course>> {
        fetch_courses(&self.conn)
    }

    /// Every enrollment pair, in insertion order.
    pub fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        fetch_enrollments(&self.conn)
    }

    /// Students enrolled in `course_id`.
    pub fn course_roster(&self, course_id: &str) -> Result<Vec<Student>> {
        let course_id = course_id.trim();
        if !course_exists(&self.conn, course_id)? {
            return Err(StoreError::not_found(Entity::Course, course_id));
        }
        fetch_roster(&self.conn, course_id)
    }

    /// Lazily search the store. An empty query matches every row.
    pub fn search(&self, criterion: SearchCriterion, query: &str) -> SearchResults<'_> {
        SearchResults::new(&self.conn, criterion, query)
    }

    /// Like [`search`](Self::search), with the criterion given as text
    /// (`name`, `id` or `course`).
    pub fn search_by(&self, criterion: &str, query: &str) -> Result<SearchResults<'_>> {
        let criterion = logged("search", criterion.parse::<SearchCriterion>())?;
        Ok(self.search(criterion, query))
    }

    /// Capture the full contents of all four tables.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let snapshot = read_snapshot(&self.conn)?;
        debug!(rows = snapshot.len(), "exported snapshot");
        Ok(snapshot)
    }

    /// Replace the store contents with `snapshot`. The rows go through the
    /// same checks as the add operations; on any failure the previous
    /// contents are kept.
    pub fn import_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        logged("import snapshot", self.try_import_snapshot(snapshot))
    }

    fn try_import_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self.begin()?;
        let cleared = clear_tables(&tx)?;
        write_snapshot(&tx, snapshot)?;
        tx.commit().storage("failed to commit import")?;

        info!(
            replaced = cleared.total(),
            students = snapshot.students.len(),
            instructors = snapshot.instructors.len(),
            courses = snapshot.courses.len(),
            enrollments = snapshot.enrollments.len(),
            "imported snapshot"
        );
        Ok(())
    }

    /// Export to a JSON file at `path`.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<Snapshot> {
        let snapshot = self.export_snapshot()?;
        logged("export to file", snapshot.write_to(path.as_ref()))?;
        info!(path = %path.as_ref().display(), rows = snapshot.len(), "wrote snapshot");
        Ok(snapshot)
    }

    /// Import the JSON file at `path`. A file that cannot be read or parsed
    /// leaves the store untouched.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> Result<Snapshot> {
        let snapshot = logged("import from file", Snapshot::read_from(path.as_ref()))?;
        self.import_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    fn begin(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction()
            .storage("failed to start transaction")
    }
}

/// Delete every row, children before parents.
fn clear_tables(conn: &Connection) -> Result<ClearSummary> {
    let enrollments = conn
        .execute("DELETE FROM enrollments", [])
        .storage("failed to clear enrollments")?;
    let courses = conn
        .execute("DELETE FROM courses", [])
        .storage("failed to clear courses")?;
    let students = conn
        .execute("DELETE FROM students", [])
        .storage("failed to clear students")?;
    let instructors = conn
        .execute("DELETE FROM instructors", [])
        .storage("failed to clear instructors")?;

    Ok(ClearSummary {
        students,
        instructors,
        courses,
        enrollments,
    })
}

/// Log rejected operations once, at the boundary, before handing the error to
/// the caller.
fn logged<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        warn!(operation, kind = %err.kind(), error = %err, "operation rejected");
    }
    result
}
