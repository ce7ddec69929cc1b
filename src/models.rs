//! Domain models that mirror the SQLite schema. They double as the rows of an
//! exported snapshot, so the serde field names follow the column names rather
//! than the Rust field names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four record kinds the store manages. Used to label errors and log
/// events without repeating string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Student,
    Instructor,
    Course,
    Enrollment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Student => "student",
            Entity::Instructor => "instructor",
            Entity::Course => "course",
            Entity::Enrollment => "enrollment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A registered student.
pub struct Student {
    /// Caller-assigned identifier. Immutable once the row exists.
    #[serde(rename = "student_id")]
    pub id: String,
    pub name: String,
    pub age: i64,
    pub email: String,
}

impl Student {
    /// `Name (ID: id)` label used by selection lists.
    pub fn display_label(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A teaching staff member. Shares its shape with [`Student`] but lives in its
/// own table so the two id spaces never collide.
pub struct Instructor {
    #[serde(rename = "instructor_id")]
    pub id: String,
    pub name: String,
    pub age: i64,
    pub email: String,
}

impl Instructor {
    /// `Name (ID: id)` label used by selection lists.
    pub fn display_label(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A course, optionally taught by an instructor.
pub struct Course {
    #[serde(rename = "course_id")]
    pub id: String,
    #[serde(rename = "course_name")]
    pub name: String,
    /// `None` when no instructor is assigned. Snapshots must still carry the
    /// key, written as `null` for unassigned courses.
    #[serde(deserialize_with = "Option::deserialize")]
    pub instructor_id: Option<String>,
}

impl Course {
    /// `Name (ID: id) - Instructor: id` label used by selection lists. The
    /// instructor part reads `none` for unassigned courses.
    pub fn display_label(&self) -> String {
        format!(
            "{} (ID: {}) - Instructor: {}",
            self.name,
            self.id,
            self.instructor_id.as_deref().unwrap_or("none")
        )
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// A student-course pair from the join table.
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
}

/// Raw person input as typed into a form. The age is still text so the store
/// can reject non-numeric values with a validation error instead of every
/// caller parsing it differently.
#[derive(Debug, Clone, Default)]
pub struct PersonDraft {
    pub id: String,
    pub name: String,
    pub age: String,
    pub email: String,
}

impl PersonDraft {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        age: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age: age.into(),
            email: email.into(),
        }
    }
}

/// How a caller identifies the instructor of a new course. Form widgets
/// often only hold the display name, so both shapes resolve through the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructorRef {
    Id(String),
    Name(String),
}

/// Raw course input.
#[derive(Debug, Clone, Default)]
pub struct CourseDraft {
    pub id: String,
    pub name: String,
    pub instructor: Option<InstructorRef>,
}

impl CourseDraft {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructor: None,
        }
    }

    /// Attach an instructor by id.
    pub fn taught_by(mut self, instructor_id: impl Into<String>) -> Self {
        self.instructor = Some(InstructorRef::Id(instructor_id.into()));
        self
    }

    /// Attach an instructor by display name.
    pub fn taught_by_name(mut self, name: impl Into<String>) -> Self {
        self.instructor = Some(InstructorRef::Name(name.into()));
        self
    }
}

/// Rows removed by a delete, including everything the schema cascaded to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub courses: usize,
    pub enrollments: usize,
}

/// Per-table row counts removed by a bulk clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub students: usize,
    pub instructors: usize,
    pub courses: usize,
    pub enrollments: usize,
}

impl ClearSummary {
    pub fn total(&self) -> usize {
        self.students + self.instructors + self.courses + self.enrollments
    }
}
