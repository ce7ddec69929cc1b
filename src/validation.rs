//! Input checks shared by the add operations and snapshot import. Each helper
//! trims its input and returns the cleaned value, so what gets stored is
//! exactly what was validated.

use crate::error::{Result, StoreError};
use crate::models::{Course, CourseDraft, Instructor, PersonDraft, Student};

/// Reject blank text, returning the trimmed value.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Parse a form age. Blank, non-numeric and negative values are rejected.
pub(crate) fn parse_age(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoreError::validation("age is required"));
    }
    let age = raw
        .parse::<i64>()
        .map_err(|_| StoreError::validation(format!("age must be a whole number, got '{raw}'")))?;
    check_age(age)
}

pub(crate) fn check_age(age: i64) -> Result<i64> {
    if age < 0 {
        return Err(StoreError::validation(format!(
            "age must not be negative, got {age}"
        )));
    }
    Ok(age)
}

pub(crate) fn student_from_draft(draft: &PersonDraft) -> Result<Student> {
    Ok(Student {
        id: required("student id", &draft.id)?,
        name: required("student name", &draft.name)?,
        age: parse_age(&draft.age)?,
        email: required("student email", &draft.email)?,
    })
}

pub(crate) fn instructor_from_draft(draft: &PersonDraft) -> Result<Instructor> {
    Ok(Instructor {
        id: required("instructor id", &draft.id)?,
        name: required("instructor name", &draft.name)?,
        age: parse_age(&draft.age)?,
        email: required("instructor email", &draft.email)?,
    })
}

/// Validate the id and name of a course draft. The instructor reference is
/// resolved separately because it needs the database.
pub(crate) fn course_header(draft: &CourseDraft) -> Result<(String, String)> {
    Ok((
        required("course id", &draft.id)?,
        required("course name", &draft.name)?,
    ))
}

/// Re-check a student row coming from a snapshot, where the age is already
/// numeric.
pub(crate) fn clean_student(student: &Student) -> Result<Student> {
    Ok(Student {
        id: required("student id", &student.id)?,
        name: required("student name", &student.name)?,
        age: check_age(student.age)?,
        email: required("student email", &student.email)?,
    })
}

pub(crate) fn clean_instructor(instructor: &Instructor) -> Result<Instructor> {
    Ok(Instructor {
        id: required("instructor id", &instructor.id)?,
        name: required("instructor name", &instructor.name)?,
        age: check_age(instructor.age)?,
        email: required("instructor email", &instructor.email)?,
    })
}

pub(crate) fn clean_course(course: &Course) -> Result<Course> {
    let instructor_id = course
        .instructor_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    Ok(Course {
        id: required("course id", &course.id)?,
        name: required("course name", &course.name)?,
        instructor_id,
    })
}
