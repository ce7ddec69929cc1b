//! Command-line front end. Every subcommand maps onto one store operation and
//! prints what it returns; no rules live here.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{LogFormat, LoggingConfig};
use crate::db::SchoolRecordStore;
use crate::models::{CourseDraft, DeleteSummary, PersonDraft};

#[derive(Debug, Parser)]
#[command(
    name = "school-records",
    version,
    about = "Manage students, instructors, courses and enrollments"
)]
pub struct Cli {
    /// Database file (defaults to ~/.school-records-manager/school_management.sqlite)
    #[arg(long, global = true, env = "SCHOOL_RECORDS_DB")]
    pub db: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "SCHOOL_RECORDS_LOG", default_value = "warn")]
    pub log_level: String,

    #[arg(
        long,
        global = true,
        env = "SCHOOL_RECORDS_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database tables if they do not exist yet
    Init,
    /// Register a student, optionally enrolling them in courses
    AddStudent {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        email: String,
        /// Course id to enroll in; repeat for several courses
        #[arg(long = "course")]
        courses: Vec<String>,
    },
    /// Add an instructor
    AddInstructor {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        email: String,
    },
    /// Add a course, optionally assigning an instructor by id or by name
    AddCourse {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, conflicts_with = "instructor_name")]
        instructor_id: Option<String>,
        #[arg(long)]
        instructor_name: Option<String>,
    },
    /// Delete a record and everything that depends on it
    Delete { kind: RecordKind, id: String },
    /// List the rows of one table
    List { table: Table },
    /// Search by name, id or course; an empty query matches everything
    Search {
        criterion: String,
        #[arg(default_value = "")]
        query: String,
    },
    /// Show the students enrolled in a course
    Roster { course_id: String },
    /// Delete every record
    Clear {
        /// Confirm that all records should be removed
        #[arg(long)]
        yes: bool,
    },
    /// Write all tables to a JSON file
    Export { path: PathBuf },
    /// Replace all tables with the contents of a JSON file
    Import { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    Student,
    Instructor,
    Course,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Table {
    Students,
    Instructors,
    Courses,
    Enrollments,
}

/// Run one command against `store`, writing human-readable output to `out`.
pub fn execute(store: &mut SchoolRecordStore, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Init => {
            store.initialize()?;
            writeln!(out, "Database ready.")?;
        }
        Command::AddStudent {
            id,
            name,
            age,
            email,
            courses,
        } => {
            let draft = PersonDraft::new(id, name, age, email);
            let student = store.add_student(&draft, &courses)?;
            writeln!(out, "Student {} has been registered!", student.name)?;
        }
        Command::AddInstructor {
            id,
            name,
            age,
            email,
        } => {
            let draft = PersonDraft::new(id, name, age, email);
            let instructor = store.add_instructor(&draft)?;
            writeln!(out, "Instructor {} has been added!", instructor.name)?;
        }
        Command::AddCourse {
            id,
            name,
            instructor_id,
            instructor_name,
        } => {
            let mut draft = CourseDraft::new(id, name);
            if let Some(instructor_id) = instructor_id {
                draft = draft.taught_by(instructor_id);
            } else if let Some(instructor_name) = instructor_name {
                draft = draft.taught_by_name(instructor_name);
            }
            let course = store.add_course(&draft)?;
            writeln!(out, "Course {} has been added!", course.name)?;
        }
        Command::Delete { kind, id } => {
            let (label, summary) = match kind {
                RecordKind::Student => ("Student", store.delete_student(&id)?),
                RecordKind::Instructor => ("Instructor", store.delete_instructor(&id)?),
                RecordKind::Course => ("Course", store.delete_course(&id)?),
            };
            writeln!(out, "{label} (ID: {id}) has been deleted.{}", cascade_note(kind, summary))?;
        }
        Command::List { table } => list(store, table, out)?,
        Command::Search { criterion, query } => {
            let mut found = false;
            for hit in store.search_by(&criterion, &query)? {
                writeln!(out, "{}", hit?)?;
                found = true;
            }
            if !found {
                writeln!(out, "No matching results found.")?;
            }
        }
        Command::Roster { course_id } => {
            for student in store.course_roster(&course_id)? {
                writeln!(out, "{}", student.display_label())?;
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to delete all records without --yes");
            }
            let summary = store.clear_all()?;
            writeln!(
                out,
                "All records have been cleared ({} rows removed).",
                summary.total()
            )?;
        }
        Command::Export { path } => {
            let snapshot = store
                .export_to_file(&path)
                .with_context(|| format!("failed to export to {}", path.display()))?;
            writeln!(
                out,
                "Saved {} rows to {}.",
                snapshot.len(),
                path.display()
            )?;
        }
        Command::Import { path } => {
            let snapshot = store
                .import_from_file(&path)
                .with_context(|| format!("failed to import {}", path.display()))?;
            writeln!(
                out,
                "Loaded {} rows from {}.",
                snapshot.len(),
                path.display()
            )?;
        }
    }
    Ok(())
}

fn list(store: &SchoolRecordStore, table: Table, out: &mut impl Write) -> Result<()> {
    let lines: Vec<String> = match table {
        Table::Students => store
            .list_students()?
            .iter()
            .map(|s| s.display_label())
            .collect(),
        Table::Instructors => store
            .list_instructors()?
            .iter()
            .map(|i| i.display_label())
            .collect(),
        Table::Courses => store
            .list_courses()?
            .iter()
            .map(|c| c.display_label())
            .collect(),
        Table::Enrollments => store
            .list_enrollments()?
            .iter()
            .map(|e| format!("{} -> {}", e.student_id, e.course_id))
            .collect(),
    };
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn cascade_note(kind: RecordKind, summary: DeleteSummary) -> String {
    match kind {
        RecordKind::Instructor if summary.courses > 0 => format!(
            " Removed {} course(s) and {} enrollment(s).",
            summary.courses, summary.enrollments
        ),
        _ if summary.enrollments > 0 => {
            format!(" Removed {} enrollment(s).", summary.enrollments)
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(store: &mut SchoolRecordStore, args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("school-records").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(store, cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn commands_drive_the_store() {
        let mut store = SchoolRecordStore::open_in_memory().unwrap();

        run(
            &mut store,
            &["add-instructor", "--id", "I1", "--name", "Jane", "--age", "40", "--email", "jane@x.edu"],
        )
        .unwrap();
        run(
            &mut store,
            &["add-course", "--id", "C1", "--name", "Calculus", "--instructor-name", "Jane"],
        )
        .unwrap();
        let output = run(
            &mut store,
            &[
                "add-student", "--id", "S1", "--name", "Amy", "--age", "20", "--email",
                "amy@x.edu", "--course", "C1",
            ],
        )
        .unwrap();
        assert_eq!(output, "Student Amy has been registered!\n");

        let output = run(&mut store, &["list", "courses"]).unwrap();
        assert_eq!(output, "Calculus (ID: C1) - Instructor: I1\n");

        let output = run(&mut store, &["search", "course", "calc"]).unwrap();
        assert_eq!(
            output,
            "Course: Calculus (ID: C1), Instructor: I1\n - Student: Amy, ID: S1\n"
        );

        let output = run(&mut store, &["delete", "instructor", "I1"]).unwrap();
        assert_eq!(
            output,
            "Instructor (ID: I1) has been deleted. Removed 1 course(s) and 1 enrollment(s).\n"
        );
    }

    #[test]
    fn empty_search_reports_no_results() {
        let mut store = SchoolRecordStore::open_in_memory().unwrap();
        let output = run(&mut store, &["search", "name"]).unwrap();
        assert_eq!(output, "No matching results found.\n");
    }

    #[test]
    fn clear_requires_confirmation() {
        let mut store = SchoolRecordStore::open_in_memory().unwrap();
        assert!(run(&mut store, &["clear"]).is_err());
        assert!(run(&mut store, &["clear", "--yes"]).is_ok());
    }
}
