//! Records manager for a small school: students, instructors, courses and
//! enrollments kept in an embedded SQLite database.
//!
//! All business rules (unique ids, referential integrity, cascading deletes,
//! all-or-nothing writes) live in [`SchoolRecordStore`], so any front end can
//! stay a thin caller. The bundled command-line front end lives in [`cli`].
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
mod validation;

/// The store and the types its operations hand back.
pub use db::{SchoolRecordStore, SearchCriterion, SearchHit, SearchResults, Snapshot};

pub use config::Config;
pub use error::{ErrorKind, StoreError};

/// Domain types passed in and out of the store.
pub use models::{
    ClearSummary, Course, CourseDraft, DeleteSummary, Enrollment, Entity, Instructor,
    InstructorRef, PersonDraft, Student,
};
