//! Case-insensitive substring search across students, instructors and
//! courses. Results are produced lazily: each table (and each matching
//! course's roster) is only queried once the caller has consumed everything
//! before it.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;
use tracing::debug;

use super::courses::course_from_row;
use super::students::fetch_roster;
use crate::error::{Result, StorageContext, StoreError};
use crate::models::Course;

/// Which field(s) a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriterion {
    /// Student and instructor names.
    Name,
    /// Student and instructor ids.
    Id,
    /// Course names and ids; each matching course also yields its roster.
    Course,
}

impl FromStr for SearchCriterion {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SearchCriterion::Name),
            "id" => Ok(SearchCriterion::Id),
            "course" => Ok(SearchCriterion::Course),
            other => Err(StoreError::validation(format!(
                "unknown search criterion '{other}', expected name, id or course"
            ))),
        }
    }
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchCriterion::Name => "name",
            SearchCriterion::Id => "id",
            SearchCriterion::Course => "course",
        };
        f.write_str(label)
    }
}

/// One search result. Ids travel alongside names so a caller acting on a
/// selected hit never has to parse them back out of a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    Student {
        id: String,
        name: String,
    },
    Instructor {
        id: String,
        name: String,
    },
    Course(Course),
    /// A student listed under the course hit that precedes it.
    EnrolledStudent {
        course_id: String,
        student_id: String,
        name: String,
    },
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchHit::Student { id, name } => write!(f, "Student: {name}, ID: {id}"),
            SearchHit::Instructor { id, name } => write!(f, "Instructor: {name}, ID: {id}"),
            SearchHit::Course(course) => write!(
                f,
                "Course: {} (ID: {}), Instructor: {}",
                course.name,
                course.id,
                course.instructor_id.as_deref().unwrap_or("none")
            ),
            SearchHit::EnrolledStudent {
                student_id, name, ..
            } => write!(f, " - Student: {name}, ID: {student_id}"),
        }
    }
}

enum Stage {
    Students,
    Instructors,
    Courses,
    Course(Course),
}

/// Lazy iterator over [`SearchHit`]s. Yields an `Err` at most once, after
/// which it is exhausted.
pub struct SearchResults<'c> {
    conn: &'c Connection,
    criterion: SearchCriterion,
    pattern: String,
    stages: VecDeque<Stage>,
    buffered: VecDeque<SearchHit>,
}

impl<'c> SearchResults<'c> {
    pub(crate) fn new(conn: &'c Connection, criterion: SearchCriterion, query: &str) -> Self {
        let stages = match criterion {
            SearchCriterion::Name | SearchCriterion::Id => {
                VecDeque::from([Stage::Students, Stage::Instructors])
            }
            SearchCriterion::Course => VecDeque::from([Stage::Courses]),
        };
        debug!(%criterion, query, "starting search");
        Self {
            conn,
            criterion,
            pattern: like_pattern(query),
            stages,
            buffered: VecDeque::new(),
        }
    }

    fn run(&mut self, stage: Stage) -> Result<()> {
        match stage {
            Stage::Students => {
                let column = self.person_column("student_id");
                let sql = format!(
                    "SELECT student_id, name FROM students
                     WHERE fold_case({column}) LIKE ?1 ESCAPE '\\' ORDER BY rowid"
                );
                let hits = self.people(&sql, |id, name| SearchHit::Student { id, name })?;
                self.buffered.extend(hits);
            }
            Stage::Instructors => {
                let column = self.person_column("instructor_id");
                let sql = format!(
                    "SELECT instructor_id, name FROM instructors
                     WHERE fold_case({column}) LIKE ?1 ESCAPE '\\' ORDER BY rowid"
                );
                let hits = self.people(&sql, |id, name| SearchHit::Instructor { id, name })?;
                self.buffered.extend(hits);
            }
            Stage::Courses => {
                let mut stmt = self
                    .conn
                    .prepare(
                        "SELECT course_id, course_name, instructor_id FROM courses
                         WHERE fold_case(course_name) LIKE ?1 ESCAPE '\\'
                            OR fold_case(course_id) LIKE ?1 ESCAPE '\\'
                         ORDER BY rowid",
                    )
                    .storage("failed to prepare course search")?;
                let courses = stmt
                    .query_map([&self.pattern], course_from_row)
                    .storage("failed to search courses")?
                    .collect::<Result<Vec<_>, _>>()
                    .storage("failed to collect course matches")?;
                // Each course becomes its own stage so rosters load on demand.
                for course in courses.into_iter().rev() {
                    self.stages.push_front(Stage::Course(course));
                }
            }
            Stage::Course(course) => {
                let roster = fetch_roster(self.conn, &course.id)?;
                let course_id = course.id.clone();
                self.buffered.push_back(SearchHit::Course(course));
                self.buffered
                    .extend(roster.into_iter().map(|student| SearchHit::EnrolledStudent {
                        course_id: course_id.clone(),
                        student_id: student.id,
                        name: student.name,
                    }));
            }
        }
        Ok(())
    }

    fn person_column(&self, id_column: &'static str) -> &'static str {
        match self.criterion {
            SearchCriterion::Id => id_column,
            _ => "name",
        }
    }

    fn people(
        &self,
        sql: &str,
        hit: impl Fn(String, String) -> SearchHit,
    ) -> Result<Vec<SearchHit>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .storage("failed to prepare person search")?;
        let hits = stmt
            .query_map([&self.pattern], |row| Ok(hit(row.get(0)?, row.get(1)?)))
            .storage("failed to search people")?
            .collect::<Result<Vec<_>, _>>()
            .storage("failed to collect person matches")?;
        Ok(hits)
    }
}

impl Iterator for SearchResults<'_> {
    type Item = Result<SearchHit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.buffered.pop_front() {
                return Some(Ok(hit));
            }
            let stage = self.stages.pop_front()?;
            if let Err(err) = self.run(stage) {
                self.stages.clear();
                return Some(Err(err));
            }
        }
    }
}

/// Build a `LIKE` pattern matching `query` anywhere in a column passed through
/// `fold_case`. The query is lowercased the same way, and wildcard characters
/// typed by the user are escaped so they match literally.
fn like_pattern(query: &str) -> String {
    let folded = query.to_lowercase();
    let mut pattern = String::with_capacity(folded.len() + 2);
    pattern.push('%');
    for ch in folded.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
