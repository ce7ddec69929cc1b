//! Search behaviour across students, instructors and courses.

use pretty_assertions::assert_eq;
use school_records_manager::{
    CourseDraft, ErrorKind, PersonDraft, SchoolRecordStore, SearchCriterion, SearchHit,
};

fn store() -> SchoolRecordStore {
    let mut store = SchoolRecordStore::open_in_memory().expect("open");
    store
        .add_instructor(&PersonDraft::new("I1", "Jane Doe", "40", "jane@x.edu"))
        .expect("instructor");
    store
        .add_course(&CourseDraft::new("C1", "Algebra I").taught_by("I1"))
        .expect("algebra");
    store
        .add_course(&CourseDraft::new("C2", "History").taught_by("I1"))
        .expect("history");
    store
        .add_student(&PersonDraft::new("S1", "Amy", "20", "amy@x.edu"), ["C1"])
        .expect("amy");
    store
        .add_student(&PersonDraft::new("S2", "Ben", "21", "ben@x.edu"), ["C1", "C2"])
        .expect("ben");
    store
}

fn labels(store: &SchoolRecordStore, criterion: SearchCriterion, query: &str) -> Vec<String> {
    store
        .search(criterion, query)
        .map(|hit| hit.expect("hit").to_string())
        .collect()
}

#[test]
fn empty_name_query_returns_everyone() {
    let store = store();
    assert_eq!(
        labels(&store, SearchCriterion::Name, ""),
        vec![
            "Student: Amy, ID: S1",
            "Student: Ben, ID: S2",
            "Instructor: Jane Doe, ID: I1",
        ]
    );
}

#[test]
fn course_search_includes_enrolled_students() {
    let store = store();
    let hits: Vec<SearchHit> = store
        .search(SearchCriterion::Course, "algebra")
        .collect::<Result<_, _>>()
        .expect("search");

    assert_eq!(hits.len(), 3);
    match &hits[0] {
        SearchHit::Course(course) => assert_eq!(course.id, "C1"),
        other => panic!("expected course hit, got {other:?}"),
    }
    let enrolled: Vec<&str> = hits[1..]
        .iter()
        .map(|hit| match hit {
            SearchHit::EnrolledStudent {
                course_id,
                student_id,
                ..
            } => {
                assert_eq!(course_id, "C1");
                student_id.as_str()
            }
            other => panic!("expected enrolled student, got {other:?}"),
        })
        .collect();
    assert_eq!(enrolled, vec!["S1", "S2"]);
}

#[test]
fn course_search_matches_ids_too() {
    let store = store();
    assert_eq!(
        labels(&store, SearchCriterion::Course, "c2"),
        vec![
            "Course: History (ID: C2), Instructor: I1",
            " - Student: Ben, ID: S2",
        ]
    );
}

#[test]
fn name_and_id_searches_are_case_insensitive_substrings() {
    let store = store();
    assert_eq!(
        labels(&store, SearchCriterion::Name, "DOE"),
        vec!["Instructor: Jane Doe, ID: I1"]
    );
    assert_eq!(
        labels(&store, SearchCriterion::Id, "s"),
        vec!["Student: Amy, ID: S1", "Student: Ben, ID: S2"]
    );
}

#[test]
fn case_folding_covers_non_ascii_letters() {
    let mut store = store();
    store
        .add_instructor(&PersonDraft::new("I2", "élodie", "38", "elodie@x.edu"))
        .expect("instructor");
    store
        .add_course(&CourseDraft::new("C3", "Ökologie").taught_by("I2"))
        .expect("course");

    assert_eq!(
        labels(&store, SearchCriterion::Name, "ÉLODIE"),
        vec!["Instructor: élodie, ID: I2"]
    );
    assert_eq!(
        labels(&store, SearchCriterion::Course, "öKO"),
        vec!["Course: Ökologie (ID: C3), Instructor: I2"]
    );
}

#[test]
fn wildcards_in_the_query_match_literally() {
    let store = store();
    assert!(labels(&store, SearchCriterion::Name, "%").is_empty());
    assert!(labels(&store, SearchCriterion::Id, "_").is_empty());
}

#[test]
fn unknown_criterion_is_a_validation_error() {
    let store = store();
    let err = store.search_by("Select Criteria", "amy").err().expect("error");
    assert_eq!(err.kind(), ErrorKind::Validation);

    let hits = store.search_by("name", "amy").expect("criterion").count();
    assert_eq!(hits, 1);
}

#[test]
fn results_stop_when_the_caller_stops() {
    let store = store();
    let first = store
        .search(SearchCriterion::Course, "")
        .next()
        .expect("a hit")
        .expect("ok");
    assert_eq!(first.to_string(), "Course: Algebra I (ID: C1), Instructor: I1");
}
