//! Export/import of whole-store snapshots, in memory and through files.

use pretty_assertions::assert_eq;
use school_records_manager::{
    CourseDraft, ErrorKind, PersonDraft, SchoolRecordStore, Snapshot,
};

fn seeded() -> SchoolRecordStore {
    let mut store = SchoolRecordStore::open_in_memory().expect("open");
    store
        .add_instructor(&PersonDraft::new("I1", "Jane", "40", "jane@x.edu"))
        .expect("instructor");
    store
        .add_course(&CourseDraft::new("C1", "Calculus").taught_by("I1"))
        .expect("course");
    store
        .add_course(&CourseDraft::new("C2", "Seminar"))
        .expect("unassigned course");
    store
        .add_student(&PersonDraft::new("S1", "Amy", "20", "amy@x.edu"), ["C1", "C2"])
        .expect("amy");
    store
        .add_student(&PersonDraft::new("S2", "Ben", "21", "ben@x.edu"), ["C2"])
        .expect("ben");
    store
}

fn sorted(mut snapshot: Snapshot) -> Snapshot {
    snapshot.students.sort_by(|a, b| a.id.cmp(&b.id));
    snapshot.instructors.sort_by(|a, b| a.id.cmp(&b.id));
    snapshot.courses.sort_by(|a, b| a.id.cmp(&b.id));
    snapshot.enrollments.sort();
    snapshot
}

#[test]
fn export_clear_import_round_trips() {
    let mut store = seeded();
    let exported = store.export_snapshot().expect("export");
    assert_eq!(exported.enrollments.len(), 3);

    store.clear_all().expect("clear");
    store.import_snapshot(&exported).expect("import");

    assert_eq!(
        sorted(store.export_snapshot().expect("export again")),
        sorted(exported)
    );
}

#[test]
fn import_replaces_existing_contents() {
    let source = seeded();
    let snapshot = source.export_snapshot().expect("export");

    let mut target = SchoolRecordStore::open_in_memory().expect("open");
    target
        .add_instructor(&PersonDraft::new("I9", "Old", "60", "old@x.edu"))
        .expect("old instructor");
    target.import_snapshot(&snapshot).expect("import");

    let instructors = target.list_instructors().expect("instructors");
    assert_eq!(instructors.len(), 1);
    assert_eq!(instructors[0].id, "I1");
}

#[test]
fn failed_import_keeps_previous_state() {
    let mut store = seeded();
    let before = store.export_snapshot().expect("export");

    let mut dangling = before.clone();
    dangling.enrollments.push(school_records_manager::Enrollment {
        student_id: "S1".into(),
        course_id: "C404".into(),
    });
    let err = store.import_snapshot(&dangling).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);

    let mut duplicated = before.clone();
    duplicated.students.push(duplicated.students[0].clone());
    let err = store.import_snapshot(&duplicated).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let mut orphan_course = before.clone();
    orphan_course.instructors.clear();
    let err = store.import_snapshot(&orphan_course).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);

    assert_eq!(store.export_snapshot().expect("export"), before);
}

#[test]
fn invalid_row_partway_through_import_keeps_previous_state() {
    let mut store = seeded();
    let before = store.export_snapshot().expect("export");

    let mut blank_name = before.clone();
    blank_name.students[1].name = "   ".into();
    let err = store.import_snapshot(&blank_name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("name"), "{err}");

    let mut negative_age = before.clone();
    negative_age.students[1].age = -3;
    let err = store.import_snapshot(&negative_age).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut blank_course = before.clone();
    blank_course.courses[1].name = String::new();
    let err = store.import_snapshot(&blank_course).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(store.export_snapshot().expect("export"), before);
}

#[test]
fn legacy_document_without_enrollments_imports() {
    let mut store = seeded();
    let snapshot = Snapshot::from_json(
        r#"{
            "students": [{"student_id": "S7", "name": "Cal", "age": 22, "email": "cal@x.edu"}],
            "instructors": [{"instructor_id": "I7", "name": "Max", "age": 50, "email": "max@x.edu"}],
            "courses": [{"course_id": "C7", "course_name": "Art", "instructor_id": "I7"}]
        }"#,
    )
    .expect("parse");

    store.import_snapshot(&snapshot).expect("import");
    assert!(store.list_enrollments().expect("enrollments").is_empty());
    assert_eq!(store.list_courses().expect("courses")[0].id, "C7");
}

#[test]
fn snapshot_files_round_trip_between_databases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("backup.json");

    let source = seeded();
    let written = source.export_to_file(&file).expect("export");

    let text = std::fs::read_to_string(&file).expect("read");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    for key in ["students", "instructors", "courses", "enrollments"] {
        assert!(value[key].is_array(), "missing {key}");
    }
    assert_eq!(value["courses"][1]["instructor_id"], serde_json::Value::Null);

    let mut target = SchoolRecordStore::open(dir.path().join("nested/school.sqlite")).expect("open");
    let read = target.import_from_file(&file).expect("import");
    assert_eq!(read, written);
    assert_eq!(
        sorted(target.export_snapshot().expect("export")),
        sorted(written)
    );
}

#[test]
fn malformed_file_leaves_store_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("broken.json");
    std::fs::write(&file, r#"{"students": [{"name": "no id"}]}"#).expect("write");

    let mut store = seeded();
    let before = store.export_snapshot().expect("export");

    let err = store.import_from_file(&file).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = store
        .import_from_file(dir.path().join("missing.json"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(store.export_snapshot().expect("export"), before);
}

#[test]
fn data_survives_reopening_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("school.sqlite");

    {
        let mut store = SchoolRecordStore::open(&path).expect("open");
        store
            .add_instructor(&PersonDraft::new("I1", "Jane", "40", "jane@x.edu"))
            .expect("instructor");
        store
            .add_course(&CourseDraft::new("C1", "Calculus").taught_by("I1"))
            .expect("course");
    }

    let mut store = SchoolRecordStore::open(&path).expect("reopen");
    assert_eq!(store.list_courses().expect("courses").len(), 1);

    // Foreign keys are enforced again after reopening, so the cascade still runs.
    store.delete_instructor("I1").expect("delete");
    assert!(store.list_courses().expect("courses").is_empty());
}
