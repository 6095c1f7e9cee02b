use crate::error::EngineError;
use crate::instance::{Instance, TableState};
use crate::tests::fixtures::{alice, person_schema};

#[test]
fn fresh_table_starts_unopened_and_transitions_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    assert_eq!(instance.state_of("people"), TableState::Unopened);
    let table = instance.open_table(person_schema("people")).unwrap();
    assert_eq!(instance.state_of("people"), TableState::Open);
    table.save(&alice()).unwrap();
}

#[test]
fn opening_an_already_open_table_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let _table = instance.open_table(person_schema("people")).unwrap();
    let err = instance.open_table(person_schema("people")).unwrap_err();
    assert!(matches!(err, EngineError::UsageError(_)));
}

#[test]
fn closing_then_reopening_a_table_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let table = instance.open_table(person_schema("people")).unwrap();
    table.save(&alice()).unwrap();
    drop(table);
    instance.close_table("people");
    assert_eq!(instance.state_of("people"), TableState::Unopened);

    let reopened = instance.open_table(person_schema("people")).unwrap();
    assert_eq!(reopened.len(), 1);
}

#[test]
fn purging_a_table_deletes_its_files_and_reopen_recreates_them_empty() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let table = instance.open_table(person_schema("people")).unwrap();
    table.save(&alice()).unwrap();
    drop(table);
    instance.close_table("people");

    instance.purge_table("people").unwrap();
    assert_eq!(instance.state_of("people"), TableState::Purged);
    assert!(!dir.path().join("people.data").exists());
    assert!(!dir.path().join("people.index").exists());

    // `Purged —open→ Open` re-creates the table's files from scratch (spec §4.6).
    let reopened = instance.open_table(person_schema("people")).unwrap();
    assert_eq!(instance.state_of("people"), TableState::Open);
    assert!(reopened.is_empty());
    assert!(reopened.load_by_key(&config::PrimaryKey::I32(1)).unwrap().is_none());
}

#[test]
fn purging_a_table_still_open_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let _table = instance.open_table(person_schema("people")).unwrap();
    let err = instance.purge_table("people").unwrap_err();
    assert!(matches!(err, EngineError::UsageError(_)));
}

#[test]
fn purging_the_whole_schema_recreates_an_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let table = instance.open_table(person_schema("people")).unwrap();
    table.save(&alice()).unwrap();
    drop(table);
    instance.close_table("people");

    instance.purge_schema().unwrap();
    assert!(dir.path().exists());
    assert!(!dir.path().join("people.data").exists());
    assert_eq!(instance.state_of("people"), TableState::Unopened);

    let reopened = instance.open_table(person_schema("people")).unwrap();
    assert!(reopened.is_empty());
}

#[test]
fn purging_the_whole_schema_with_an_open_table_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let instance = Instance::open(dir.path()).unwrap();

    let _table = instance.open_table(person_schema("people")).unwrap();
    let err = instance.purge_schema().unwrap_err();
    assert!(matches!(err, EngineError::UsageError(_)));
}
