use rusqlite::Connection;
use std::sync::Arc;
use wings_core::db::open_db_in_memory;
use wings_core::model::native::NativeModelCatalog;
use wings_core::{Literal, NativeModel, NativeObject, NativeStore, SqliteNativeStore, StoreError};

fn catalog() -> NativeModelCatalog {
    let mut catalog = NativeModelCatalog::new();
    catalog.insert(Arc::new(
        NativeModel::new("Work").required_property("title", false),
    ));
    catalog.insert(Arc::new(
        NativeModel::new("Set")
            .property("title", false)
            .with_ordered_members(),
    ));
    catalog
}

fn work(catalog: &NativeModelCatalog, title: &str) -> NativeObject {
    let mut object = NativeObject::new(catalog.get("Work").unwrap());
    object.set_property("title", vec![Literal::text(title)]);
    object
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let catalog = catalog();

    let err = SqliteNativeStore::try_new(&conn, &catalog).err().unwrap();

    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn save_creates_then_updates_under_same_id() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();

    let mut object = work(&catalog, "Foo");
    assert!(object.new_record);
    store.save(&mut object).unwrap();
    assert!(!object.new_record);
    let id = object.id.clone().unwrap();
    let created = object.create_date.clone();

    object.set_property("title", vec![Literal::text("Bar")]);
    store.save(&mut object).unwrap();

    let loaded = store.find(&id).unwrap();
    assert_eq!(loaded.property("title"), &[Literal::text("Bar")]);
    assert_eq!(loaded.create_date, created);
    assert!(loaded.modified_date[0] > loaded.create_date[0]);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn updated_at_is_strictly_monotonic_across_rapid_saves() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    let mut object = work(&catalog, "Foo");
    store.save(&mut object).unwrap();

    let mut previous = object.modified_date[0];
    for _ in 0..5 {
        store.save(&mut object).unwrap();
        assert!(object.modified_date[0] > previous);
        previous = object.modified_date[0];
    }
}

#[test]
fn save_validates_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();

    let mut object = NativeObject::with_id(catalog.get("Work").unwrap(), "w-1");
    object.set_property("colour", vec![Literal::text("red")]);
    let err = store.save(&mut object).unwrap_err();

    match err {
        StoreError::RecordInvalid(invalid) => {
            assert_eq!(
                invalid.to_string(),
                "Validation failed: colour is not a known property, title can't be blank"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!store.exists("w-1").unwrap());
}

#[test]
fn save_rejects_id_stored_under_another_model() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    let mut existing = NativeObject::with_id(catalog.get("Set").unwrap(), "shared");
    store.save(&mut existing).unwrap();

    let mut clash = NativeObject::with_id(catalog.get("Work").unwrap(), "shared");
    clash.set_property("title", vec![Literal::text("Foo")]);

    assert!(matches!(
        store.save(&mut clash).unwrap_err(),
        StoreError::InvalidData(_)
    ));
}

#[test]
fn ordered_members_are_written_independently_of_owner() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();

    let mut set = NativeObject::new(catalog.get("Set").unwrap());
    set.ordered_member_ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
    store.save_ordered_members(&mut set).unwrap();

    let id = set.id.clone().unwrap();
    assert!(!store.exists(&id).unwrap());
    assert_eq!(store.ordered_member_ids(&id).unwrap(), vec!["b", "a", "b"]);

    store.save(&mut set).unwrap();
    set.ordered_member_ids = vec!["c".to_string()];
    store.save_ordered_members(&mut set).unwrap();
    assert_eq!(store.find(&id).unwrap().ordered_member_ids, vec!["c"]);
}

#[test]
fn delete_removes_object_members_and_document() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    let mut set = NativeObject::with_id(catalog.get("Set").unwrap(), "s-1");
    set.set_property("title", vec![Literal::text("Shelf")]);
    set.ordered_member_ids = vec!["x".to_string()];
    store.save_ordered_members(&mut set).unwrap();
    store.save(&mut set).unwrap();

    store.delete("s-1").unwrap();

    assert!(matches!(store.find("s-1"), Err(StoreError::NotFound(id)) if id == "s-1"));
    assert!(store.ordered_member_ids("s-1").unwrap().is_empty());
    let documents: i64 = conn
        .query_row("SELECT COUNT(*) FROM search_documents;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(documents, 0);
    assert!(matches!(store.delete("s-1"), Err(StoreError::NotFound(_))));
}

#[test]
fn all_filters_by_model_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    for title in ["one", "two"] {
        store.save(&mut work(&catalog, title)).unwrap();
    }
    store
        .save(&mut NativeObject::new(catalog.get("Set").unwrap()))
        .unwrap();

    assert_eq!(store.all(None).unwrap().len(), 3);
    let works = store.all(Some("Work")).unwrap();
    let titles: Vec<_> = works
        .iter()
        .map(|object| object.property("title")[0].clone())
        .collect();
    assert_eq!(titles, vec![Literal::text("one"), Literal::text("two")]);
}

#[test]
fn clean_empties_every_table() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    let mut set = NativeObject::new(catalog.get("Set").unwrap());
    set.ordered_member_ids = vec!["x".to_string()];
    store.save_ordered_members(&mut set).unwrap();
    store.save(&mut set).unwrap();

    store.clean().unwrap();

    assert_eq!(store.count().unwrap(), 0);
    assert!(store
        .ordered_member_ids(set.id.as_deref().unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn unknown_model_rows_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog();
    let store = SqliteNativeStore::try_new(&conn, &catalog).unwrap();
    store.save(&mut work(&catalog, "Foo")).unwrap();

    let empty = NativeModelCatalog::new();
    let blind = SqliteNativeStore::try_new(&conn, &empty).unwrap();
    assert!(matches!(
        blind.all(None).unwrap_err(),
        StoreError::UnknownModel(model) if model == "Work"
    ));
}
