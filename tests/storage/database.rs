//! Integration tests for transactions, concurrent commits, and persistence

use std::sync::Arc;
use std::thread;

use moorhen_foundation::{Error, ObjectId, PropertyBag, Result, Value};
use moorhen_storage::{Database, DocumentStore, MemoryStore};

fn with_room(db: &Database) -> ObjectId {
    db.transact(|w| {
        let room = w.create_class("room", None, PropertyBag::new())?;
        let hall = w.instantiate(room, None)?;
        w.set_property(hall, "name", "Hallway")?;
        Ok(hall)
    })
    .unwrap()
}

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn each_commit_bumps_the_version() {
    let db = Database::new(3);
    assert_eq!(db.version(), 0);
    let hall = with_room(&db);
    assert_eq!(db.version(), 1);

    db.transact(|w| w.set_property(hall, "lit", true)).unwrap();
    assert_eq!(db.version(), 2);

    // Read-only transactions publish nothing
    let name = db
        .transact(|w| Ok(w.get_str_or(hall, "name", "")))
        .unwrap();
    assert_eq!(name, "Hallway");
    assert_eq!(db.version(), 2);
}

#[test]
fn snapshots_do_not_see_later_commits() {
    let db = Database::new(3);
    let hall = with_room(&db);
    let before = db.snapshot();

    db.transact(|w| w.set_property(hall, "name", "Atrium")).unwrap();

    assert_eq!(before.get_str_or(hall, "name", ""), "Hallway");
    assert_eq!(db.read(|w| w.get_str_or(hall, "name", "")), "Atrium");
}

#[test]
fn failed_transactions_publish_nothing() {
    let db = Database::new(3);
    let hall = with_room(&db);
    let version = db.version();

    let result: Result<()> = db.transact(|w| {
        w.set_property(hall, "name", "Atrium")?;
        let room = w.class_by_name("room").map(|c| c.id).unwrap();
        w.instantiate(room, Some(hall))?;
        Err(Error::raised("changed my mind"))
    });

    assert!(result.is_err());
    assert_eq!(db.version(), version);
    db.read(|w| {
        assert_eq!(w.get_str_or(hall, "name", ""), "Hallway");
        assert!(w.objects_in(Some(hall)).is_empty());
    });
}

#[test]
fn parallel_writers_do_not_lose_updates() {
    let db = Database::new(3);
    let hall = with_room(&db);

    let writers: Vec<_> = (0..8)
        .map(|n| {
            let db = db.clone();
            thread::spawn(move || {
                db.transact(|w| w.set_property(hall, &format!("mark{n}"), i64::from(n)))
                    .unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    db.read(|w| {
        for n in 0..8 {
            assert_eq!(w.get_int_or(hall, &format!("mark{n}"), -1), i64::from(n));
        }
    });
    assert_eq!(db.version(), 9);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn worlds_survive_a_file_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let db = Database::with_store(Arc::clone(&store) as Arc<dyn DocumentStore>, 8);
    let hall = with_room(&db);
    db.transact(|w| w.set_property(hall, "tags", Value::list(["dusty", "long"].map(Value::from))))
        .unwrap();

    let path = std::env::temp_dir().join(format!("moorhen-store-{}.mpk", std::process::id()));
    store.save_to_file(&path).unwrap();
    let loaded = MemoryStore::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let reopened = Database::open(Arc::new(loaded), 8).unwrap();
    reopened.read(|w| {
        assert_eq!(w.display_name(hall), "Hallway");
        assert_eq!(
            w.get_property(hall, "tags").unwrap(),
            Some(&Value::list(["dusty", "long"].map(Value::from)))
        );
    });
}

#[test]
fn loading_a_missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("moorhen-store-does-not-exist.mpk");
    let err = MemoryStore::load_from_file(&path).unwrap_err();
    assert!(matches!(err.kind, moorhen_foundation::ErrorKind::Io(_)));
}
