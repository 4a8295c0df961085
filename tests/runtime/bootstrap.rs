//! Loading verb and function records into a running world

use std::sync::Arc;

use moorhen_foundation::ErrorKind;
use moorhen_runtime::{BootstrapFile, BootstrapLoader, LoadReport, core_world, spawn_player};
use moorhen_storage::{Database, DocumentStore, MemoryStore};

use crate::fixture::Fixture;

const EXTRA: &str = r#"{
  "verbs": [
    { "name": "xyzzy", "pattern": "none", "targetClass": "room",
      "code": ["(tell \"Nothing happens.\")"] },
    { "name": "hello", "code": ["(tell \"Hello, \" (get caller \"name\") \".\")"] }
  ],
  "functions": [
    { "name": "weigh", "targetClass": "item",
      "params": [{ "name": "n", "type": "int" }], "returns": "int",
      "code": ["(* n 2)"] }
  ]
}"#;

fn loader(f: &Fixture) -> BootstrapLoader {
    BootstrapLoader::new().with_system(f.dispatcher.host().system_object())
}

#[test]
fn loaded_records_are_playable() {
    let mut f = Fixture::new();
    let file = BootstrapFile::parse(EXTRA).unwrap();
    let report = loader(&f).load_into(f.database(), &file).unwrap();
    assert_eq!(
        report,
        LoadReport {
            created: 3,
            updated: 0,
            skipped: 0
        }
    );

    assert_eq!(f.ada("xyzzy"), vec!["Nothing happens."]);
    assert_eq!(f.bob("hello"), vec!["Hello, Bob."]);
    assert_eq!(f.ada("@eval (call #4 \"weigh\" 21)"), vec!["=> 42"]);
    let mismatch = f.ada("@eval (call #4 \"weigh\" \"x\")");
    assert!(mismatch[0].contains("type mismatch: expected int, got string"));
}

#[test]
fn reloading_skips_or_overwrites() {
    let mut f = Fixture::new();
    let file = BootstrapFile::parse(EXTRA).unwrap();
    loader(&f).load_into(f.database(), &file).unwrap();
    let version = f.database().version();

    let again = loader(&f).load_into(f.database(), &file).unwrap();
    assert_eq!(again.skipped, 3);
    assert_eq!(f.database().version(), version);

    let changed = EXTRA.replace("Nothing happens.", "A hollow voice says Fool.");
    let changed = BootstrapFile::parse(&changed).unwrap();
    let report = loader(&f)
        .overwrite(true)
        .load_into(f.database(), &changed)
        .unwrap();
    assert_eq!(report.updated, 3);
    assert_eq!(f.ada("xyzzy"), vec!["A hollow voice says Fool."]);
}

#[test]
fn a_bad_record_applies_nothing() {
    let mut f = Fixture::new();
    let bad = BootstrapFile::parse(
        r#"{ "verbs": [
            { "name": "xyzzy", "targetClass": "room", "code": ["nil"] },
            { "name": "roar", "targetClass": "dragon", "code": ["nil"] }
        ] }"#,
    )
    .unwrap();
    let version = f.database().version();

    let err = loader(&f).load_into(f.database(), &bad).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    assert_eq!(f.database().version(), version);
    assert_eq!(f.ada("xyzzy"), vec!["I don't understand that."]);
}

#[test]
fn core_world_survives_a_restart() {
    let store = Arc::new(MemoryStore::new());
    let db = Database::with_store(Arc::clone(&store) as Arc<dyn DocumentStore>, 3);
    let first = core_world(&db).unwrap();
    let ada = spawn_player(&db, "Ada", true).unwrap();
    assert_eq!(first.report.created, 8);

    let reopened = Database::open(store, 3).unwrap();
    let second = core_world(&reopened).unwrap();
    assert_eq!(second.system, first.system);
    assert_eq!(second.start_room, first.start_room);
    assert_eq!(
        second.report,
        LoadReport {
            created: 0,
            updated: 0,
            skipped: 8
        }
    );
    reopened.read(|w| {
        assert_eq!(w.display_name(ada), "Ada");
        assert_eq!(w.instance(ada).unwrap().location, Some(first.start_room));
    });
}
