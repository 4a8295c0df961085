//! Actors running in parallel against one database

use std::sync::Arc;

use moorhen_runtime::{ActorWorker, BufferedConnection, spawn_player};

use crate::fixture::Fixture;

const BUMP: &str = "@eval (set caller \"count\" (+ (get-or caller \"count\" 0) 1))";
const BUMP_LAMP: &str = "@eval (set #4 \"count\" (+ (get-or #4 \"count\" 0) 1))";

#[test]
fn parallel_actors_keep_every_update() {
    let f = Fixture::new();
    let db = f.database();
    let players: Vec<_> = ["Cy", "Di", "Ed"]
        .into_iter()
        .map(|name| spawn_player(db, name, true).unwrap())
        .collect();

    let workers: Vec<_> = players
        .iter()
        .map(|&id| {
            let conn = Arc::new(BufferedConnection::new());
            let session = f.dispatcher.connect(id, conn.clone());
            let worker = ActorWorker::spawn(Arc::clone(&f.dispatcher), session).unwrap();
            (worker, conn)
        })
        .collect();
    for _ in 0..20 {
        for (worker, _) in &workers {
            assert!(worker.submit(BUMP));
        }
    }

    let mut replies = Vec::new();
    for (worker, conn) in workers {
        worker.join();
        replies.push(conn.messages());
    }

    let expected: Vec<String> = (1..=20).map(|n| format!("=> {n}")).collect();
    for messages in replies {
        assert_eq!(messages, expected);
    }
    db.read(|w| {
        for &id in &players {
            assert_eq!(w.get_int_or(id, "count", 0), 20);
        }
    });
}

#[test]
fn parallel_increments_of_one_property_all_count() {
    const ROUNDS: usize = 25;
    let f = Fixture::new();
    let db = f.database();

    let workers: Vec<_> = ["Cy", "Di", "Ed", "Fay"]
        .into_iter()
        .map(|name| {
            let id = spawn_player(db, name, true).unwrap();
            let conn = Arc::new(BufferedConnection::new());
            let session = f.dispatcher.connect(id, conn.clone());
            let worker = ActorWorker::spawn(Arc::clone(&f.dispatcher), session).unwrap();
            (worker, conn)
        })
        .collect();
    for _ in 0..ROUNDS {
        for (worker, _) in &workers {
            assert!(worker.submit(BUMP_LAMP));
        }
    }

    let mut seen = Vec::new();
    for (worker, conn) in workers {
        worker.join();
        let messages = conn.messages();
        assert_eq!(messages.len(), ROUNDS);
        seen.extend(
            messages
                .iter()
                .filter_map(|m| m.strip_prefix("=> "))
                .map(|n| n.parse::<i64>().unwrap()),
        );
    }

    // Every committed increment saw a distinct count
    seen.sort_unstable();
    let committed = i64::try_from(seen.len()).unwrap();
    assert!(committed > 0);
    assert_eq!(seen, (1..=committed).collect::<Vec<_>>());
    assert_eq!(db.read(|w| w.get_int_or(f.lamp, "count", 0)), committed);
}

#[test]
fn speech_crosses_worker_threads() {
    let f = Fixture::new();
    let ada_conn = Arc::clone(&f.ada.conn);
    let bob_conn = Arc::clone(&f.bob.conn);
    let ada = ActorWorker::spawn(Arc::clone(&f.dispatcher), f.ada.session).unwrap();

    ada.submit("say hi Bob");
    ada.join();

    assert_eq!(ada_conn.messages(), vec!["You say, \"hi Bob\""]);
    assert_eq!(bob_conn.messages(), vec!["Ada says, \"hi Bob\""]);
}
