//! Faults roll back the whole command and report the call stack

use moorhen_foundation::FrameKind;
use moorhen_runtime::RuntimeConfig;
use moorhen_storage::{FunctionSpec, VerbSpec};

use crate::fixture::{Fixture, class};

/// Spreads one failing call across three owners. `poke` on the lobby
/// writes, talks, and calls `boom` on the lamp, which the `item` class
/// provides. `boom` calls the lamp's own `fuse`, which divides by zero.
fn with_poke(f: &Fixture) {
    let (lobby, lamp) = (f.lobby, f.lamp);
    f.database()
        .transact(|w| {
            let item = class(w, "item");
            w.add_function(lamp, FunctionSpec::new("fuse", "(/ 1 0)"))?;
            w.add_verb(item, VerbSpec::new("boom", "nil\n(call this \"fuse\")"))?;
            w.add_verb(
                lobby,
                VerbSpec::new(
                    "poke",
                    "(set this \"poked\" true)\n(tell \"poking\")\n(call-verb #4 \"boom\")",
                ),
            )
        })
        .unwrap();
}

#[test]
fn fault_stack_lists_innermost_frame_first() {
    let f = Fixture::new();
    with_poke(&f);
    let err = f
        .dispatcher
        .host()
        .call_verb(f.lobby, "poke", Vec::new(), Some(f.ada.id))
        .unwrap_err();

    let fault = err.as_script_fault().expect("script fault");
    let frames: Vec<_> = fault
        .stack
        .iter()
        .map(|frame| (frame.owner.as_str(), frame.name.as_str(), frame.kind, frame.line))
        .collect();
    assert_eq!(
        frames,
        vec![
            ("#4", "fuse", FrameKind::Function, 1),
            ("class item", "boom", FrameKind::Verb, 2),
            ("#1", "poke", FrameKind::Verb, 3),
        ]
    );
    assert_eq!(fault.offending_line(), Some("(/ 1 0)"));
    assert!(fault.message.contains("division by zero"));
}

#[test]
fn faulted_commands_leave_no_writes_and_send_nothing_else() {
    let mut f = Fixture::new();
    with_poke(&f);
    let version = f.database().version();

    let replies = f.ada("poke");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Script error: division by zero"));
    assert!(replies[0].contains("> (/ 1 0)"));

    let lobby = f.lobby;
    assert_eq!(f.database().version(), version);
    assert!(f.database().read(|w| w.get_property(lobby, "poked").unwrap().is_none()));
}

#[test]
fn notifications_arrive_only_after_commit() {
    let mut f = Fixture::new();
    let lobby = f.lobby;
    f.database()
        .transact(|w| {
            w.add_verb(
                lobby,
                VerbSpec::new(
                    "ping",
                    "(notify #6 \"ping\")\n(when (> (count args) 0) (error \"stop\"))",
                )
                .with_pattern("*"),
            )
        })
        .unwrap();

    // The failing run queued a notification that is never delivered
    let replies = f.ada("ping now");
    assert!(replies[0].starts_with("Script error: stop"));
    assert!(f.bob.conn.take_messages().is_empty());

    // Direct calls commit and deliver
    f.dispatcher
        .host()
        .call_verb(lobby, "ping", Vec::new(), Some(f.ada.id))
        .unwrap();
    assert_eq!(f.bob.conn.take_messages(), vec!["ping"]);
}

#[test]
fn runaway_commands_are_stopped() {
    let mut f = Fixture::with_config(RuntimeConfig::default().with_max_ticks(200));
    let replies = f.ada("@eval (while true nil)");
    assert!(replies[0].starts_with("Script error: max ticks (200) exceeded"));

    // The next command gets a fresh budget
    assert_eq!(f.ada("@eval (+ 1 1)"), vec!["=> 2"]);
}

#[test]
fn deep_recursion_hits_the_depth_limit() {
    let mut f = Fixture::with_config(RuntimeConfig::default().with_max_depth(8));
    let lobby = f.lobby;
    f.database()
        .transact(|w| w.add_verb(lobby, VerbSpec::new("loop", "(call-verb this \"loop\")")))
        .unwrap();

    let replies = f.ada("@eval (call-verb #1 \"loop\")");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Script error:"));
    assert!(replies[0].contains("depth"));
}
