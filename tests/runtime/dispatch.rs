//! Built-in commands, permissions, and multi-line code entry

use moorhen_runtime::{Connection, Outcome, UNKNOWN_COMMAND};

use crate::fixture::Fixture;

#[test]
fn unknown_input_gets_the_fixed_reply() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("xyzzy"), vec![UNKNOWN_COMMAND]);
    assert!(f.ada("   ").is_empty());
}

#[test]
fn eval_requires_the_programmer_flag() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("@eval (+ 1 2)"), vec!["=> 3"]);
    assert_eq!(
        f.bob("@eval (+ 1 2)"),
        vec!["Permission denied: programmer permission required"]
    );
    assert_eq!(
        f.bob("@program #1:look"),
        vec!["Permission denied: programmer permission required"]
    );
}

#[test]
fn eval_results_render_as_values() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("@eval \"text\""), vec!["=> text"]);
    assert_eq!(f.ada("@eval [1 \"a\" nil]"), vec!["=> [1 a nil]"]);
    assert_eq!(f.ada("@eval (get #1 \"name\")"), vec!["=> The Lobby"]);
}

#[test]
fn multi_line_eval() {
    let mut f = Fixture::new();
    let prompt = f.ada("@eval");
    assert_eq!(prompt.len(), 1);
    assert!(f.ada.session.is_buffering());

    assert!(f.ada("(let [x 2]").is_empty());
    assert!(f.ada("  (* x 21))").is_empty());
    assert_eq!(f.ada("."), vec!["=> 42"]);
    assert!(!f.ada.session.is_buffering());
}

#[test]
fn aborting_discards_the_buffer() {
    let mut f = Fixture::new();
    f.ada("@eval");
    f.ada("(tell \"never\")");
    assert_eq!(f.ada("@abort"), vec!["Aborted."]);
    assert!(!f.ada.session.is_buffering());
    assert_eq!(f.ada("@abort"), vec!["Nothing to abort."]);
}

#[test]
fn programming_replaces_verb_code() {
    let mut f = Fixture::new();
    assert_eq!(
        f.ada("@program #1:look"),
        vec!["Programming #1:look. End with \".\" on a line by itself, or @abort."]
    );
    f.ada("(tell \"Nothing to see.\")");
    assert_eq!(f.ada("."), vec!["Programmed #1:look."]);
    assert_eq!(f.ada("look"), vec!["Nothing to see."]);
}

#[test]
fn programs_that_do_not_compile_change_nothing() {
    let mut f = Fixture::new();
    f.ada("@program #1:look");
    f.ada("(frob)");
    assert_eq!(
        f.ada("."),
        vec!["Compilation failed:\n  1:2: error: unknown function: frob"]
    );
    assert_eq!(f.ada("look")[0], "The Lobby");
}

#[test]
fn program_needs_an_object_and_a_verb() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("@program #1"), vec!["Usage: @program #N:verb"]);
    assert_eq!(f.ada("@program #77:look"), vec!["Not found: object #77"]);
    assert_eq!(f.ada("@program #1:dance"), vec!["Not found: verb dance on #1"]);
    assert!(!f.ada.session.is_buffering());
}

#[test]
fn verbs_lists_everything_an_object_responds_to() {
    let mut f = Fixture::new();
    let listing = f.ada("@verbs #0");
    assert_eq!(listing, vec!["i*nventory [none] on #0"]);

    let listing = f.ada("@verbs #3").join("\n");
    assert!(listing.starts_with("go [this] on class exit"));
    assert!(listing.contains("take (get) [this] on class thing"));
}

#[test]
fn quitting_closes_the_connection() {
    let mut f = Fixture::new();
    let outcome = f.dispatcher.handle(&mut f.bob.session, "quit");
    assert_eq!(outcome, Outcome::Quit);
    assert_eq!(f.bob.conn.messages(), vec!["Goodbye."]);
    assert!(!f.bob.conn.is_connected());
    assert!(!f.dispatcher.host().connections().is_connected(f.bob.id));

    // Speech no longer reaches Bob
    f.ada("say bye");
    assert_eq!(f.bob.conn.messages(), vec!["Goodbye."]);
}

#[test]
fn help_lists_the_builtins() {
    let mut f = Fixture::new();
    let help = f.ada("help");
    assert!(help[0].contains("@eval <code>"));
    assert!(help[0].contains("@program #N:verb"));
}
