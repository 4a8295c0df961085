//! Integration tests for evaluating scripts against a world

use moorhen_foundation::{ErrorKind, ObjectId, Value};
use moorhen_runtime::{ExecutionContext, RuntimeConfig, ScriptHost, core_world, spawn_player};
use moorhen_storage::Database;

fn setup() -> (ScriptHost, ObjectId) {
    let db = Database::new(5);
    core_world(&db).unwrap();
    let ada = spawn_player(&db, "Ada", true).unwrap();
    (ScriptHost::new(db, RuntimeConfig::default()), ada)
}

fn eval(source: &str) -> Value {
    let (host, ada) = setup();
    host.execute(source, &ExecutionContext::new().with_caller(ada))
        .unwrap()
}

fn fault_message(source: &str) -> String {
    let (host, ada) = setup();
    let err = host
        .execute(source, &ExecutionContext::new().with_caller(ada))
        .unwrap_err();
    err.as_script_fault().expect("script fault").message.clone()
}

// =============================================================================
// Pure evaluation
// =============================================================================

#[test]
fn arithmetic_keeps_integers_integral() {
    assert_eq!(eval("(+ 1 2 3)"), Value::Int(6));
    assert_eq!(eval("(/ 7 2)"), Value::Int(3));
    assert_eq!(eval("(/ 7.0 2)"), Value::Float(3.5));
    assert_eq!(eval("(mod -7 3)"), Value::Int(2));
    assert_eq!(eval("(max 3 9 4)"), Value::Int(9));
}

#[test]
fn control_flow_and_locals() {
    assert_eq!(
        eval("(let [n 0] (for [i (range 5)] (set! n (+ n i))) n)"),
        Value::Int(10)
    );
    assert_eq!(
        eval("(let [n 1] (while (< n 100) (set! n (* n 2))) n)"),
        Value::Int(128)
    );
    assert_eq!(eval("(and 1 nil 2)"), Value::Nil);
    assert_eq!(eval("(or nil false 3)"), Value::Int(3));
    assert_eq!(eval("(when false 1)"), Value::Nil);
    assert_eq!(eval("(unless false 1)"), Value::Int(1));
    assert_eq!(eval("(if 0 \"zero is true\" \"no\")"), Value::from("zero is true"));
}

#[test]
fn strings_and_lists() {
    assert_eq!(eval("(join (split \"a b  c\") \"-\")"), Value::from("a-b-c"));
    assert_eq!(eval("(substring \"moorhen\" 1 4)"), Value::from("oor"));
    assert_eq!(eval("(upper (trim \"  hi \"))"), Value::from("HI"));
    assert_eq!(eval("(count \"h\u{e9}llo\")"), Value::Int(5));
    assert_eq!(eval("\"tab\\there\""), Value::from("tab\there"));
    assert_eq!(
        eval("(reverse (append [1 2] 3))"),
        Value::list([3, 2, 1].map(Value::Int))
    );
    assert_eq!(eval("(nth [1 2] 5)"), Value::Nil);
    assert_eq!(eval("(contains? [1 2 3] 2.0)"), Value::Bool(true));
    assert_eq!(eval("(type-of 1.5)"), Value::from("float"));
}

// =============================================================================
// The object graph
// =============================================================================

#[test]
fn context_variables_reach_the_world() {
    assert_eq!(eval("(get caller \"name\")"), Value::from("Ada"));
    assert_eq!(eval("(class-of caller)"), Value::from("player"));
    assert_eq!(eval("(is-a? caller \"thing\")"), Value::Bool(true));
    assert_eq!(eval("(get (location caller) \"name\")"), Value::from("The Lobby"));
    assert_eq!(eval("(handle #0)"), Value::Int(0));
    assert_eq!(eval("(class \"ROOM\")"), Value::from("room"));
    assert_eq!(eval("(class \"nothing\")"), Value::Nil);
    assert_eq!(eval("(permission? caller \"programmer\")"), Value::Bool(true));
}

#[test]
fn writes_are_committed_with_the_snippet() {
    let (host, ada) = setup();
    let context = ExecutionContext::new().with_caller(ada);
    let lamp = host
        .execute(
            "(let [lamp (create \"item\" caller)] (set lamp \"name\" \"lamp\") lamp)",
            &context,
        )
        .unwrap();
    let lamp = lamp.as_object().expect("object");

    host.database().read(|w| {
        assert_eq!(w.display_name(lamp), "lamp");
        assert_eq!(w.instance(lamp).unwrap().location, Some(ada));
    });
    assert_eq!(
        host.execute("(count (contents caller))", &context).unwrap(),
        Value::Int(1)
    );
}

#[test]
fn functions_are_called_with_their_owner_as_this() {
    assert_eq!(
        eval("(call (location caller) \"describe\")"),
        Value::from("A plain room with bare walls. Everything starts here.")
    );
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn runtime_errors_become_faults() {
    assert_eq!(fault_message("(error \"bad \" 3)"), "bad 3");
    assert!(fault_message("(/ 1 0)").contains("division by zero"));
    assert!(fault_message("(+ 1 \"a\")").contains("type mismatch"));
    assert!(fault_message("(random 0)").contains("positive"));
}

#[test]
fn compile_errors_are_not_faults() {
    let (host, ada) = setup();
    let err = host
        .execute("(frob)", &ExecutionContext::new().with_caller(ada))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CompilationError(_)));
}

#[test]
fn runaway_loops_hit_the_tick_limit() {
    let db = Database::new(5);
    let host = ScriptHost::new(db, RuntimeConfig::default().with_max_ticks(500));
    let err = host
        .execute("(while true nil)", &ExecutionContext::new())
        .unwrap_err();
    let fault = err.as_script_fault().expect("script fault");
    assert!(fault.message.contains("max ticks (500) exceeded"));
}

#[test]
fn huge_ranges_fail_fast_under_the_default_limits() {
    let started = std::time::Instant::now();
    let message = fault_message("(count (range 1000000000))");
    assert!(message.contains("max ticks (100000) exceeded"), "{message}");
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[test]
fn doubling_strings_are_bounded_by_the_tick_limit() {
    let message = fault_message("(let [s \"ab\"] (while true (set! s (str s s))) (count s))");
    assert!(message.contains("max ticks (100000) exceeded"), "{message}");
}

#[test]
fn deeply_nested_snippets_are_compile_errors() {
    let (host, ada) = setup();
    let source = format!("{}1{}", "(do ".repeat(5_000), ")".repeat(5_000));
    let err = host
        .execute(&source, &ExecutionContext::new().with_caller(ada))
        .unwrap_err();
    let ErrorKind::CompilationError(diagnostics) = &err.kind else {
        panic!("expected a compilation error, got {err}");
    };
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("nested deeper than"));

    // Nesting up to the limit still runs
    let source = format!("{}1{}", "(do ".repeat(60), ")".repeat(60));
    assert_eq!(
        host.execute(&source, &ExecutionContext::new().with_caller(ada))
            .unwrap(),
        Value::Int(1)
    );
}
