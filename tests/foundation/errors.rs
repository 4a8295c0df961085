//! Integration tests for Error types and fault reports
//!
//! Tests error construction, display, and script fault formatting.

use moorhen_foundation::{
    Diagnostic, Error, ErrorKind, ExecutionLimit, FrameKind, ScriptFault, StackFrame, Type,
};

fn frame(owner: &str, name: &str, kind: FrameKind, line: u32) -> StackFrame {
    StackFrame {
        owner: owner.to_string(),
        name: name.to_string(),
        kind,
        line,
    }
}

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Int, Type::String);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.to_string(), "type mismatch: expected int, got string");
}

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch("2".to_string(), 3);
    let msg = err.to_string();
    assert!(msg.contains('2'));
    assert!(msg.contains('3'));
}

#[test]
fn error_limit_exceeded() {
    let err = Error::limit_exceeded(ExecutionLimit::MaxTicks { limit: 10 });
    assert!(err.to_string().contains("max ticks (10) exceeded"));
}

#[test]
fn compilation_errors_keep_every_diagnostic() {
    let err = Error::compilation(vec![
        Diagnostic::error("unbound symbol: x", 1, 1),
        Diagnostic::error("unbound symbol: y", 2, 5),
    ]);
    assert_eq!(err.diagnostics().map(<[Diagnostic]>::len), Some(2));
    let msg = err.to_string();
    assert!(msg.contains("1:1: error: unbound symbol: x"));
    assert!(msg.contains("2:5: error: unbound symbol: y"));
    assert!(err.is_script_error());
}

#[test]
fn raised_errors_display_their_message() {
    assert_eq!(Error::raised("the lamp is broken").to_string(), "the lamp is broken");
}

// =============================================================================
// Script Faults
// =============================================================================

#[test]
fn fault_lists_frames_innermost_first() {
    let mut fault = ScriptFault::new("division by zero", "(tell \"x\")\n(/ 1 0)");
    fault.stack.push(frame("#4", "poke", FrameKind::Verb, 2));
    fault.stack.push(frame("class room", "describe", FrameKind::Function, 1));

    let text = fault.to_string();
    let inner = text.find("verb #4:poke").unwrap();
    let outer = text.find("function class room:describe").unwrap();
    assert!(inner < outer);
    assert_eq!(fault.offending_line(), Some("(/ 1 0)"));
}

#[test]
fn fault_errors_expose_the_fault() {
    let err = Error::script_fault(ScriptFault::new("boom", "(error \"boom\")"));
    assert_eq!(err.as_script_fault().map(|f| f.message.as_str()), Some("boom"));
    assert!(Error::not_found("x").as_script_fault().is_none());
}
