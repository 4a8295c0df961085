//! Integration tests for parsing and compile diagnostics

use moorhen_foundation::{Diagnostic, ErrorKind, Severity};
use moorhen_language::{Ast, SPECIAL_FORMS, compile, compile_with_params, parse};

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    let err = compile(source).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CompilationError(_)));
    err.diagnostics().map(<[Diagnostic]>::to_vec).unwrap_or_default()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn forms_parse_in_order() {
    let output = parse("(tell \"hi\")\n; comment\n[1 2.5 nil]\n#3");
    assert!(!output.has_errors());
    assert_eq!(output.forms.len(), 3);
    assert!(matches!(output.forms[0], Ast::List(..)));
    assert!(matches!(output.forms[1], Ast::Vector(..)));
    assert!(matches!(output.forms[2], Ast::Handle(3, _)));
}

#[test]
fn every_syntax_error_is_reported() {
    let output = parse("(tell \"a\"))\n(tell ]\n(tell");
    let lines: Vec<u32> = output.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}

// =============================================================================
// Compilation
// =============================================================================

#[test]
fn a_clean_program_compiles_without_warnings() {
    let program = compile(
        "(let [here (location caller)]\n  (for [thing (contents here)]\n    (tell (get thing \"name\"))))",
    )
    .unwrap();
    assert!(program.warnings.is_empty());
    assert_eq!(program.slots, 2);
}

#[test]
fn all_errors_are_collected_with_positions() {
    let found = diagnostics("(tell \"ok\")\n(frob 1)\n  (get this)\n(tell nobody)");
    let summary: Vec<_> = found.iter().map(|d| (d.line, d.column, d.is_error())).collect();
    assert_eq!(summary, vec![(2, 2, true), (3, 4, true), (4, 7, true)]);
    assert!(found[0].message.contains("unknown function: frob"));
    assert!(found[2].message.contains("unbound symbol: nobody"));
}

#[test]
fn compilation_errors_render_one_line_per_diagnostic() {
    let err = compile("(frob)\n(zap)").unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("compilation failed:"));
    assert!(text.contains("1:2: error: unknown function: frob"));
    assert!(text.contains("2:2: error: unknown function: zap"));
}

#[test]
fn warnings_do_not_fail_compilation() {
    let program = compile("(let [spare 1 _ignored 2] nil)").unwrap();
    assert_eq!(program.warnings.len(), 1);
    assert_eq!(program.warnings[0].severity, Severity::Warning);
}

#[test]
fn parameters_are_bound_names() {
    let params = vec!["target".to_string()];
    assert!(compile_with_params("(get target \"name\")", &params).is_ok());
    assert!(compile("(get target \"name\")").is_err());
}

#[test]
fn special_forms_cannot_be_rebound() {
    for form in SPECIAL_FORMS {
        let source = format!("(let [{form} 1] nil)");
        assert!(compile(&source).is_err(), "{form} should be reserved");
    }
}
