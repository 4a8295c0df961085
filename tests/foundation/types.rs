//! Integration tests for Type descriptors and object handles

use moorhen_foundation::{Handle, Type};

// =============================================================================
// Types
// =============================================================================

#[test]
fn type_names_parse() {
    assert_eq!("int".parse::<Type>().unwrap(), Type::Int);
    assert_eq!("string?".parse::<Type>().unwrap(), Type::option(Type::String));
    assert_eq!("".parse::<Type>().unwrap(), Type::Any);
    assert!("dragon".parse::<Type>().is_err());
}

#[test]
fn float_accepts_int_but_not_the_reverse() {
    assert!(Type::Float.accepts(&Type::Int));
    assert!(!Type::Int.accepts(&Type::Float));
}

#[test]
fn optional_types_accept_nil() {
    let t = Type::option(Type::Object);
    assert!(t.accepts(&Type::Nil));
    assert!(t.accepts(&Type::Object));
    assert!(!t.accepts(&Type::String));
    assert_eq!(t.to_string(), "object?");
}

#[test]
fn any_accepts_everything() {
    for t in [Type::Nil, Type::Bool, Type::List, Type::Timestamp] {
        assert!(Type::Any.accepts(&t));
    }
}

// =============================================================================
// Handles
// =============================================================================

#[test]
fn handles_parse_with_or_without_hash() {
    assert_eq!("#12".parse::<Handle>().unwrap(), Handle::new(12));
    assert_eq!("7".parse::<Handle>().unwrap(), Handle::new(7));
    assert!("#x".parse::<Handle>().is_err());
    assert!("lamp".parse::<Handle>().is_err());
}

#[test]
fn handles_display_with_hash() {
    assert_eq!(Handle::new(0).to_string(), "#0");
    assert_eq!(Handle::new(4).next(), Handle::new(5));
}
