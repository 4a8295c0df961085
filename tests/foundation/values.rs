//! Integration tests for Value and PropertyBag
//!
//! Tests typing, truthiness, display, and bag overlay semantics.

use moorhen_foundation::{ObjectId, PropertyBag, Type, Value};

// =============================================================================
// Values
// =============================================================================

#[test]
fn value_types() {
    assert_eq!(Value::Nil.value_type(), Type::Nil);
    assert_eq!(Value::from(3i64).value_type(), Type::Int);
    assert_eq!(Value::from("x").value_type(), Type::String);
    assert_eq!(Value::Object(ObjectId::new(1)).value_type(), Type::Object);
    assert_eq!(Value::list([Value::Int(1)]).value_type(), Type::List);
}

#[test]
fn only_nil_and_false_are_falsy() {
    assert!(!Value::Nil.is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(Value::Int(0).is_truthy());
    assert!(Value::from("").is_truthy());
    assert!(Value::list(Vec::new()).is_truthy());
}

#[test]
fn display_is_plain_text() {
    assert_eq!(Value::from("Hallway").to_string(), "Hallway");
    assert_eq!(Value::Int(-4).to_string(), "-4");
    assert_eq!(
        Value::list([Value::Int(1), Value::from("a"), Value::Nil]).to_string(),
        "[1 a nil]"
    );
}

#[test]
fn accessors_match_variants() {
    let id = ObjectId::new(9);
    assert_eq!(Value::Object(id).as_object(), Some(id));
    assert_eq!(Value::from("s").as_str(), Some("s"));
    assert_eq!(Value::Int(2).as_number(), Some(2.0));
    assert!(Value::Int(2).as_str().is_none());
}

// =============================================================================
// Property Bags
// =============================================================================

#[test]
fn writing_nil_removes_a_key() {
    let bag = PropertyBag::new().insert("name", Value::from("lamp"));
    assert!(bag.contains("name"));
    let bag = bag.insert("name", Value::Nil);
    assert!(!bag.contains("name"));
    assert!(bag.is_empty());
}

#[test]
fn overlay_prefers_the_top_bag() {
    let base = PropertyBag::new()
        .insert("name", Value::from("thing"))
        .insert("weight", Value::Int(1));
    let top = PropertyBag::new().insert("name", Value::from("room"));
    let merged = base.overlay(&top);
    assert_eq!(merged.get("name"), Some(&Value::from("room")));
    assert_eq!(merged.get("weight"), Some(&Value::Int(1)));
    assert_eq!(base.get("name"), Some(&Value::from("thing")));
}

#[test]
fn bags_iterate_in_name_order() {
    let bag = PropertyBag::new()
        .insert("zeta", Value::Int(1))
        .insert("alpha", Value::Int(2))
        .insert("mid", Value::Int(3));
    let keys: Vec<&String> = bag.keys().collect();
    assert_eq!(keys, ["alpha", "mid", "zeta"]);
}
