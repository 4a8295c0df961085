//! Integration tests for the class registry and property resolution

use moorhen_foundation::{ClassId, ErrorKind, PropertyBag, Value};
use moorhen_storage::World;
use proptest::prelude::*;

fn bag(pairs: &[(&str, Value)]) -> PropertyBag {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn most_derived_default_wins() {
    let mut world = World::new(1);
    let thing = world
        .create_class("thing", None, bag(&[("name", "thing".into()), ("weight", 1i64.into())]))
        .unwrap();
    let item = world
        .create_class("item", Some(thing), bag(&[("name", "item".into())]))
        .unwrap();
    let lamp = world
        .create_class("lamp", Some(item), bag(&[("lit", false.into())]))
        .unwrap();

    let obj = world.instantiate(lamp, None).unwrap();
    world.clear_property(obj, "name").unwrap();
    world.clear_property(obj, "weight").unwrap();

    assert_eq!(world.get_property(obj, "name").unwrap(), Some(&Value::from("item")));
    assert_eq!(world.get_property(obj, "weight").unwrap(), Some(&Value::Int(1)));
    assert_eq!(world.get_property(obj, "lit").unwrap(), Some(&Value::Bool(false)));
    assert_eq!(world.get_property(obj, "colour").unwrap(), None);
}

#[test]
fn chains_and_subclasses() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let room = world.create_class("room", Some(thing), PropertyBag::new()).unwrap();
    let cave = world.create_class("cave", Some(room), PropertyBag::new()).unwrap();
    let item = world.create_class("item", Some(thing), PropertyBag::new()).unwrap();

    assert_eq!(world.inheritance_chain(cave).unwrap(), [thing, room, cave]);
    assert!(world.inherits_from(cave, thing));
    assert!(world.inherits_from(cave, cave));
    assert!(!world.inherits_from(item, room));
    assert_eq!(world.subclasses(thing, false), vec![item, room]);
    assert_eq!(world.subclasses(thing, true), vec![cave, item, room]);
}

#[test]
fn missing_parent_is_invalid_ancestry() {
    let mut world = World::new(1);
    let err = world
        .create_class("orphan", Some(ClassId::new(u64::MAX)), PropertyBag::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidAncestry(_)));
    assert!(world.class_by_name("orphan").is_none());
}

#[test]
fn reparenting_cannot_create_a_cycle() {
    let mut world = World::new(1);
    let a = world.create_class("a", None, PropertyBag::new()).unwrap();
    let b = world.create_class("b", Some(a), PropertyBag::new()).unwrap();
    let c = world.create_class("c", Some(b), PropertyBag::new()).unwrap();

    let err = world.set_class_parent(a, Some(c)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidAncestry(_)));
    let err = world.set_class_parent(a, Some(a)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidAncestry(_)));
    assert_eq!(world.class(a).unwrap().parent, None);
}

#[test]
fn class_names_are_unique_ignoring_case() {
    let mut world = World::new(1);
    world.create_class("Room", None, PropertyBag::new()).unwrap();
    let err = world.create_class("room", None, PropertyBag::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AlreadyExists(_)));
    assert!(world.class_by_name("ROOM").is_some());
}

#[test]
fn classes_in_use_cannot_be_deleted() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let room = world.create_class("room", Some(thing), PropertyBag::new()).unwrap();
    let err = world.delete_class(thing).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ClassInUse(_)));

    let hall = world.instantiate(room, None).unwrap();
    let err = world.delete_class(room).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ClassInUse(_)));

    world.destroy(hall).unwrap();
    world.delete_class(room).unwrap();
    world.delete_class(thing).unwrap();
    assert!(world.class_by_name("thing").is_none());
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn deepest_definition_wins(depth in 1usize..8, defined_at in proptest::collection::vec(any::<bool>(), 8)) {
        let mut world = World::new(3);
        let mut parent = None;
        let mut expected = None;
        let mut classes = Vec::new();
        for level in 0..depth {
            let defaults = if defined_at[level] {
                expected = Some(Value::Int(level as i64));
                bag(&[("depth", Value::Int(level as i64))])
            } else {
                PropertyBag::new()
            };
            let class = world.create_class(&format!("level{level}"), parent, defaults).unwrap();
            classes.push(class);
            parent = Some(class);
        }
        let obj = world.instantiate(*classes.last().unwrap(), None).unwrap();
        world.clear_property(obj, "depth").unwrap();
        prop_assert_eq!(world.get_property(obj, "depth").unwrap().cloned(), expected);
    }
}
