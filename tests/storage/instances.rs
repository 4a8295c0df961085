//! Integration tests for the instance store and containment

use moorhen_foundation::{ErrorKind, Handle, PropertyBag, Value};
use moorhen_storage::World;
use proptest::prelude::*;

fn bag(pairs: &[(&str, Value)]) -> PropertyBag {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

// =============================================================================
// Instantiation
// =============================================================================

#[test]
fn abstract_classes_cannot_be_instantiated() {
    let mut world = World::new(1);
    let thing = world
        .create_abstract_class("thing", None, PropertyBag::new())
        .unwrap();
    let room = world.create_class("room", Some(thing), PropertyBag::new()).unwrap();

    let err = world.instantiate(thing, None).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AbstractInstantiation(_)));
    assert!(world.instantiate(room, None).is_ok());
}

#[test]
fn new_instances_carry_the_merged_overlay() {
    let mut world = World::new(1);
    let thing = world
        .create_class("thing", None, bag(&[("name", "thing".into()), ("weight", 5i64.into())]))
        .unwrap();
    let item = world
        .create_class("item", Some(thing), bag(&[("weight", 1i64.into()), ("portable", true.into())]))
        .unwrap();

    let obj = world.instantiate(item, None).unwrap();
    let expected = world.class(thing).unwrap().defaults.overlay(&world.class(item).unwrap().defaults);
    assert_eq!(world.own_properties(obj).unwrap(), &expected);
    assert_eq!(world.merged_defaults(item).unwrap(), expected);
}

#[test]
fn handles_count_up_and_are_not_reused() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let a = world.instantiate(thing, None).unwrap();
    let b = world.instantiate(thing, None).unwrap();
    assert_eq!(world.instance(a).unwrap().handle, Handle::new(0));
    assert_eq!(world.instance(b).unwrap().handle, Handle::new(1));

    world.destroy(b).unwrap();
    let c = world.instantiate(thing, None).unwrap();
    assert_eq!(world.instance(c).unwrap().handle, Handle::new(2));
    assert!(world.find_by_handle(Handle::new(1)).is_none());
    assert_eq!(world.find_by_handle(Handle::new(2)).map(|i| i.id), Some(c));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn room_named_hallway_scenario() {
    let mut world = World::new(1);
    let room = world
        .create_class("Room", None, bag(&[("name", "A room".into())]))
        .unwrap();
    let player = world
        .create_class("Player", None, bag(&[("name", "A player".into())]))
        .unwrap();

    let first = world.instantiate(room, None).unwrap();
    let second = world.instantiate(room, None).unwrap();
    let someone = world.instantiate(player, Some(first)).unwrap();
    assert_eq!(world.get_property(first, "name").unwrap(), Some(&Value::from("A room")));

    world.set_property(first, "name", "Hallway").unwrap();
    assert_eq!(world.get_property(first, "name").unwrap(), Some(&Value::from("Hallway")));
    assert_eq!(world.get_property(second, "name").unwrap(), Some(&Value::from("A room")));
    assert_eq!(world.class(room).unwrap().defaults.get("name"), Some(&Value::from("A room")));
    assert_eq!(world.get_property(someone, "name").unwrap(), Some(&Value::from("A player")));
}

#[test]
fn clearing_an_override_shows_the_class_default() {
    let mut world = World::new(1);
    let room = world
        .create_class("room", None, bag(&[("name", "A room".into())]))
        .unwrap();
    let hall = world.instantiate(room, None).unwrap();
    world.set_property(hall, "name", "Hallway").unwrap();
    world.clear_property(hall, "name").unwrap();
    assert_eq!(world.get_property(hall, "name").unwrap(), Some(&Value::from("A room")));
    assert_eq!(world.get_str_or(hall, "colour", "grey"), "grey");
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn destroy_relocates_contents_to_nowhere() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let room = world.instantiate(thing, None).unwrap();
    let chest = world.instantiate(thing, Some(room)).unwrap();
    let coin = world.instantiate(thing, Some(chest)).unwrap();
    let gem = world.instantiate(thing, Some(chest)).unwrap();

    world.destroy(chest).unwrap();

    assert!(!world.exists(chest));
    for obj in [coin, gem] {
        assert_eq!(world.instance(obj).unwrap().location, None);
    }
    assert!(world.objects_in(None).contains(&coin));
    assert!(world.objects_in(Some(room)).is_empty());
    assert!(world.objects_in(Some(chest)).is_empty());
}

#[test]
fn moves_reject_long_cycles() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let a = world.instantiate(thing, None).unwrap();
    let b = world.instantiate(thing, Some(a)).unwrap();
    let c = world.instantiate(thing, Some(b)).unwrap();
    let d = world.instantiate(thing, Some(c)).unwrap();

    let err = world.move_to(a, Some(d)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidLocation(_)));
    let err = world.move_to(a, Some(a)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidLocation(_)));
    assert_eq!(world.ancestry(d), vec![c, b, a]);
}

#[test]
fn contents_are_listed_in_handle_order() {
    let mut world = World::new(1);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let room = world.instantiate(thing, None).unwrap();
    let first = world.instantiate(thing, None).unwrap();
    let second = world.instantiate(thing, Some(room)).unwrap();
    world.move_to(first, Some(room)).unwrap();
    assert_eq!(world.objects_in(Some(room)), vec![first, second]);
}

proptest! {
    #[test]
    fn containment_stays_a_forest(moves in proptest::collection::vec((0usize..6, proptest::option::of(0usize..6)), 1..40)) {
        let mut world = World::new(9);
        let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
        let objects: Vec<_> = (0..6).map(|_| world.instantiate(thing, None).unwrap()).collect();

        for (object, destination) in moves {
            let _ = world.move_to(objects[object], destination.map(|d| objects[d]));
        }

        for &obj in &objects {
            let ancestry = world.ancestry(obj);
            prop_assert!(!ancestry.contains(&obj));
            prop_assert!(ancestry.len() < objects.len());
            let location = world.instance(obj).unwrap().location;
            if let Some(loc) = location {
                prop_assert!(world.objects_in(Some(loc)).contains(&obj));
            }
        }
    }
}
