//! Integration tests for verb and function records

use moorhen_foundation::{PropertyBag, Type};
use moorhen_storage::{FunctionSpec, Owner, VerbSpec, World};

fn world() -> (World, moorhen_foundation::ClassId, moorhen_foundation::ClassId) {
    let mut world = World::new(4);
    let thing = world.create_class("thing", None, PropertyBag::new()).unwrap();
    let room = world.create_class("room", Some(thing), PropertyBag::new()).unwrap();
    (world, thing, room)
}

// =============================================================================
// Verbs
// =============================================================================

#[test]
fn instance_verbs_come_before_inherited_ones() {
    let (mut world, thing, room) = world();
    let hall = world.instantiate(room, None).unwrap();
    let on_thing = world.add_verb(thing, VerbSpec::new("look", "\"thing\"")).unwrap();
    let on_room = world.add_verb(room, VerbSpec::new("look", "\"room\"")).unwrap();
    let on_hall = world.add_verb(hall, VerbSpec::new("look", "\"hall\"")).unwrap();

    let order: Vec<_> = world.verbs_for(hall).unwrap().iter().map(|v| v.id).collect();
    assert_eq!(order, vec![on_hall, on_room, on_thing]);
}

#[test]
fn duplicate_names_prefer_the_newest() {
    let (mut world, _, room) = world();
    let hall = world.instantiate(room, None).unwrap();
    let old = world.add_verb(hall, VerbSpec::new("poke", "1")).unwrap();
    let new = world.add_verb(hall, VerbSpec::new("poke", "2")).unwrap();

    assert_eq!(world.find_verb(hall, "POKE").map(|v| v.id), Some(new));
    let on_hall: Vec<_> = world.verbs_on(hall).iter().map(|v| v.id).collect();
    assert_eq!(on_hall, vec![new, old]);
    assert!(world.verb(new).unwrap().seq > world.verb(old).unwrap().seq);
}

#[test]
fn updating_code_keeps_identity() {
    let (mut world, thing, _) = world();
    let id = world
        .add_verb(
            thing,
            VerbSpec::new("l*ook", "nil")
                .with_aliases(["peer", "gaze"])
                .with_pattern("this"),
        )
        .unwrap();
    world.update_verb_code(id, "(tell \"hi\")").unwrap();

    let verb = world.verb(id).unwrap();
    assert_eq!(verb.code, "(tell \"hi\")");
    assert_eq!(verb.owner, Owner::Class(thing));
    assert_eq!(verb.names().collect::<Vec<_>>(), ["l*ook", "peer", "gaze"]);
}

#[test]
fn destroying_an_instance_removes_its_code() {
    let (mut world, _, room) = world();
    let hall = world.instantiate(room, None).unwrap();
    let verb = world.add_verb(hall, VerbSpec::new("poke", "1")).unwrap();
    let function = world.add_function(hall, FunctionSpec::new("size", "3")).unwrap();

    world.destroy(hall).unwrap();
    assert!(world.verb(verb).is_err());
    assert!(world.function(function).is_err());
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn functions_keep_their_signature() {
    let (mut world, thing, _) = world();
    let id = world
        .add_function(
            thing,
            FunctionSpec::new("weigh", "(* n 2)")
                .with_param("n", Type::Int)
                .returning(Type::Int),
        )
        .unwrap();
    let function = world.function(id).unwrap();
    assert_eq!(function.params.len(), 1);
    assert_eq!(function.params[0].name, "n");
    assert_eq!(function.params[0].ty, Type::Int);
    assert_eq!(function.returns, Type::Int);
    assert_eq!(world.find_function(thing, "weigh").map(|f| f.id), Some(id));
}
