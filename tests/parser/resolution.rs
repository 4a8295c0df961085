//! Integration tests for resolving player input to verbs

use moorhen_foundation::{ObjectId, PropertyBag, VerbId};
use moorhen_parser::{CommandResolver, candidates};
use moorhen_storage::{VerbSpec, World};

struct Scene {
    world: World,
    system: ObjectId,
    hall: ObjectId,
    ada: ObjectId,
    lamp: ObjectId,
    chest: ObjectId,
    north: ObjectId,
    room_look: VerbId,
    item_look: VerbId,
    put: VerbId,
    go: VerbId,
    inventory: VerbId,
}

fn scene() -> Scene {
    let mut world = World::new(12);
    let thing = world
        .create_abstract_class("thing", None, PropertyBag::new())
        .unwrap();
    let item = world.create_class("item", Some(thing), PropertyBag::new()).unwrap();
    let room = world.create_class("room", Some(thing), PropertyBag::new()).unwrap();
    let exit = world.create_class("exit", Some(thing), PropertyBag::new()).unwrap();
    let player = world.create_class("player", Some(thing), PropertyBag::new()).unwrap();
    let system_class = world.create_class("system", None, PropertyBag::new()).unwrap();

    let system = world.instantiate(system_class, None).unwrap();
    let hall = world.instantiate(room, None).unwrap();
    let garden = world.instantiate(room, None).unwrap();
    let ada = world.instantiate(player, Some(hall)).unwrap();
    let lamp = world.instantiate(item, Some(ada)).unwrap();
    let chest = world.instantiate(item, Some(hall)).unwrap();
    let north = world.instantiate(exit, Some(hall)).unwrap();
    for (id, name) in [
        (hall, "Hall"),
        (garden, "Garden"),
        (ada, "Ada"),
        (lamp, "brass lamp"),
        (chest, "chest"),
        (north, "north"),
    ] {
        world.set_property(id, "name", name).unwrap();
    }
    world.set_property(lamp, "aliases", "lamp, lantern").unwrap();
    world.set_property(north, "destination", garden).unwrap();

    let room_look = world
        .add_verb(room, VerbSpec::new("l*ook", "nil").with_pattern("none"))
        .unwrap();
    let item_look = world
        .add_verb(item, VerbSpec::new("l*ook", "nil").with_pattern("this"))
        .unwrap();
    let put = world
        .add_verb(item, VerbSpec::new("put", "nil").with_pattern("this in *"))
        .unwrap();
    let go = world
        .add_verb(exit, VerbSpec::new("go", "nil").with_pattern("this"))
        .unwrap();
    let inventory = world
        .add_verb(system, VerbSpec::new("i*nventory", "nil").with_aliases(["inv"]))
        .unwrap();

    Scene {
        world,
        system,
        hall,
        ada,
        lamp,
        chest,
        north,
        room_look,
        item_look,
        put,
        go,
        inventory,
    }
}

fn resolver(scene: &Scene) -> CommandResolver {
    CommandResolver::new().with_system(Some(scene.system))
}

#[test]
fn candidates_follow_priority_order() {
    let s = scene();
    assert_eq!(
        candidates(&s.world, s.ada, Some(s.system)),
        vec![s.lamp, s.chest, s.north, s.hall, s.ada, s.system]
    );
}

#[test]
fn bare_verbs_find_the_room() {
    let s = scene();
    let found = resolver(&s).resolve(&s.world, s.ada, "LOOK").unwrap();
    assert_eq!((found.verb, found.this), (s.room_look, s.hall));
    assert!(found.args.is_empty());
    assert!(!found.via_movement);
}

#[test]
fn objects_are_named_by_name_alias_or_handle() {
    let s = scene();
    let resolver = resolver(&s);
    let by_handle = format!("look {}", s.world.instance(s.chest).unwrap().handle);
    for (input, target) in [
        ("l brass lamp", s.lamp),
        ("look lantern", s.lamp),
        ("look chest.", s.chest),
        (by_handle.as_str(), s.chest),
    ] {
        let found = resolver.resolve(&s.world, s.ada, input).unwrap();
        assert_eq!((found.verb, found.this), (s.item_look, target), "{input}");
    }
}

#[test]
fn wildcards_capture_the_rest() {
    let s = scene();
    let found = resolver(&s)
        .resolve(&s.world, s.ada, "put lamp in the chest")
        .unwrap();
    assert_eq!(found.verb, s.put);
    assert_eq!(found.this, s.lamp);
    assert_eq!(found.args, vec!["the chest"]);
    assert_eq!(found.argstr, "lamp in the chest");
    assert_eq!(found.word, "put");
}

#[test]
fn directions_retry_through_the_movement_verb() {
    let s = scene();
    let resolver = resolver(&s);
    let matches: Vec<_> = ["n", "north", "go n", "go north", "GO N"]
        .into_iter()
        .map(|input| resolver.resolve(&s.world, s.ada, input).unwrap())
        .collect();
    for found in &matches {
        assert_eq!((found.verb, found.this), (s.go, s.north));
        assert_eq!(found.argstr, "north");
    }
    assert!(matches[0].via_movement);
    assert!(!matches[2].via_movement);
}

#[test]
fn system_verbs_are_found_last() {
    let s = scene();
    let resolver = resolver(&s);
    for input in ["i", "inv", "inventory"] {
        let found = resolver.resolve(&s.world, s.ada, input).unwrap();
        assert_eq!((found.verb, found.this), (s.inventory, s.system), "{input}");
    }
    assert!(
        CommandResolver::new()
            .resolve(&s.world, s.ada, "inventory")
            .is_none()
    );
}

#[test]
fn instance_verbs_shadow_class_verbs() {
    let mut s = scene();
    let own = s
        .world
        .add_verb(s.hall, VerbSpec::new("look", "nil").with_pattern("none"))
        .unwrap();
    let found = resolver(&s).resolve(&s.world, s.ada, "look").unwrap();
    assert_eq!(found.verb, own);
}

#[test]
fn unknown_input_resolves_to_nothing() {
    let s = scene();
    let resolver = resolver(&s);
    assert!(resolver.resolve(&s.world, s.ada, "xyzzy").is_none());
    assert!(resolver.resolve(&s.world, s.ada, "go west").is_none());
    assert!(resolver.resolve(&s.world, s.ada, "look ghost").is_none());
    assert!(resolver.resolve(&s.world, s.ada, "").is_none());
}
