//! Playing through the core world: looking, carrying, talking, walking

use crate::fixture::Fixture;

#[test]
fn looking_around_lists_things_and_exits() {
    let mut f = Fixture::new();
    assert_eq!(
        f.ada("look"),
        vec![
            "The Lobby",
            "A plain room with bare walls. Everything starts here.",
            "You see: lamp, Bob",
            "Exits: north",
        ]
    );
    assert_eq!(f.ada("l lamp"), vec!["You see nothing special about lamp."]);
    assert!(f.bob.conn.messages().is_empty());
}

#[test]
fn taking_and_dropping() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("take lamp"), vec!["You take lamp."]);
    assert_eq!(f.ada("get lamp"), vec!["You already have that."]);
    assert_eq!(f.ada("inventory"), vec!["You are carrying:", "  lamp"]);

    // The lamp is out of Bob's reach now
    assert_eq!(f.bob("take lamp"), vec!["I don't understand that."]);
    assert_eq!(f.bob("take Ada"), vec!["You can't take that."]);

    assert_eq!(f.ada("drop lamp"), vec!["You drop lamp."]);
    assert_eq!(f.ada("i"), vec!["You are empty-handed."]);
    let lamp_location = f
        .database()
        .read(|w| w.instance(f.lamp).unwrap().location);
    assert_eq!(lamp_location, Some(f.lobby));
}

#[test]
fn speech_reaches_everyone_in_the_room() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("say hello there"), vec!["You say, \"hello there\""]);
    assert_eq!(f.bob.conn.take_messages(), vec!["Ada says, \"hello there\""]);
}

#[test]
fn walking_through_an_exit() {
    let mut f = Fixture::new();
    assert_eq!(f.ada("n"), vec!["Garden", "Roses everywhere."]);
    let here = f.database().read(|w| w.instance(f.ada.id).unwrap().location);
    assert_eq!(here, Some(f.garden));

    // Bob no longer hears Ada
    f.ada("say anyone?");
    assert!(f.bob.conn.take_messages().is_empty());

    // There is no way back
    assert_eq!(f.ada("south"), vec!["I don't understand that."]);
}

#[test]
fn every_spelling_of_a_direction_moves() {
    for input in ["n", "north", "go n", "go north"] {
        let mut f = Fixture::new();
        f.ada(input);
        let here = f.database().read(|w| w.instance(f.ada.id).unwrap().location);
        assert_eq!(here, Some(f.garden), "{input}");
    }
}

#[test]
fn exits_without_a_destination_lead_nowhere() {
    let mut f = Fixture::new();
    let north = f.north;
    f.database()
        .transact(|w| w.clear_property(north, "destination"))
        .unwrap();
    assert_eq!(f.ada("north"), vec!["That way leads nowhere."]);
}
