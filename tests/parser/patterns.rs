//! Integration tests for verb names and argument patterns

use moorhen_parser::{MovementVocabulary, Pattern, VerbName, split_command};

#[test]
fn abbreviated_names_accept_every_prefix_past_the_star() {
    let look = VerbName::parse("l*ook");
    for word in ["l", "lo", "LOO", "look"] {
        assert!(look.matches(word), "{word}");
    }
    for word in ["", "looks", "lk"] {
        assert!(!look.matches(word), "{word}");
    }
    assert_eq!(look.full(), "look");
    assert!(VerbName::parse("@wh*").matches("@whisper"));
}

#[test]
fn wildcards_and_literals() {
    let put = Pattern::parse("this in *");
    let is_lamp = |name: &str| name == "brass lamp";

    let matched = put.matches("Brass Lamp in the old box", is_lamp).unwrap();
    assert_eq!(matched.args, vec!["the old box"]);
    assert!(put.matches("brass lamp on the box", is_lamp).is_none());
    assert!(put.matches("brass lamp in", is_lamp).is_none());
}

#[test]
fn quoted_captures() {
    let say = Pattern::parse("*");
    let quoted = say.matches("\"Hello,   World\"", |_| false).unwrap();
    assert_eq!(quoted.args, vec!["Hello,   World"]);
    let verbatim = say.matches("Hello,   World", |_| false).unwrap();
    assert_eq!(verbatim.args, vec!["Hello,   World"]);
}

#[test]
fn none_accepts_only_empty_input() {
    let none = Pattern::parse("none");
    assert!(none.is_empty());
    assert!(none.matches("", |_| false).is_some());
    assert!(none.matches("lamp", |_| true).is_none());
    assert_eq!(Pattern::parse("").to_string(), "none");
}

#[test]
fn direction_abbreviations_expand() {
    let vocabulary = MovementVocabulary::standard();
    assert_eq!(vocabulary.expand("n"), "north");
    assert_eq!(vocabulary.expand("NE quickly"), "northeast quickly");
    assert_eq!(vocabulary.expand("lamp"), "lamp");
    assert_eq!(vocabulary.canonical("u"), Some("up"));
}

#[test]
fn commands_split_on_the_first_word() {
    assert_eq!(split_command("  put lamp  in box "), Some(("put", "lamp  in box")));
    assert_eq!(split_command("look"), Some(("look", "")));
    assert_eq!(split_command("   "), None);
}
