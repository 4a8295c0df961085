//! Verb resolution.
//!
//! Finds the verb a line of input invokes. Candidate objects are tried in
//! a fixed order and, for each, every verb it responds to (its own first,
//! then its class chain, newest first within each owner). The first verb
//! whose name and pattern both match wins.

use tracing::debug;

use moorhen_foundation::{ObjectId, Value, VerbId};
use moorhen_storage::{Owner, World};

use crate::pattern::{Pattern, VerbName};
use crate::tokenizer::{InputTokenizer, split_command};
use crate::vocabulary::MovementVocabulary;

/// Movement verb used when none is configured.
pub const DEFAULT_MOVEMENT_VERB: &str = "go";

/// A resolved command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerbMatch {
    /// The verb to run.
    pub verb: VerbId,
    /// Where the verb is attached.
    pub owner: Owner,
    /// The candidate object the verb was found on.
    pub this: ObjectId,
    /// The verb word as the player typed it.
    pub word: String,
    /// Wildcard captures, in pattern order.
    pub args: Vec<String>,
    /// Everything after the verb word.
    pub argstr: String,
    /// True if the match came from the movement retry.
    pub via_movement: bool,
}

/// Lists the objects searched for verbs, in priority order: what the actor
/// carries, everything else in the actor's location, the location itself,
/// the actor, and finally the system object. Each object appears once.
#[must_use]
pub fn candidates(world: &World, actor: ObjectId, system: Option<ObjectId>) -> Vec<ObjectId> {
    fn push(id: ObjectId, out: &mut Vec<ObjectId>) {
        if !out.contains(&id) {
            out.push(id);
        }
    }

    let mut out = Vec::new();
    let location = world.instance(actor).ok().and_then(|i| i.location);
    for id in world.objects_in(Some(actor)) {
        push(id, &mut out);
    }
    if let Some(room) = location {
        for id in world.objects_in(Some(room)) {
            if id != actor {
                push(id, &mut out);
            }
        }
        push(room, &mut out);
    }
    if world.exists(actor) {
        push(actor, &mut out);
    }
    if let Some(system) = system.filter(|id| world.exists(*id)) {
        push(system, &mut out);
    }
    out
}

/// Returns true if `name` (lowercase) refers to `id`: its `#handle`, its
/// `name` property, or one of its `aliases`. Aliases may be a list of
/// strings or a comma-separated string.
fn names_object(world: &World, id: ObjectId, name: &str) -> bool {
    if let Ok(instance) = world.instance(id) {
        if instance.handle.to_string() == name {
            return true;
        }
    }
    let property = |key: &str| world.get_property(id, key).ok().flatten();
    if property("name")
        .and_then(Value::as_str)
        .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
    {
        return true;
    }
    match property("aliases") {
        Some(Value::String(aliases)) => aliases
            .split(',')
            .any(|a| a.trim().eq_ignore_ascii_case(name)),
        Some(Value::List(aliases)) => aliases
            .iter()
            .filter_map(Value::as_str)
            .any(|a| a.trim().eq_ignore_ascii_case(name)),
        _ => false,
    }
}

/// Resolves command lines against a world.
#[derive(Clone, Debug)]
pub struct CommandResolver {
    vocabulary: MovementVocabulary,
    movement_verb: String,
    system: Option<ObjectId>,
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandResolver {
    /// Creates a resolver with the standard directions, `go` as the
    /// movement verb, and no system object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vocabulary: MovementVocabulary::standard(),
            movement_verb: DEFAULT_MOVEMENT_VERB.to_string(),
            system: None,
        }
    }

    /// Sets the movement verb.
    #[must_use]
    pub fn with_movement_verb(mut self, verb: impl Into<String>) -> Self {
        self.movement_verb = verb.into();
        self
    }

    /// Sets the system object searched last.
    #[must_use]
    pub fn with_system(mut self, system: Option<ObjectId>) -> Self {
        self.system = system;
        self
    }

    /// Replaces the movement vocabulary.
    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: MovementVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Returns the movement vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &MovementVocabulary {
        &self.vocabulary
    }

    /// Returns the movement verb name.
    #[must_use]
    pub fn movement_verb(&self) -> &str {
        &self.movement_verb
    }

    /// Returns the system object.
    #[must_use]
    pub fn system(&self) -> Option<ObjectId> {
        self.system
    }

    /// Resolves a line, falling back to the movement verb.
    ///
    /// The line is first tried as typed. If nothing matches and it does
    /// not already start with the movement verb, it is tried again as
    /// `<movement verb> <line>`. Direction words after the movement verb
    /// are expanded to their canonical names, so `n`, `north`, `go n`, and
    /// `go north` all resolve to the same match.
    #[must_use]
    pub fn resolve(&self, world: &World, actor: ObjectId, input: &str) -> Option<VerbMatch> {
        let (word, _) = split_command(input)?;
        if let Some(found) = self.resolve_line(world, actor, input) {
            return Some(found);
        }
        if word.eq_ignore_ascii_case(&self.movement_verb) {
            return None;
        }
        let retry = format!("{} {}", self.movement_verb, input.trim());
        let found = self.resolve_line(world, actor, &retry).map(|m| VerbMatch {
            via_movement: true,
            ..m
        });
        if found.is_none() {
            debug!(%actor, input, "unresolved command");
        }
        found
    }

    /// Resolves a line without the movement retry.
    #[must_use]
    pub fn resolve_line(&self, world: &World, actor: ObjectId, input: &str) -> Option<VerbMatch> {
        let (word, rest) = split_command(input)?;
        let argstr = if word.eq_ignore_ascii_case(&self.movement_verb) {
            self.vocabulary.expand(rest)
        } else {
            rest.to_string()
        };
        let tokens = InputTokenizer::tokenize(&argstr);

        for candidate in candidates(world, actor, self.system) {
            let Ok(verbs) = world.verbs_for(candidate) else {
                continue;
            };
            let is_this = |name: &str| names_object(world, candidate, name);
            for verb in verbs {
                if !verb.names().any(|n| VerbName::parse(n).matches(word)) {
                    continue;
                }
                let pattern = Pattern::parse(&verb.pattern);
                if let Some(matched) = pattern.matches_tokens(&argstr, &tokens, &is_this) {
                    debug!(
                        %actor,
                        word,
                        verb = %verb.id,
                        this = %candidate,
                        "resolved verb"
                    );
                    return Some(VerbMatch {
                        verb: verb.id,
                        owner: verb.owner,
                        this: candidate,
                        word: word.to_string(),
                        args: matched.args,
                        argstr,
                        via_movement: false,
                    });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorhen_foundation::{ClassId, PropertyBag};
    use moorhen_storage::VerbSpec;

    struct Fixture {
        world: World,
        thing: ClassId,
        room: ObjectId,
        player: ObjectId,
        lamp: ObjectId,
    }

    fn fixture() -> Fixture {
        let mut world = World::new(9);
        let thing = world
            .create_class("thing", None, PropertyBag::new())
            .unwrap();
        let room_class = world
            .create_class("room", Some(thing), PropertyBag::new())
            .unwrap();
        let room = world.instantiate(room_class, None).unwrap();
        world.set_property(room, "name", "Hallway").unwrap();
        let player = world.instantiate(thing, Some(room)).unwrap();
        world.set_property(player, "name", "Ada").unwrap();
        let lamp = world.instantiate(thing, Some(room)).unwrap();
        world.set_property(lamp, "name", "brass lamp").unwrap();
        world.set_property(lamp, "aliases", "lamp, lantern").unwrap();
        Fixture {
            world,
            thing,
            room,
            player,
            lamp,
        }
    }

    #[test]
    fn candidate_order() {
        let mut f = fixture();
        let coin = f.world.instantiate(f.thing, Some(f.player)).unwrap();
        let system = f.world.instantiate(f.thing, None).unwrap();
        let order = candidates(&f.world, f.player, Some(system));
        assert_eq!(order, vec![coin, f.lamp, f.room, f.player, system]);
    }

    #[test]
    fn candidates_for_actor_nowhere() {
        let mut f = fixture();
        f.world.move_to(f.player, None).unwrap();
        assert_eq!(candidates(&f.world, f.player, None), vec![f.player]);
    }

    #[test]
    fn this_matches_name_alias_and_handle() {
        let mut f = fixture();
        f.world
            .add_verb(f.thing, VerbSpec::new("take", "").with_pattern("this"))
            .unwrap();
        let resolver = CommandResolver::new();
        let handle = f.world.instance(f.lamp).unwrap().handle;

        for input in ["take brass lamp", "take LANTERN", &format!("take {handle}")] {
            let found = resolver.resolve(&f.world, f.player, input).unwrap();
            assert_eq!(found.this, f.lamp, "{input}");
        }
        assert!(resolver.resolve(&f.world, f.player, "take rock").is_none());
    }

    #[test]
    fn abbreviated_verb_names() {
        let mut f = fixture();
        f.world
            .add_verb(f.room, VerbSpec::new("l*ook", ""))
            .unwrap();
        let resolver = CommandResolver::new();
        assert!(resolver.resolve(&f.world, f.player, "l").is_some());
        assert!(resolver.resolve(&f.world, f.player, "LOOK").is_some());
        assert!(resolver.resolve(&f.world, f.player, "looking").is_none());
    }

    #[test]
    fn first_matching_candidate_wins() {
        let mut f = fixture();
        let on_lamp = f
            .world
            .add_verb(f.lamp, VerbSpec::new("rub", "").with_pattern("*"))
            .unwrap();
        f.world
            .add_verb(f.room, VerbSpec::new("rub", "").with_pattern("*"))
            .unwrap();
        let found = CommandResolver::new()
            .resolve(&f.world, f.player, "rub anything")
            .unwrap();
        assert_eq!(found.verb, on_lamp);
        assert_eq!(found.args, vec!["anything"]);
    }

    #[test]
    fn pattern_mismatch_falls_through_to_later_candidates() {
        let mut f = fixture();
        f.world
            .add_verb(f.lamp, VerbSpec::new("say", "").with_pattern("none"))
            .unwrap();
        let on_room = f
            .world
            .add_verb(f.room, VerbSpec::new("say", "").with_pattern("*"))
            .unwrap();
        let found = CommandResolver::new()
            .resolve(&f.world, f.player, "say Hello,  there")
            .unwrap();
        assert_eq!(found.verb, on_room);
        assert_eq!(found.argstr, "Hello,  there");
        assert_eq!(found.word, "say");
    }

    #[test]
    fn movement_retry_expands_directions() {
        let mut f = fixture();
        let exit_class = f
            .world
            .create_class("exit", Some(f.thing), PropertyBag::new())
            .unwrap();
        let door = f.world.instantiate(exit_class, Some(f.room)).unwrap();
        f.world.set_property(door, "name", "north").unwrap();
        let go = f
            .world
            .add_verb(exit_class, VerbSpec::new("go", "").with_pattern("this"))
            .unwrap();
        let resolver = CommandResolver::new();

        let short = resolver.resolve(&f.world, f.player, "n").unwrap();
        let long = resolver.resolve(&f.world, f.player, "north").unwrap();
        let explicit = resolver.resolve(&f.world, f.player, "go n").unwrap();
        assert_eq!(short, long);
        assert!(short.via_movement);
        assert_eq!((short.verb, short.this), (go, door));
        assert_eq!(short.argstr, "north");
        assert_eq!((explicit.verb, explicit.this), (go, door));
        assert!(!explicit.via_movement);

        assert!(resolver.resolve(&f.world, f.player, "south").is_none());
        assert!(resolver.resolve(&f.world, f.player, "go").is_none());
    }

    #[test]
    fn blank_input_is_unresolved() {
        let f = fixture();
        assert!(CommandResolver::new().resolve(&f.world, f.player, "  ").is_none());
    }
}
