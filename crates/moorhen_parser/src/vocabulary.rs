//! Movement vocabulary.
//!
//! Maps direction words and their abbreviations to canonical direction
//! names so that `n`, `north`, and `go n` all reach the same movement verb
//! with the same argument.

use std::collections::HashMap;

/// A compass or special direction with its synonyms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Direction {
    /// Canonical name.
    pub name: String,
    /// Alternative words.
    pub synonyms: Vec<String>,
}

impl Direction {
    /// Creates a direction.
    #[must_use]
    pub fn new(name: &str, synonyms: &[&str]) -> Self {
        Self {
            name: name.to_lowercase(),
            synonyms: synonyms.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

/// Registry of directions keyed by every accepted spelling.
#[derive(Clone, Debug, Default)]
pub struct MovementVocabulary {
    /// Directions by canonical name
    directions: HashMap<String, Direction>,
    /// Synonym -> canonical name mapping
    synonyms: HashMap<String, String>,
}

impl MovementVocabulary {
    /// Creates an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the standard twelve directions plus `in` and `out`.
    #[must_use]
    pub fn standard() -> Self {
        let mut vocabulary = Self::new();
        for direction in [
            // Cardinal
            Direction::new("north", &["n"]),
            Direction::new("south", &["s"]),
            Direction::new("east", &["e"]),
            Direction::new("west", &["w"]),
            // Vertical
            Direction::new("up", &["u"]),
            Direction::new("down", &["d"]),
            // Diagonal
            Direction::new("northeast", &["ne"]),
            Direction::new("northwest", &["nw"]),
            Direction::new("southeast", &["se"]),
            Direction::new("southwest", &["sw"]),
            // Special
            Direction::new("in", &["inside"]),
            Direction::new("out", &["outside"]),
        ] {
            vocabulary.register(direction);
        }
        vocabulary
    }

    /// Registers a direction, replacing any earlier one of the same name.
    pub fn register(&mut self, direction: Direction) {
        for synonym in &direction.synonyms {
            self.synonyms
                .insert(synonym.clone(), direction.name.clone());
        }
        self.directions.insert(direction.name.clone(), direction);
    }

    /// Looks up a direction by canonical name or synonym, ignoring case.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<&Direction> {
        let word = word.to_lowercase();
        if let Some(direction) = self.directions.get(&word) {
            return Some(direction);
        }
        self.synonyms
            .get(&word)
            .and_then(|canonical| self.directions.get(canonical))
    }

    /// Returns the canonical name for a direction word.
    #[must_use]
    pub fn canonical(&self, word: &str) -> Option<&str> {
        self.lookup(word).map(|d| d.name.as_str())
    }

    /// Rewrites a command line whose first word is a direction to start
    /// with the canonical name instead. Other input comes back unchanged.
    #[must_use]
    pub fn expand(&self, input: &str) -> String {
        let trimmed = input.trim();
        let (first, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        match self.canonical(first) {
            Some(name) if rest.is_empty() => name.to_string(),
            Some(name) => format!("{name} {}", rest.trim_start()),
            None => trimmed.to_string(),
        }
    }

    /// Number of registered directions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }
}
