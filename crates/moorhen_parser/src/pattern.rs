//! Verb names and argument patterns.
//!
//! A verb is chosen by its name and then by its argument pattern, matched
//! against the input that follows the verb word.
//!
//! # Pattern grammar
//!
//! Whitespace-separated elements:
//!
//! - `*` captures one or more words. It takes as few words as it can while
//!   the rest of the pattern still matches; a trailing `*` takes the rest.
//! - `this` matches the candidate object by name, alias, or `#handle`.
//! - Anything else is a literal word, compared ignoring case.
//!
//! The empty pattern and `none` accept only empty input.

use std::fmt;

use crate::tokenizer::{InputToken, InputTokenizer};

/// One element of a compiled pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternElement {
    /// A lowercase word that must appear verbatim.
    Literal(String),
    /// One or more captured words.
    Wildcard,
    /// The object the verb is being tried on.
    This,
}

/// A compiled argument pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    elements: Vec<PatternElement>,
}

/// What a successful pattern match captured.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatternMatch {
    /// One entry per wildcard, in pattern order.
    pub args: Vec<String>,
}

impl Pattern {
    /// Compiles a pattern string. Never fails: every word is meaningful.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("none") {
            return Self::default();
        }
        let elements = trimmed
            .split_whitespace()
            .map(|word| match word {
                "*" => PatternElement::Wildcard,
                w if w.eq_ignore_ascii_case("this") => PatternElement::This,
                w => PatternElement::Literal(w.to_lowercase()),
            })
            .collect();
        Self { elements }
    }

    /// Returns the compiled elements.
    #[must_use]
    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    /// Returns true if the pattern accepts only empty input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true if the pattern mentions `this`.
    #[must_use]
    pub fn mentions_this(&self) -> bool {
        self.elements.contains(&PatternElement::This)
    }

    /// Matches the text after the verb word.
    ///
    /// `is_this` receives a lowercase candidate name (one or more words
    /// joined by single spaces) and says whether it names the object the
    /// verb is attached to.
    #[must_use]
    pub fn matches(&self, rest: &str, is_this: impl Fn(&str) -> bool) -> Option<PatternMatch> {
        let tokens = InputTokenizer::tokenize(rest);
        self.matches_tokens(rest, &tokens, &is_this)
    }

    /// Like [`Pattern::matches`] over tokens already produced from `rest`.
    #[must_use]
    pub fn matches_tokens(
        &self,
        rest: &str,
        tokens: &[InputToken],
        is_this: &dyn Fn(&str) -> bool,
    ) -> Option<PatternMatch> {
        let mut walker = Walker {
            elements: &self.elements,
            tokens,
            is_this,
            spans: Vec::new(),
        };
        if !walker.walk(0, 0) {
            return None;
        }
        let args = walker
            .spans
            .iter()
            .map(|&(from, to)| capture_text(rest, &tokens[from..to]))
            .collect();
        Some(PatternMatch { args })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "none");
        }
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match element {
                PatternElement::Literal(word) => write!(f, "{word}")?,
                PatternElement::Wildcard => write!(f, "*")?,
                PatternElement::This => write!(f, "this")?,
            }
        }
        Ok(())
    }
}

/// Backtracking matcher state.
struct Walker<'a> {
    elements: &'a [PatternElement],
    tokens: &'a [InputToken],
    is_this: &'a dyn Fn(&str) -> bool,
    /// Token ranges captured by wildcards so far.
    spans: Vec<(usize, usize)>,
}

impl Walker<'_> {
    fn walk(&mut self, element: usize, token: usize) -> bool {
        let remaining = self.tokens.len() - token;
        let Some(current) = self.elements.get(element) else {
            return remaining == 0;
        };

        match current {
            PatternElement::Literal(word) => {
                self.tokens.get(token).is_some_and(|t| t.is(word))
                    && self.walk(element + 1, token + 1)
            }
            PatternElement::This => (1..=remaining).any(|n| {
                let name = self.tokens[token..token + n]
                    .iter()
                    .map(InputToken::normalized)
                    .collect::<Vec<_>>()
                    .join(" ");
                (self.is_this)(&name) && self.walk(element + 1, token + n)
            }),
            PatternElement::Wildcard => {
                if remaining == 0 {
                    return false;
                }
                if element + 1 == self.elements.len() {
                    self.spans.push((token, self.tokens.len()));
                    return true;
                }
                for end in token + 1..=self.tokens.len() {
                    self.spans.push((token, end));
                    if self.walk(element + 1, end) {
                        return true;
                    }
                    self.spans.pop();
                }
                false
            }
        }
    }
}

/// Text of a captured token range. A lone quoted string loses its quotes;
/// anything longer is the player's text verbatim.
fn capture_text(rest: &str, tokens: &[InputToken]) -> String {
    match tokens {
        [single] if single.quoted => single.text.clone(),
        [first, .., last] => rest[first.start..last.end].to_string(),
        [single] => single.text.clone(),
        [] => String::new(),
    }
}

/// A verb name, possibly abbreviated.
///
/// A `*` inside the name marks the shortest accepted prefix: `l*ook`
/// accepts `l`, `lo`, `loo`, and `look`. A trailing `*` accepts any word
/// starting with the prefix, and a lone `*` accepts any word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerbName {
    required: String,
    optional: String,
    open_ended: bool,
}

impl VerbName {
    /// Parses a verb name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        match name.split_once('*') {
            Some((required, optional)) => Self {
                required: required.to_string(),
                optional: optional.replace('*', ""),
                open_ended: optional.is_empty(),
            },
            None => Self {
                required: name,
                optional: String::new(),
                open_ended: false,
            },
        }
    }

    /// Returns the unabbreviated name.
    #[must_use]
    pub fn full(&self) -> String {
        format!("{}{}", self.required, self.optional)
    }

    /// Returns true if `word` is an accepted spelling, ignoring case.
    #[must_use]
    pub fn matches(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        if !word.starts_with(&self.required) {
            return false;
        }
        if self.open_ended {
            return true;
        }
        let tail = &word[self.required.len()..];
        self.optional.starts_with(tail)
    }
}
