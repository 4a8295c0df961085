//! Input tokenization.
//!
//! Converts raw player input into a stream of tokens. Tokens keep their
//! original case and their byte offsets so pattern captures can hand back
//! the player's text verbatim.

/// Trailing punctuation ignored when a word is compared.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// A token from player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputToken {
    /// The word, or the contents of a quoted string without its quotes.
    pub text: String,
    /// True for a `"quoted string"`.
    pub quoted: bool,
    /// Byte offset of the first character, including an opening quote.
    pub start: usize,
    /// Byte offset one past the last character, including a closing quote.
    pub end: usize,
}

impl InputToken {
    /// Returns the token as compared against patterns and names: lowercase,
    /// with trailing punctuation removed from bare words.
    #[must_use]
    pub fn normalized(&self) -> String {
        if self.quoted {
            self.text.to_lowercase()
        } else {
            self.text
                .trim_end_matches(TRAILING_PUNCTUATION)
                .to_lowercase()
        }
    }

    /// Compares against a word, ignoring case and trailing punctuation.
    #[must_use]
    pub fn is(&self, word: &str) -> bool {
        self.normalized() == word.to_lowercase()
    }
}

/// Tokenizes player input.
pub struct InputTokenizer;

impl InputTokenizer {
    /// Tokenizes a raw input string.
    ///
    /// - Splits on whitespace
    /// - Preserves quoted strings as atomic units; an unterminated quote
    ///   runs to the end of the input
    /// - Keeps the original case
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<InputToken> {
        let mut tokens = Vec::new();
        let mut chars = input.char_indices().peekable();
        let mut word_start: Option<usize> = None;

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '"' => {
                    if let Some(start) = word_start.take() {
                        tokens.push(word(input, start, pos));
                    }
                    let mut quoted = String::new();
                    let mut end = input.len();
                    for (at, c) in chars.by_ref() {
                        if c == '"' {
                            end = at + 1;
                            break;
                        }
                        quoted.push(c);
                    }
                    tokens.push(InputToken {
                        text: quoted,
                        quoted: true,
                        start: pos,
                        end,
                    });
                }
                c if c.is_whitespace() => {
                    if let Some(start) = word_start.take() {
                        tokens.push(word(input, start, pos));
                    }
                }
                _ => {
                    word_start.get_or_insert(pos);
                }
            }
        }

        if let Some(start) = word_start {
            tokens.push(word(input, start, input.len()));
        }

        tokens
    }
}

fn word(input: &str, start: usize, end: usize) -> InputToken {
    InputToken {
        text: input[start..end].to_string(),
        quoted: false,
        start,
        end,
    }
}

/// Splits a command line into its verb word and the trimmed remainder.
///
/// Returns `None` for blank input.
#[must_use]
pub fn split_command(input: &str) -> Option<(&str, &str)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find(char::is_whitespace) {
        Some(at) => Some((&trimmed[..at], trimmed[at..].trim_start())),
        None => Some((trimmed, "")),
    }
}
