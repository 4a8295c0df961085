//! Command parsing for Moorhen.
//!
//! This crate turns a line of player input like `put lamp in box` into a
//! verb call: which verb, on which object, with which arguments.
//!
//! # Architecture
//!
//! ```text
//! "put lamp in box"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   TOKENIZER     │  → verb word "put", rest "lamp in box"
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CANDIDATES      │  → carried objects, room contents, room, actor,
//! │                 │    system object
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ VERB NAME +     │  → `put` on #7 with pattern "this in *"
//! │ PATTERN MATCH   │
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ VERB MATCH      │  → { verb, this: #7, args: ["box"], argstr }
//! └─────────────────┘
//! ```
//!
//! When nothing matches, [`CommandResolver`] retries the whole line as an
//! argument to the movement verb, after expanding direction abbreviations
//! through the [`MovementVocabulary`].
//!
//! # Modules
//!
//! - [`tokenizer`] - Split raw input into words and quoted strings
//! - [`pattern`] - Verb names with abbreviations and argument patterns
//! - [`vocabulary`] - Movement directions and their abbreviations
//! - [`resolver`] - Candidate search and first-match verb resolution

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod pattern;
pub mod resolver;
pub mod tokenizer;
pub mod vocabulary;

pub use pattern::{Pattern, PatternElement, PatternMatch, VerbName};
pub use resolver::{CommandResolver, VerbMatch, candidates};
pub use tokenizer::{InputToken, InputTokenizer, split_command};
pub use vocabulary::{Direction, MovementVocabulary};
