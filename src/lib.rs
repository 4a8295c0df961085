//! Moorhen - multi-user object world with scripted verbs
//!
//! This crate re-exports all layers of the Moorhen system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: moorhen_runtime    - Script host, dispatcher, workers, console
//! Layer 3: moorhen_parser     - Command tokenizing, patterns, verb resolution
//! Layer 2: moorhen_language   - Lexer, parser, compiler, interpreter
//! Layer 1: moorhen_storage    - Classes, instances, code records, transactions
//! Layer 0: moorhen_foundation - Core types (Value, ids, Error, diagnostics)
//! ```

pub use moorhen_foundation as foundation;
pub use moorhen_language as language;
pub use moorhen_parser as parser;
pub use moorhen_runtime as runtime;
pub use moorhen_storage as storage;
