//! Integration tests for Layer 2: Language
//!
//! Tests for parsing, compile diagnostics, and evaluation of scripts
//! against a live world.

mod compile;
mod evaluate;
