//! Integration tests for Layer 3: Command parsing
//!
//! Tests for verb names, argument patterns, and resolving player input
//! against a world.

mod patterns;
mod resolution;
