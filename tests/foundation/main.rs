//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Type, handles, errors, and fault reports.

mod errors;
mod types;
mod values;
