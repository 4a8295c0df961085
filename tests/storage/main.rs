//! Integration tests for Layer 1: Storage
//!
//! Tests for classes, instances, containment, code records, and the
//! transactional database.

mod classes;
mod code;
mod database;
mod instances;
