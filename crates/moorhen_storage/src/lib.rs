//! Object storage for Moorhen.
//!
//! This crate provides:
//! - [`World`] - classes, instances, containment, and verb/function
//!   registries in one snapshot-able value
//! - [`Database`] - the shared live world with transactional commits
//! - [`DocumentStore`] - the persistence boundary, with [`MemoryStore`]
//! - Record types ([`Class`], [`Instance`], [`Verb`], [`Function`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod alloc;
pub mod database;
pub mod document;
pub mod journal;
pub mod records;
pub mod world;

pub use alloc::IdAllocator;
pub use database::{COMMIT_ATTEMPTS, CommitSummary, Database};
pub use document::{Document, DocumentStore, DocumentStoreExt, MemoryStore};
pub use journal::{Change, RecordKey, Slot};
pub use records::{Class, Function, FunctionSpec, Instance, Owner, Param, Verb, VerbSpec};
pub use world::{PERMISSIONS_PROPERTY, WIZARD_FLAG, World};
