//! Core values, identifiers, diagnostics, and errors for Moorhen.
//!
//! This crate provides:
//! - [`Value`] - The tagged value stored in property bags and passed to scripts
//! - [`ObjectId`], [`ClassId`], [`Handle`] - Object and class identifiers
//! - [`Type`] - Type descriptors for function signatures
//! - [`Error`] - Rich error types with context
//! - [`Diagnostic`] and [`ScriptFault`] - Script compilation and runtime reports
//! - Persistent collections ([`ListVec`], [`PropertyBag`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod diagnostic;
pub mod error;
pub mod ids;
pub mod types;
pub mod value;

pub use collections::{ListVec, PropertyBag};
pub use diagnostic::{Diagnostic, FrameKind, ScriptFault, Severity, StackFrame};
pub use error::{Error, ErrorContext, ErrorKind, ExecutionLimit};
pub use ids::{ClassId, FunctionId, Handle, ObjectId, VerbId};
pub use types::Type;
pub use value::Value;

/// Result type alias using Moorhen's error type.
pub type Result<T> = std::result::Result<T, Error>;
