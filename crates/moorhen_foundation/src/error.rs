//! Error types for the Moorhen system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Expected negative outcomes (an unresolved verb, an absent property) are
//! modelled as `Option` by the callers; this type is for genuine failures.

use std::fmt;

use thiserror::Error;

use crate::diagnostic::{Diagnostic, ScriptFault};
use crate::types::Type;

/// The main error type for Moorhen operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(what.into()))
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: String, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates an invalid ancestry error.
    #[must_use]
    pub fn invalid_ancestry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAncestry(message.into()))
    }

    /// Creates a permission denied error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied(message.into()))
    }

    /// Creates a compilation error from the compiler's diagnostics.
    #[must_use]
    pub fn compilation(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(ErrorKind::CompilationError(diagnostics))
    }

    /// Creates a script fault error.
    #[must_use]
    pub fn script_fault(fault: ScriptFault) -> Self {
        Self::new(ErrorKind::ScriptFault(Box::new(fault)))
    }

    /// Creates an execution limit error.
    #[must_use]
    pub fn limit_exceeded(limit: ExecutionLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage(message.into()))
    }

    /// Creates a commit conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict(message.into()))
    }

    /// Returns true when a commit lost a race and may be retried.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::Conflict(_))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Creates an error raised by script code.
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Raised(message.into()))
    }

    /// Returns the script fault carried by this error, if any.
    #[must_use]
    pub fn as_script_fault(&self) -> Option<&ScriptFault> {
        match &self.kind {
            ErrorKind::ScriptFault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns the compiler diagnostics carried by this error, if any.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match &self.kind {
            ErrorKind::CompilationError(diags) => Some(diags),
            _ => None,
        }
    }

    /// Returns true for errors that originate in script code rather than
    /// the object store.
    #[must_use]
    pub fn is_script_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CompilationError(_) | ErrorKind::ScriptFault(_)
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// An object, class, verb, or function does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A class or record with the same name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Attempt to instantiate an abstract class.
    #[error("cannot instantiate abstract class {0}")]
    AbstractInstantiation(String),

    /// Parent class is missing or would create a cycle.
    #[error("invalid ancestry: {0}")]
    InvalidAncestry(String),

    /// A class still has instances or subclasses.
    #[error("class in use: {0}")]
    ClassInUse(String),

    /// A move would make an object contain itself.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// One or more diagnostics from compiling a snippet.
    #[error("compilation failed:{}", format_diagnostics(.0))]
    CompilationError(Vec<Diagnostic>),

    /// Runtime failure inside script code.
    #[error("script fault: {0}")]
    ScriptFault(Box<ScriptFault>),

    /// Capability check failed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: Type,
        /// The actual type encountered.
        actual: Type,
    },

    /// Wrong number of arguments to a function.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An execution budget ran out.
    #[error("limit exceeded: {0}")]
    LimitExceeded(ExecutionLimit),

    /// The persistence layer failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Another commit wrote state this transaction depended on.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File I/O failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// Raised explicitly by script code with `(error ...)`.
    #[error("{0}")]
    Raised(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diagnostics {
        out.push_str("\n  ");
        out.push_str(&d.to_string());
    }
    out
}

/// Execution budgets (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionLimit {
    /// Instruction budget for one top-level command ran out.
    MaxTicks {
        /// The configured limit.
        limit: u64,
    },
    /// Wall-clock budget for one top-level command ran out.
    MaxWallTime {
        /// The configured limit in milliseconds.
        limit_ms: u64,
    },
    /// Too many nested verb/function calls.
    MaxDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for ExecutionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxTicks { limit } => write!(f, "max ticks ({limit}) exceeded"),
            Self::MaxWallTime { limit_ms } => {
                write!(f, "max wall time ({limit_ms}ms) exceeded")
            }
            Self::MaxDepth { limit } => write!(f, "max call depth ({limit}) exceeded"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Object or verb the error relates to.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        Ok(())
    }
}
