//! Script diagnostics and runtime fault reports.
//!
//! A [`Diagnostic`] describes one problem found while compiling a snippet.
//! A [`ScriptFault`] describes a runtime failure together with the chain of
//! verb/function calls that were active when it happened.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Compilation still succeeds.
    Warning,
    /// Compilation fails.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One problem reported by the script compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable description.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// Error or warning.
    pub severity: Severity,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Error,
        }
    }

    /// Creates a warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            severity: Severity::Warning,
        }
    }

    /// Returns true for error-severity diagnostics.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.severity, self.message
        )
    }
}

/// What kind of code a stack frame was running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A pattern-matched verb.
    Verb,
    /// An explicitly addressed function.
    Function,
    /// An ad-hoc snippet (`@eval`).
    Eval,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verb => write!(f, "verb"),
            Self::Function => write!(f, "function"),
            Self::Eval => write!(f, "eval"),
        }
    }
}

/// One entry of a captured call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    /// Display label of the owner the code was found on (`#12`, `class room`).
    pub owner: String,
    /// Verb or function name.
    pub name: String,
    /// What kind of code this frame ran.
    pub kind: FrameKind,
    /// Line in the frame's source that was executing (1-based, 0 if unknown).
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.kind, self.owner, self.name)?;
        if self.line > 0 {
            write!(f, " (line {})", self.line)?;
        }
        Ok(())
    }
}

/// A runtime failure inside script code.
///
/// The stack lists frames innermost first. `source` is the text of the
/// innermost frame, kept so reports can show the offending line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFault {
    /// What went wrong.
    pub message: String,
    /// Active frames, innermost first.
    pub stack: Vec<StackFrame>,
    /// Source text of the innermost frame.
    pub source: String,
}

impl ScriptFault {
    /// Creates a fault with an empty stack.
    #[must_use]
    pub fn new(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: Vec::new(),
            source: source.into(),
        }
    }

    /// Returns the innermost frame, if any.
    #[must_use]
    pub fn innermost(&self) -> Option<&StackFrame> {
        self.stack.first()
    }

    /// Returns the source line the innermost frame was executing.
    #[must_use]
    pub fn offending_line(&self) -> Option<&str> {
        let line = self.innermost()?.line;
        if line == 0 {
            return None;
        }
        self.source.lines().nth(line as usize - 1)
    }
}

impl fmt::Display for ScriptFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for frame in &self.stack {
            write!(f, "\n  in {frame}")?;
        }
        if let Some(text) = self.offending_line() {
            write!(f, "\n  > {}", text.trim())?;
        }
        Ok(())
    }
}
