//! Call frames and the per-invocation call stack.
//!
//! Frames are immutable once pushed and link to their parent, so the stack
//! at any point is a chain of `Arc`s from the innermost frame outwards.
//! Frames are pushed through [`CallStack::scoped`], whose guard pops them
//! on every exit path.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use moorhen_foundation::{FrameKind, ScriptFault, StackFrame};

/// One active verb, function, or eval.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Display label of the owner (`#12`, `class room`).
    pub owner: String,
    /// Verb or function name.
    pub name: String,
    /// What kind of code this frame runs.
    pub kind: FrameKind,
    /// Source text the frame runs.
    pub source: Arc<str>,
    /// Line in the parent frame that made this call, 0 at top level.
    pub call_line: u32,
    parent: Option<Arc<CallFrame>>,
}

impl CallFrame {
    /// Creates an unlinked frame.
    #[must_use]
    pub fn new(
        kind: FrameKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            kind,
            source: source.into(),
            call_line: 0,
            parent: None,
        }
    }

    /// Records the line in the parent that made this call.
    #[must_use]
    pub fn called_from(mut self, line: u32) -> Self {
        self.call_line = line;
        self
    }

    /// Returns the calling frame.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<CallFrame>> {
        self.parent.as_ref()
    }
}

/// The frames of one top-level invocation.
#[derive(Clone, Debug, Default)]
pub struct CallStack {
    top: Option<Arc<CallFrame>>,
    depth: usize,
}

/// Something that owns a [`CallStack`].
pub trait StackOwner {
    /// Returns the owned stack.
    fn call_stack(&mut self) -> &mut CallStack;
}

impl StackOwner for CallStack {
    fn call_stack(&mut self) -> &mut CallStack {
        self
    }
}

/// Keeps a frame pushed for as long as it lives.
///
/// Derefs to the stack's owner so the frame's code can run against it.
pub struct Scoped<'a, T: StackOwner + ?Sized> {
    owner: &'a mut T,
}

impl<T: StackOwner + ?Sized> Deref for Scoped<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: StackOwner + ?Sized> DerefMut for Scoped<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: StackOwner + ?Sized> Drop for Scoped<'_, T> {
    fn drop(&mut self) {
        self.owner.call_stack().pop();
    }
}

impl CallStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `frame` onto `owner`'s stack until the guard is dropped.
    pub fn scoped<T: StackOwner + ?Sized>(owner: &mut T, frame: CallFrame) -> Scoped<'_, T> {
        owner.call_stack().push(frame);
        Scoped { owner }
    }

    fn push(&mut self, mut frame: CallFrame) {
        frame.parent = self.top.take();
        self.top = Some(Arc::new(frame));
        self.depth += 1;
    }

    fn pop(&mut self) {
        if let Some(top) = self.top.take() {
            self.top = top.parent.clone();
            self.depth -= 1;
        }
    }

    /// Number of active frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true when no frame is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Returns the innermost frame.
    #[must_use]
    pub fn current(&self) -> Option<&Arc<CallFrame>> {
        self.top.as_ref()
    }

    /// Iterates over the active frames, innermost first.
    pub fn frames(&self) -> impl Iterator<Item = &CallFrame> {
        std::iter::successors(self.top.as_deref(), |frame| frame.parent.as_deref())
    }

    /// Captures the stack into a fault.
    ///
    /// The innermost frame reports `line`; every outer frame reports the
    /// line where it called the frame inside it.
    #[must_use]
    pub fn capture(&self, message: impl Into<String>, line: u32) -> ScriptFault {
        let mut stack = Vec::with_capacity(self.depth);
        let mut current_line = line;
        for frame in self.frames() {
            stack.push(StackFrame {
                owner: frame.owner.clone(),
                name: frame.name.clone(),
                kind: frame.kind,
                line: current_line,
            });
            current_line = frame.call_line;
        }
        let source = self
            .top
            .as_ref()
            .map(|frame| frame.source.to_string())
            .unwrap_or_default();
        ScriptFault {
            message: message.into(),
            stack,
            source,
        }
    }
}
