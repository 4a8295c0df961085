//! The boundary between running scripts and the object graph.
//!
//! The interpreter owns no world state. Every builtin that reads or writes
//! objects goes through a [`HostContext`], which the runtime implements over
//! a world snapshot, its call stack, and the command's [`Budget`].

use chrono::{DateTime, Utc};

use moorhen_foundation::{Handle, ListVec, ObjectId, Result, Value};

use crate::budget::Budget;

/// Object-graph access for script execution.
pub trait HostContext {
    /// The budget shared by the whole top-level command.
    fn budget(&mut self) -> &mut Budget;

    /// Sends a line of text to an object's connection, if it has one.
    fn notify(&mut self, target: ObjectId, message: &str) -> Result<()>;

    /// Resolves a property through the instance bag and its class chain.
    fn get_property(&self, object: ObjectId, name: &str) -> Result<Option<Value>>;

    /// Writes a property to the instance's own bag.
    fn set_property(&mut self, object: ObjectId, name: &str, value: Value) -> Result<()>;

    /// Removes a property override from the instance's own bag.
    fn clear_property(&mut self, object: ObjectId, name: &str) -> Result<()>;

    /// Returns where an object is.
    fn location(&self, object: ObjectId) -> Result<Option<ObjectId>>;

    /// Returns what an object contains, in handle order.
    fn contents(&self, object: ObjectId) -> Result<Vec<ObjectId>>;

    /// Moves an object, `None` meaning nowhere.
    fn move_object(&mut self, object: ObjectId, destination: Option<ObjectId>) -> Result<()>;

    /// Instantiates the named class.
    fn create(&mut self, class: &str, location: Option<ObjectId>) -> Result<ObjectId>;

    /// Destroys an object, relocating its contents to nowhere.
    fn destroy(&mut self, object: ObjectId) -> Result<()>;

    /// Returns the name of an object's class.
    fn class_of(&self, object: ObjectId) -> Result<String>;

    /// Returns the canonical name of a class, if it exists.
    fn class_named(&self, name: &str) -> Option<String>;

    /// Checks whether an object's class is, or inherits from, the named class.
    fn is_a(&self, object: ObjectId, class: &str) -> Result<bool>;

    /// Returns an object's handle.
    fn handle_of(&self, object: ObjectId) -> Result<Handle>;

    /// Looks up an object by handle.
    fn object_by_handle(&self, handle: Handle) -> Option<ObjectId>;

    /// Checks a permission flag on an object.
    fn has_permission(&self, object: ObjectId, flag: &str) -> Result<bool>;

    /// Calls a function on `target` with positional arguments.
    ///
    /// `line` is the line of the calling form, recorded in the new frame.
    fn call_function(
        &mut self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        line: u32,
    ) -> Result<Value>;

    /// Calls a verb on `target` directly, bypassing pattern matching.
    fn call_verb(&mut self, target: ObjectId, name: &str, args: Vec<Value>, line: u32)
    -> Result<Value>;

    /// Returns a random integer in `0..bound`. `bound` is positive.
    fn random(&mut self, bound: i64) -> i64;

    /// Returns the current time.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Context variables visible to a running snippet.
#[derive(Clone, Debug, PartialEq)]
pub struct Bindings {
    /// The object the code runs on (`this`).
    pub this: Value,
    /// The actor that caused the invocation (`caller`).
    pub caller: Value,
    /// Parsed arguments (`args`).
    pub args: Value,
    /// Unparsed argument text (`argstr`).
    pub argstr: Value,
    /// Name the verb was invoked by (`verb`).
    pub verb: Value,
}

impl Bindings {
    /// Bindings with everything nil and no arguments.
    #[must_use]
    pub fn new() -> Self {
        Self {
            this: Value::Nil,
            caller: Value::Nil,
            args: Value::List(ListVec::new()),
            argstr: Value::from(""),
            verb: Value::Nil,
        }
    }

    /// Sets `this`.
    #[must_use]
    pub fn with_this(mut self, this: ObjectId) -> Self {
        self.this = Value::Object(this);
        self
    }

    /// Sets `caller`.
    #[must_use]
    pub fn with_caller(mut self, caller: ObjectId) -> Self {
        self.caller = Value::Object(caller);
        self
    }

    /// Sets `args`.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = Value::list(args);
        self
    }

    /// Sets `argstr`.
    #[must_use]
    pub fn with_argstr(mut self, argstr: impl Into<String>) -> Self {
        self.argstr = Value::from(argstr.into());
        self
    }

    /// Sets `verb`.
    #[must_use]
    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Value::from(verb.into());
        self
    }
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}
