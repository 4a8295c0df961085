//! Per-invocation execution state.
//!
//! An [`Execution`] owns a world snapshot, the call stack, the budget, and
//! the notifications waiting for commit. It is the [`HostContext`] scripts
//! run against, so nested `call` and `call-verb` forms come back here and
//! push another frame. Reads of instance state are remembered so the
//! commit can tell whether they went stale.

use std::cell::RefCell;
use std::collections::BTreeSet;

use moorhen_foundation::{
    Error, ErrorKind, FrameKind, Handle, ObjectId, Result, Value, VerbId,
};
use moorhen_language::{Bindings, Budget, HostContext, run};
use moorhen_storage::{Function, Owner, PERMISSIONS_PROPERTY, Slot, World};

use crate::frame::{CallFrame, CallStack, StackOwner};
use crate::host::ScriptHost;
use crate::resolve::{FunctionResolver, owner_label, verb_named};

/// A message queued for delivery after commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Receiving player.
    pub target: ObjectId,
    /// Message text.
    pub message: String,
}

/// State of one top-level invocation.
pub struct Execution<'h> {
    host: &'h ScriptHost,
    world: World,
    stack: CallStack,
    budget: Budget,
    caller: Option<ObjectId>,
    outbox: Vec<Notice>,
    reads: RefCell<BTreeSet<Slot>>,
}

impl StackOwner for Execution<'_> {
    fn call_stack(&mut self) -> &mut CallStack {
        &mut self.stack
    }
}

impl<'h> Execution<'h> {
    pub(crate) fn new(host: &'h ScriptHost, world: World, caller: Option<ObjectId>) -> Self {
        Self {
            budget: host.config().limits.budget(),
            host,
            world,
            stack: CallStack::new(),
            caller,
            outbox: Vec::new(),
            reads: RefCell::new(BTreeSet::new()),
        }
    }

    /// Returns the snapshot being modified.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns the active frames.
    #[must_use]
    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    /// Returns the notifications queued so far.
    #[must_use]
    pub fn outbox(&self) -> &[Notice] {
        &self.outbox
    }

    /// Returns the slots scripts have read so far.
    #[must_use]
    pub fn reads(&self) -> BTreeSet<Slot> {
        self.reads.borrow().clone()
    }

    pub(crate) fn finish(self) -> (World, BTreeSet<Slot>, Vec<Notice>) {
        (self.world, self.reads.into_inner(), self.outbox)
    }

    fn note_read(&self, slot: Slot) {
        self.reads.borrow_mut().insert(slot);
    }

    /// Runs an ad-hoc snippet in an eval frame.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` or a `ScriptFault`.
    pub fn eval(&mut self, source: &str, bindings: &Bindings) -> Result<Value> {
        let owner = self
            .caller
            .map_or_else(|| "console".to_string(), |id| owner_label(&self.world, Owner::Instance(id)));
        let frame = CallFrame::new(FrameKind::Eval, owner, "eval", source);
        self.invoke(frame, &[], Vec::new(), bindings, None)
    }

    /// Runs a verb by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown verb, its `CompilationError`, or a
    /// `ScriptFault`.
    pub fn run_verb(&mut self, verb: VerbId, bindings: &Bindings, call_line: u32) -> Result<Value> {
        let verb = self.world.verb(verb)?;
        let frame = CallFrame::new(
            FrameKind::Verb,
            owner_label(&self.world, verb.owner),
            verb.name.as_str(),
            verb.code.as_str(),
        )
        .called_from(call_line);
        self.invoke(frame, &[], Vec::new(), bindings, None)
    }

    /// Runs the verb `name` on `target`, ignoring its pattern.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `target` has no such verb, or the verb's error.
    pub fn run_verb_named(
        &mut self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        call_line: u32,
    ) -> Result<Value> {
        let verb = verb_named(&self.world, target, name)?.id;
        let bindings = self.bindings_for(target).with_args(args).with_verb(name);
        self.run_verb(verb, &bindings, call_line)
    }

    /// Resolves, checks, and runs a function.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `ArityMismatch`, or `TypeMismatch` before the
    /// call, or a `ScriptFault` from inside it.
    pub fn run_function(
        &mut self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        call_line: u32,
    ) -> Result<Value> {
        let function = FunctionResolver::resolve(&self.world, target, name)?.clone();
        FunctionResolver::check_arguments(&function, &args)?;
        let params: Vec<String> = function.params.iter().map(|p| p.name.clone()).collect();
        let frame = CallFrame::new(
            FrameKind::Function,
            owner_label(&self.world, function.owner),
            function.name.as_str(),
            function.code.as_str(),
        )
        .called_from(call_line);
        let bindings = self.bindings_for(target).with_verb(name);
        self.invoke(frame, &params, args, &bindings, Some(&function))
    }

    fn bindings_for(&self, this: ObjectId) -> Bindings {
        let bindings = Bindings::new().with_this(this);
        match self.caller {
            Some(caller) => bindings.with_caller(caller),
            None => bindings,
        }
    }

    /// Compiles and runs `frame`'s source with the frame pushed. A
    /// function's return value is checked against its declared type.
    ///
    /// Errors raised while the frame is active become a `ScriptFault`
    /// carrying the stack at that point. Compilation and depth errors
    /// happen before the push and surface at the caller's call site.
    fn invoke(
        &mut self,
        frame: CallFrame,
        params: &[String],
        args: Vec<Value>,
        bindings: &Bindings,
        function: Option<&Function>,
    ) -> Result<Value> {
        let program = self.host.compile(&frame.source, params)?;
        self.budget.enter()?;
        let result = {
            let mut scope = CallStack::scoped(self, frame);
            run(&program, bindings, args, &mut *scope)
                .and_then(|value| match function {
                    Some(function) => {
                        FunctionResolver::check_return(function, &value).map(|()| value)
                    }
                    None => Ok(value),
                })
                .map_err(|error| scope.fault(error))
        };
        self.budget.leave();
        result
    }

    /// Turns an error raised in the current frame into a fault.
    fn fault(&self, error: Error) -> Error {
        if error.as_script_fault().is_some() {
            return error;
        }
        let line = error
            .context
            .as_ref()
            .and_then(|c| c.line)
            .and_then(|line| u32::try_from(line).ok())
            .unwrap_or(0);
        let message = match &error.kind {
            ErrorKind::LimitExceeded(limit) => limit.to_string(),
            _ => error.to_string(),
        };
        Error::script_fault(self.stack.capture(message, line))
    }
}

impl HostContext for Execution<'_> {
    fn budget(&mut self) -> &mut Budget {
        &mut self.budget
    }

    fn notify(&mut self, target: ObjectId, message: &str) -> Result<()> {
        self.world.instance(target)?;
        self.outbox.push(Notice {
            target,
            message: message.to_string(),
        });
        Ok(())
    }

    fn get_property(&self, object: ObjectId, name: &str) -> Result<Option<Value>> {
        self.note_read(Slot::Property(object, name.to_string()));
        Ok(self.world.get_property(object, name)?.cloned())
    }

    fn set_property(&mut self, object: ObjectId, name: &str, value: Value) -> Result<()> {
        self.world.set_property(object, name, value)
    }

    fn clear_property(&mut self, object: ObjectId, name: &str) -> Result<()> {
        self.world.clear_property(object, name)
    }

    fn location(&self, object: ObjectId) -> Result<Option<ObjectId>> {
        self.note_read(Slot::Location(object));
        Ok(self.world.instance(object)?.location)
    }

    fn contents(&self, object: ObjectId) -> Result<Vec<ObjectId>> {
        self.note_read(Slot::Contents(Some(object)));
        self.world.instance(object)?;
        Ok(self.world.objects_in(Some(object)))
    }

    fn move_object(&mut self, object: ObjectId, destination: Option<ObjectId>) -> Result<()> {
        self.world.move_to(object, destination)
    }

    fn create(&mut self, class: &str, location: Option<ObjectId>) -> Result<ObjectId> {
        let class = self
            .world
            .class_by_name(class)
            .map(|c| c.id)
            .ok_or_else(|| Error::not_found(format!("class {class}")))?;
        self.world.instantiate(class, location)
    }

    fn destroy(&mut self, object: ObjectId) -> Result<()> {
        self.world.destroy(object)
    }

    fn class_of(&self, object: ObjectId) -> Result<String> {
        let class = self.world.instance(object)?.class;
        Ok(self.world.class(class)?.name.clone())
    }

    fn class_named(&self, name: &str) -> Option<String> {
        self.world.class_by_name(name).map(|c| c.name.clone())
    }

    fn is_a(&self, object: ObjectId, class: &str) -> Result<bool> {
        let own = self.world.instance(object)?.class;
        Ok(self
            .world
            .class_by_name(class)
            .is_some_and(|c| self.world.inherits_from(own, c.id)))
    }

    fn handle_of(&self, object: ObjectId) -> Result<Handle> {
        Ok(self.world.instance(object)?.handle)
    }

    fn object_by_handle(&self, handle: Handle) -> Option<ObjectId> {
        self.world.find_by_handle(handle).map(|i| i.id)
    }

    fn has_permission(&self, object: ObjectId, flag: &str) -> Result<bool> {
        self.note_read(Slot::Property(object, PERMISSIONS_PROPERTY.to_string()));
        self.world.instance(object)?;
        Ok(self.world.has_permission(object, flag))
    }

    fn call_function(
        &mut self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        line: u32,
    ) -> Result<Value> {
        self.run_function(target, name, args, line)
    }

    fn call_verb(
        &mut self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        line: u32,
    ) -> Result<Value> {
        self.run_verb_named(target, name, args, line)
    }

    fn random(&mut self, bound: i64) -> i64 {
        self.host.random(bound)
    }
}
