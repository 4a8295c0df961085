//! Tree-walking evaluator for compiled [`Program`]s.
//!
//! Every evaluated node charges one tick to the host's [`Budget`]. Errors
//! are stamped with the position of the innermost form that raised them,
//! which is what fault reports use as the offending line.
//!
//! [`Budget`]: crate::budget::Budget

use moorhen_foundation::{Error, ErrorContext, Handle, ObjectId, Result, Type, Value};

use crate::builtin::Builtin;
use crate::compiler::{ContextVar, Expr, Node, Program};
use crate::host::{Bindings, HostContext};
use crate::native::{self, expect_int, expect_str, text_of, type_error};
use crate::span::Span;

/// Evaluates one program invocation.
pub struct Interpreter<'a, H: HostContext + ?Sized> {
    host: &'a mut H,
    bindings: &'a Bindings,
    slots: Vec<Value>,
}

impl<'a, H: HostContext + ?Sized> Interpreter<'a, H> {
    /// Creates an interpreter over `host` with the given context variables.
    pub fn new(host: &'a mut H, bindings: &'a Bindings) -> Self {
        Self {
            host,
            bindings,
            slots: Vec::new(),
        }
    }

    /// Runs `program` with `params` bound to its parameter slots.
    ///
    /// Returns the value of the last top-level form, or nil.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if `params` does not match the program's
    /// parameters, or the first error raised while evaluating.
    pub fn run(mut self, program: &Program, params: Vec<Value>) -> Result<Value> {
        if params.len() != program.params.len() {
            return Err(Error::arity_mismatch(
                program.params.len().to_string(),
                params.len(),
            ));
        }
        self.slots = params;
        self.slots.resize(program.slots.max(program.params.len()), Value::Nil);
        self.eval_body(&program.body)
    }

    fn eval_body(&mut self, body: &[Node]) -> Result<Value> {
        let mut last = Value::Nil;
        for node in body {
            last = self.eval(node)?;
        }
        Ok(last)
    }

    fn eval(&mut self, node: &Node) -> Result<Value> {
        self.host
            .budget()
            .tick()
            .map_err(|e| locate(e, node.span))?;

        match &node.expr {
            Expr::Const(value) => Ok(value.clone()),
            Expr::Handle(handle) => self
                .host
                .object_by_handle(*handle)
                .map(Value::Object)
                .ok_or_else(|| locate(Error::not_found(format!("object {handle}")), node.span)),
            Expr::Local(slot) => Ok(self.slots.get(*slot).cloned().unwrap_or(Value::Nil)),
            Expr::Context(var) => Ok(self.context(*var)),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::list(values))
            }
            Expr::Do(body) => self.eval_body(body),
            Expr::If(cond, then, otherwise) => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise)
                } else {
                    Ok(Value::Nil)
                }
            }
            Expr::Let(bindings, body) => {
                for (slot, value) in bindings {
                    let value = self.eval(value)?;
                    self.store(*slot, value);
                }
                self.eval_body(body)
            }
            Expr::SetLocal(slot, value) => {
                let value = self.eval(value)?;
                self.store(*slot, value.clone());
                Ok(value)
            }
            Expr::And(items) => {
                let mut last = Value::Bool(true);
                for item in items {
                    last = self.eval(item)?;
                    if !last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::Or(items) => {
                let mut last = Value::Nil;
                for item in items {
                    last = self.eval(item)?;
                    if last.is_truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Expr::While(cond, body) => {
                while self.eval(cond)?.is_truthy() {
                    self.eval_body(body)?;
                }
                Ok(Value::Nil)
            }
            Expr::For(slot, list, body) => {
                let items = match self.eval(list)? {
                    Value::List(items) => items,
                    Value::Nil => return Ok(Value::Nil),
                    other => return Err(locate(type_error(Type::List, &other), list.span)),
                };
                for item in &items {
                    self.store(*slot, item.clone());
                    self.eval_body(body)?;
                }
                Ok(Value::Nil)
            }
            Expr::Call(builtin, args) => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.call(*builtin, values, node.span)
                    .map_err(|e| locate(e, node.span))
            }
        }
    }

    fn store(&mut self, slot: usize, value: Value) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = value;
        }
    }

    fn context(&self, var: ContextVar) -> Value {
        match var {
            ContextVar::This => self.bindings.this.clone(),
            ContextVar::Caller => self.bindings.caller.clone(),
            ContextVar::Args => self.bindings.args.clone(),
            ContextVar::Argstr => self.bindings.argstr.clone(),
            ContextVar::Verb => self.bindings.verb.clone(),
        }
    }

    fn call(&mut self, builtin: Builtin, args: Vec<Value>, span: Span) -> Result<Value> {
        let budget = self.host.budget();
        let cost = native::cost(builtin, &args, budget.remaining());
        budget.charge(cost)?;

        if builtin.is_pure() {
            return native::call(builtin, &args);
        }
        let arity = builtin.arity();
        if !arity.accepts(args.len()) {
            return Err(Error::arity_mismatch(arity.to_string(), args.len()));
        }

        let host = &mut *self.host;
        match builtin {
            Builtin::Now => Ok(Value::Timestamp(host.now())),
            Builtin::Random => {
                let bound = expect_int(&args[0])?;
                if bound <= 0 {
                    return Err(Error::raised("random bound must be positive"));
                }
                Ok(Value::Int(host.random(bound)))
            }

            Builtin::Notify => {
                host.notify(object_arg(&args[0])?, &text_of(&args[1..]))?;
                Ok(Value::Nil)
            }
            Builtin::Tell => {
                if let Value::Object(caller) = self.bindings.caller {
                    host.notify(caller, &text_of(&args))?;
                }
                Ok(Value::Nil)
            }

            Builtin::Get => Ok(host
                .get_property(object_arg(&args[0])?, expect_str(&args[1])?)?
                .unwrap_or(Value::Nil)),
            Builtin::GetOr => Ok(host
                .get_property(object_arg(&args[0])?, expect_str(&args[1])?)?
                .unwrap_or_else(|| args[2].clone())),
            Builtin::Set => {
                let value = args[2].clone();
                host.set_property(object_arg(&args[0])?, expect_str(&args[1])?, value.clone())?;
                Ok(value)
            }
            Builtin::Has => Ok(Value::Bool(
                host.get_property(object_arg(&args[0])?, expect_str(&args[1])?)?
                    .is_some(),
            )),
            Builtin::Clear => {
                host.clear_property(object_arg(&args[0])?, expect_str(&args[1])?)?;
                Ok(Value::Nil)
            }

            Builtin::Location => Ok(host
                .location(object_arg(&args[0])?)?
                .map_or(Value::Nil, Value::Object)),
            Builtin::Contents => Ok(Value::list(
                host.contents(object_arg(&args[0])?)?
                    .into_iter()
                    .map(Value::Object),
            )),
            Builtin::Move => {
                host.move_object(object_arg(&args[0])?, optional_object_arg(&args[1])?)?;
                Ok(Value::Nil)
            }
            Builtin::Create => {
                let location = match args.get(1) {
                    Some(location) => optional_object_arg(location)?,
                    None => None,
                };
                Ok(Value::Object(host.create(expect_str(&args[0])?, location)?))
            }
            Builtin::Destroy => {
                host.destroy(object_arg(&args[0])?)?;
                Ok(Value::Nil)
            }

            Builtin::ClassOf => Ok(Value::from(host.class_of(object_arg(&args[0])?)?)),
            Builtin::Class => Ok(host
                .class_named(expect_str(&args[0])?)
                .map_or(Value::Nil, Value::from)),
            Builtin::IsA => Ok(Value::Bool(
                host.is_a(object_arg(&args[0])?, expect_str(&args[1])?)?,
            )),
            Builtin::Handle => {
                let handle = host.handle_of(object_arg(&args[0])?)?;
                i64::try_from(handle.number())
                    .map(Value::Int)
                    .map_err(|_| Error::raised(format!("handle {handle} out of range")))
            }
            Builtin::Object => Ok(handle_arg(&args[0])?
                .and_then(|handle| host.object_by_handle(handle))
                .map_or(Value::Nil, Value::Object)),
            Builtin::Permission => Ok(Value::Bool(
                host.has_permission(object_arg(&args[0])?, expect_str(&args[1])?)?,
            )),

            Builtin::Call => host.call_function(
                object_arg(&args[0])?,
                expect_str(&args[1])?,
                args[2..].to_vec(),
                span.line,
            ),
            Builtin::CallVerb => host.call_verb(
                object_arg(&args[0])?,
                expect_str(&args[1])?,
                args[2..].to_vec(),
                span.line,
            ),

            pure => native::call(pure, &args),
        }
    }
}

/// Runs `program` against `host`.
///
/// # Errors
///
/// Returns the first error raised while evaluating.
pub fn run<H: HostContext + ?Sized>(
    program: &Program,
    bindings: &Bindings,
    params: Vec<Value>,
    host: &mut H,
) -> Result<Value> {
    Interpreter::new(host, bindings).run(program, params)
}

/// Stamps an error with a source position unless it already has one.
fn locate(error: Error, span: Span) -> Error {
    if error.context.is_some() {
        return error;
    }
    error.with_context(
        ErrorContext::new().with_position(span.line as usize, span.column as usize),
    )
}

fn object_arg(value: &Value) -> Result<ObjectId> {
    value.as_object().ok_or_else(|| type_error(Type::Object, value))
}

fn optional_object_arg(value: &Value) -> Result<Option<ObjectId>> {
    match value {
        Value::Nil => Ok(None),
        other => object_arg(other).map(Some),
    }
}

/// Accepts `12`, `"12"`, or `"#12"`. Malformed text is no handle at all.
fn handle_arg(value: &Value) -> Result<Option<Handle>> {
    match value {
        Value::Int(n) => Ok(u64::try_from(*n).ok().map(Handle::new)),
        Value::String(s) => Ok(s.trim().parse::<Handle>().ok()),
        other => Err(type_error(Type::Int, other)),
    }
}
