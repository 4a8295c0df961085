//! Compiler from parsed forms to a resolved expression tree.
//!
//! Compilation resolves every symbol (locals to slots, context variables,
//! builtins), checks special-form shapes and builtin arities, and collects
//! all diagnostics instead of stopping at the first one. Warnings are
//! returned with the [`Program`]; any error fails the whole compile with a
//! `CompilationError` carrying every diagnostic in source order.

#![allow(clippy::too_many_lines)]

use moorhen_foundation::{Diagnostic, Error, Handle, Result, Value};

use crate::ast::Ast;
use crate::builtin::Builtin;
use crate::parser::{DEFAULT_MAX_NESTING, parse_with_max_nesting};
use crate::span::Span;

/// Names handled by the compiler itself rather than by a builtin.
pub const SPECIAL_FORMS: &[&str] = &[
    "do", "if", "when", "unless", "let", "set!", "and", "or", "while", "for",
];

/// A context variable supplied by the invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContextVar {
    /// `this`
    This,
    /// `caller`
    Caller,
    /// `args`
    Args,
    /// `argstr`
    Argstr,
    /// `verb`
    Verb,
}

impl ContextVar {
    /// Looks up a context variable by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "this" => Some(Self::This),
            "caller" => Some(Self::Caller),
            "args" => Some(Self::Args),
            "argstr" => Some(Self::Argstr),
            "verb" => Some(Self::Verb),
            _ => None,
        }
    }
}

/// A compiled expression with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// What to evaluate.
    pub expr: Expr,
    /// Where it came from.
    pub span: Span,
}

impl Node {
    fn new(expr: Expr, span: Span) -> Self {
        Self { expr, span }
    }
}

/// Resolved expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal.
    Const(Value),
    /// An object handle literal, looked up when evaluated.
    Handle(Handle),
    /// A local variable slot.
    Local(usize),
    /// A context variable.
    Context(ContextVar),
    /// A list literal.
    List(Vec<Node>),
    /// `(do ...)`
    Do(Vec<Node>),
    /// `(if c then else?)`, also `when` and `unless`.
    If(Box<Node>, Box<Node>, Option<Box<Node>>),
    /// `(let [slot value ...] body...)`
    Let(Vec<(usize, Node)>, Vec<Node>),
    /// `(set! local value)`
    SetLocal(usize, Box<Node>),
    /// `(and ...)`
    And(Vec<Node>),
    /// `(or ...)`
    Or(Vec<Node>),
    /// `(while cond body...)`
    While(Box<Node>, Vec<Node>),
    /// `(for [slot list] body...)`
    For(usize, Box<Node>, Vec<Node>),
    /// A builtin call.
    Call(Builtin, Vec<Node>),
}

/// A compiled snippet.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    /// Top-level forms, evaluated in order.
    pub body: Vec<Node>,
    /// Parameter names, bound to the first slots.
    pub params: Vec<String>,
    /// Number of local slots needed, parameters included.
    pub slots: usize,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
}

struct Local {
    name: String,
    slot: usize,
    span: Span,
    used: bool,
    param: bool,
}

/// Compiler state for one snippet.
#[derive(Default)]
pub struct Compiler {
    scopes: Vec<Vec<Local>>,
    next_slot: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Compiler {
    /// Creates a compiler with one empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Vec::new()],
            next_slot: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Compiles parsed forms. `params` take the first local slots.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` with every diagnostic if any is an error.
    pub fn compile_forms(
        mut self,
        forms: &[Ast],
        params: &[String],
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<Program> {
        for name in params {
            self.bind(name, Span::at_start());
            if let Some(local) = self.scopes.last_mut().and_then(|s| s.last_mut()) {
                local.param = true;
            }
        }

        let body: Vec<Node> = forms.iter().filter_map(|f| self.compile_node(f)).collect();
        self.pop_scope();

        diagnostics.append(&mut self.diagnostics);
        diagnostics.sort_by_key(|d| (d.line, d.column));
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(Error::compilation(diagnostics));
        }
        Ok(Program {
            body,
            params: params.to_vec(),
            slots: self.next_slot,
            warnings: diagnostics,
        })
    }

    fn compile_node(&mut self, ast: &Ast) -> Option<Node> {
        let span = ast.span();
        let expr = match ast {
            Ast::Nil(_) => Expr::Const(Value::Nil),
            Ast::Bool(b, _) => Expr::Const(Value::Bool(*b)),
            Ast::Int(n, _) => Expr::Const(Value::Int(*n)),
            Ast::Float(n, _) => Expr::Const(Value::Float(*n)),
            Ast::String(s, _) => Expr::Const(Value::from(s.as_str())),
            Ast::Handle(n, _) => Expr::Handle(Handle::new(*n)),
            Ast::Symbol(name, _) => self.resolve_symbol(name, span)?,
            Ast::Vector(items, _) => Expr::List(self.compile_all(items)?),
            Ast::List(items, _) => self.compile_list(items, span)?,
        };
        Some(Node::new(expr, span))
    }

    /// Compiles every form, even after a failure, so all errors are seen.
    fn compile_all(&mut self, forms: &[Ast]) -> Option<Vec<Node>> {
        let mut nodes = Vec::with_capacity(forms.len());
        let mut ok = true;
        for form in forms {
            match self.compile_node(form) {
                Some(node) => nodes.push(node),
                None => ok = false,
            }
        }
        ok.then_some(nodes)
    }

    fn compile_boxed(&mut self, form: &Ast) -> Option<Box<Node>> {
        self.compile_node(form).map(Box::new)
    }

    fn resolve_symbol(&mut self, name: &str, span: Span) -> Option<Expr> {
        if let Some(slot) = self.lookup(name) {
            return Some(Expr::Local(slot));
        }
        if let Some(var) = ContextVar::from_name(name) {
            return Some(Expr::Context(var));
        }
        if SPECIAL_FORMS.contains(&name) || Builtin::from_name(name).is_some() {
            return self.error(span, format!("{name} can only be used in call position"));
        }
        self.error(span, format!("unbound symbol: {name}"))
    }

    fn compile_list(&mut self, items: &[Ast], span: Span) -> Option<Expr> {
        let Some((head, args)) = items.split_first() else {
            return self.error(span, "empty call form");
        };
        let Some(name) = head.as_symbol() else {
            self.compile_all(args);
            return self.error(head.span(), format!("cannot call a {}", head.type_name()));
        };

        match name {
            "do" => Some(Expr::Do(self.compile_all(args)?)),
            "if" => self.compile_if(args, span),
            "when" | "unless" => self.compile_when(name, args, span),
            "let" => self.compile_let(args, span),
            "set!" => self.compile_set(args, span),
            "and" => Some(Expr::And(self.compile_all(args)?)),
            "or" => Some(Expr::Or(self.compile_all(args)?)),
            "while" => self.compile_while(args, span),
            "for" => self.compile_for(args, span),
            _ => self.compile_call(name, head.span(), args),
        }
    }

    fn compile_call(&mut self, name: &str, span: Span, args: &[Ast]) -> Option<Expr> {
        let compiled = self.compile_all(args);
        let Some(builtin) = Builtin::from_name(name) else {
            if self.lookup(name).is_some() || ContextVar::from_name(name).is_some() {
                return self.error(span, format!("{name} is not a function"));
            }
            return self.error(span, format!("unknown function: {name}"));
        };
        let arity = builtin.arity();
        if !arity.accepts(args.len()) {
            return self.error(
                span,
                format!(
                    "{name} expects {arity} argument{}, got {}",
                    if arity.min == 1 && arity.max == Some(1) { "" } else { "s" },
                    args.len()
                ),
            );
        }
        Some(Expr::Call(builtin, compiled?))
    }

    fn compile_if(&mut self, args: &[Ast], span: Span) -> Option<Expr> {
        let compiled = self.compile_all(args);
        if !(2..=3).contains(&args.len()) {
            return self.error(span, "if expects a condition, a branch, and an optional else branch");
        }
        let mut nodes = compiled?.into_iter().map(Box::new);
        let cond = nodes.next()?;
        let then = nodes.next()?;
        Some(Expr::If(cond, then, nodes.next()))
    }

    fn compile_when(&mut self, name: &str, args: &[Ast], span: Span) -> Option<Expr> {
        let Some((cond, body)) = args.split_first() else {
            return self.error(span, format!("{name} expects a condition"));
        };
        let cond = self.compile_boxed(cond);
        let body = Node::new(Expr::Do(self.compile_all(body)?), span);
        let cond = cond?;
        Some(if name == "when" {
            Expr::If(cond, Box::new(body), None)
        } else {
            let nil = Node::new(Expr::Const(Value::Nil), span);
            Expr::If(cond, Box::new(nil), Some(Box::new(body)))
        })
    }

    fn compile_let(&mut self, args: &[Ast], span: Span) -> Option<Expr> {
        let Some((Ast::Vector(pairs, vspan), body)) = args.split_first() else {
            return self.error(span, "let expects a binding vector");
        };
        if pairs.len() % 2 != 0 {
            self.compile_all(pairs);
            return self.error(*vspan, "let bindings must be name/value pairs");
        }

        self.scopes.push(Vec::new());
        let mut bindings = Vec::with_capacity(pairs.len() / 2);
        let mut ok = true;
        for pair in pairs.chunks(2) {
            let value = self.compile_node(&pair[1]);
            match (self.binding_name(&pair[0]), value) {
                (Some(name), Some(value)) => {
                    let slot = self.bind(name, pair[0].span());
                    bindings.push((slot, value));
                }
                _ => ok = false,
            }
        }
        let body = self.compile_all(body);
        self.pop_scope();
        let body = body?;
        ok.then_some(Expr::Let(bindings, body))
    }

    fn compile_set(&mut self, args: &[Ast], span: Span) -> Option<Expr> {
        let [target, value] = args else {
            self.compile_all(args);
            return self.error(span, "set! expects a name and a value");
        };
        let value = self.compile_boxed(value);
        let Some(name) = target.as_symbol() else {
            return self.error(target.span(), "set! target must be a name");
        };
        let Some(slot) = self.lookup(name) else {
            return self.error(target.span(), format!("set! of unbound local: {name}"));
        };
        Some(Expr::SetLocal(slot, value?))
    }

    fn compile_while(&mut self, args: &[Ast], span: Span) -> Option<Expr> {
        let Some((cond, body)) = args.split_first() else {
            return self.error(span, "while expects a condition");
        };
        let cond = self.compile_boxed(cond);
        let body = self.compile_all(body);
        Some(Expr::While(cond?, body?))
    }

    fn compile_for(&mut self, args: &[Ast], span: Span) -> Option<Expr> {
        let Some((Ast::Vector(spec, vspan), body)) = args.split_first() else {
            return self.error(span, "for expects a [name list] vector");
        };
        let [name, list] = spec.as_slice() else {
            return self.error(*vspan, "for expects a [name list] vector");
        };

        let list = self.compile_boxed(list);
        let name = self.binding_name(name);
        self.scopes.push(Vec::new());
        let slot = name.map(|n| self.bind(n, spec[0].span()));
        let body = self.compile_all(body);
        self.pop_scope();
        Some(Expr::For(slot?, list?, body?))
    }

    fn binding_name<'a>(&mut self, ast: &'a Ast) -> Option<&'a str> {
        let Some(name) = ast.as_symbol() else {
            return self.error(ast.span(), format!("cannot bind a {}", ast.type_name()));
        };
        if ContextVar::from_name(name).is_some() || SPECIAL_FORMS.contains(&name) {
            return self.error(ast.span(), format!("cannot bind reserved name: {name}"));
        }
        Some(name)
    }

    fn bind(&mut self, name: &str, span: Span) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(Local {
                name: name.to_string(),
                slot,
                span,
                used: false,
                param: false,
            });
        }
        slot
    }

    /// Resolves a name to the innermost local and marks it used.
    fn lookup(&mut self, name: &str) -> Option<usize> {
        self.scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut().rev())
            .find(|local| local.name == name)
            .map(|local| {
                local.used = true;
                local.slot
            })
    }

    fn pop_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        for local in scope {
            if !local.used && !local.param && !local.name.starts_with('_') {
                self.diagnostics.push(Diagnostic::warning(
                    format!("unused binding: {}", local.name),
                    local.span.line,
                    local.span.column,
                ));
            }
        }
    }

    fn error<T>(&mut self, span: Span, message: impl Into<String>) -> Option<T> {
        self.diagnostics
            .push(Diagnostic::error(message, span.line, span.column));
        None
    }
}

/// Compiles a snippet with no parameters.
///
/// # Errors
///
/// Returns `CompilationError` carrying every syntax and semantic error.
pub fn compile(source: &str) -> Result<Program> {
    compile_with_params(source, &[])
}

/// Compiles a function body whose parameters are bound by name.
///
/// # Errors
///
/// Returns `CompilationError` carrying every syntax and semantic error.
pub fn compile_with_params(source: &str, params: &[String]) -> Result<Program> {
    compile_with_limits(source, params, DEFAULT_MAX_NESTING)
}

/// Compiles a function body, refusing forms nested deeper than
/// `max_nesting`.
///
/// # Errors
///
/// Returns `CompilationError` carrying every syntax and semantic error.
pub fn compile_with_limits(source: &str, params: &[String], max_nesting: usize) -> Result<Program> {
    let parsed = parse_with_max_nesting(source, max_nesting);
    Compiler::new().compile_forms(&parsed.forms, params, parsed.diagnostics)
}
