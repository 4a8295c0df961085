//! The Moorhen script language.
//!
//! Scripts are s-expressions evaluated against the object graph:
//!
//! ```text
//! (let [here (location caller)]
//!   (tell "You are in " (get-or here "name" "somewhere") ".")
//!   (for [thing (contents here)]
//!     (unless (= thing caller)
//!       (tell "  " (get thing "name")))))
//! ```
//!
//! This crate provides:
//! - [`Lexer`] and [`Parser`] - source to forms, recovering from errors
//! - [`compile`] - forms to a resolved [`Program`], with every diagnostic
//! - [`Interpreter`] - evaluates a program through a [`HostContext`]
//! - [`Budget`] - tick, wall-time, and depth limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod budget;
pub mod builtin;
pub mod compiler;
pub mod host;
pub mod interpreter;
pub mod lexer;
mod native;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::Ast;
pub use budget::Budget;
pub use builtin::{Arity, Builtin};
pub use compiler::{
    Compiler, ContextVar, Expr, Node, Program, SPECIAL_FORMS, compile, compile_with_limits,
    compile_with_params,
};
pub use host::{Bindings, HostContext};
pub use interpreter::{Interpreter, run};
pub use lexer::Lexer;
pub use parser::{
    DEFAULT_MAX_NESTING, ParseOutput, Parser, parse, parse_strict, parse_with_max_nesting,
};
pub use span::Span;
pub use token::{Token, TokenKind};
