//! Script host, command dispatch, connections, and console for Moorhen.
//!
//! This crate provides:
//! - [`ScriptHost`] - runs verbs, functions, and snippets as transactions
//! - [`CommandDispatcher`] - routes player input to verbs and built-ins
//! - [`ActorWorker`] - one thread per connected player
//! - [`ConnectionRegistry`] - delivers committed notifications
//! - [`core_world`] and [`BootstrapLoader`] - the starting world
//! - [`Console`] - the interactive front end
//! - [`RuntimeConfig`] - limits and knobs, loadable from JSON

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod connection;
pub mod console;
pub mod dispatcher;
pub mod editor;
pub mod execution;
pub mod frame;
pub mod host;
pub mod resolve;
pub mod worker;

pub use bootstrap::{
    BootstrapFile, BootstrapLoader, CoreWorld, LoadReport, START_ROOM_PROPERTY, core_world,
    spawn_player,
};
pub use cache::CompileCache;
pub use config::{ExecutionLimits, RuntimeConfig};
pub use connection::{BufferedConnection, Connection, ConnectionRegistry, ConsoleConnection};
pub use console::Console;
pub use dispatcher::{
    CodeBuffer, CodeTarget, CommandDispatcher, Outcome, PROGRAMMER_FLAG, Session, UNKNOWN_COMMAND,
    describe_error,
};
pub use editor::{LineEditor, ReadResult, RustylineEditor, ScriptedEditor};
pub use execution::{Execution, Notice};
pub use frame::{CallFrame, CallStack, Scoped, StackOwner};
pub use host::{ExecutionContext, ScriptHost};
pub use resolve::{FunctionResolver, owner_label, verb_named};
pub use worker::ActorWorker;
