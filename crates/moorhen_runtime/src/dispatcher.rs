//! The command dispatcher.
//!
//! Each line a player types goes through, in order:
//!
//! 1. The code buffer, if the player is entering a multi-line program.
//! 2. Verb resolution across the candidate objects.
//! 3. The same resolution retried through the movement verb.
//! 4. The built-in commands (`help`, `quit`, `@eval`, `@program`,
//!    `@verbs`, `@abort`).
//! 5. `I don't understand that.`
//!
//! Failures in steps 2 to 4 are logged and reported to the player; they
//! never end the session.

use std::sync::Arc;

use tracing::{debug, warn};

use moorhen_foundation::{Error, ErrorKind, Handle, ObjectId, Result, VerbId};
use moorhen_parser::{CommandResolver, split_command};

use crate::connection::Connection;
use crate::host::{ExecutionContext, ScriptHost};
use crate::resolve::{owner_label, verb_named};

/// Reply when nothing handles a command.
pub const UNKNOWN_COMMAND: &str = "I don't understand that.";

/// Permission needed for `@eval` and `@program`.
pub const PROGRAMMER_FLAG: &str = "programmer";

const HELP_TEXT: &str = "\
Built-in commands:
  help                 Show this text
  quit                 Disconnect
  @eval <code>         Run code (no code: enter it line by line)
  @program #N:verb     Replace a verb's code, entered line by line
  @verbs #N            List the verbs an object responds to
  @abort               Discard code being entered
End multi-line code with a line containing only a period.";

/// What the session should do after a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading input.
    Continue,
    /// The player asked to leave.
    Quit,
}

/// Where buffered code goes once it is complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeTarget {
    /// Run it once.
    Eval,
    /// Replace a verb's code.
    Verb {
        /// The verb being programmed.
        verb: VerbId,
        /// `#N:name` as the player wrote it.
        label: String,
    },
}

/// Lines of code collected until a terminating `.`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBuffer {
    /// Destination.
    pub target: CodeTarget,
    /// Collected lines.
    pub lines: Vec<String>,
}

/// One player's connection-level state.
pub struct Session {
    actor: ObjectId,
    connection: Arc<dyn Connection>,
    buffer: Option<CodeBuffer>,
}

impl Session {
    /// Creates a session for `actor`.
    #[must_use]
    pub fn new(actor: ObjectId, connection: Arc<dyn Connection>) -> Self {
        Self {
            actor,
            connection,
            buffer: None,
        }
    }

    /// Returns the player object.
    #[must_use]
    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    /// Returns the player's connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Returns true while multi-line code is being entered.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.buffer.is_some()
    }

    /// Sends a message straight to the player.
    pub fn reply(&self, message: &str) {
        if let Err(error) = self.connection.send_message(message) {
            debug!(actor = %self.actor, %error, "reply not delivered");
        }
    }
}

/// Routes player input to verbs, built-ins, and the code buffer.
pub struct CommandDispatcher {
    host: Arc<ScriptHost>,
    resolver: CommandResolver,
}

impl CommandDispatcher {
    /// Creates a dispatcher. The system object is looked up now, so create
    /// the dispatcher after the world is bootstrapped.
    #[must_use]
    pub fn new(host: Arc<ScriptHost>) -> Self {
        let resolver = CommandResolver::new()
            .with_movement_verb(host.config().movement_verb.as_str())
            .with_system(host.system_object());
        Self { host, resolver }
    }

    /// Returns the script host.
    #[must_use]
    pub fn host(&self) -> &Arc<ScriptHost> {
        &self.host
    }

    /// Returns the verb resolver.
    #[must_use]
    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    /// Registers a player's connection and opens a session.
    pub fn connect(&self, actor: ObjectId, connection: Arc<dyn Connection>) -> Session {
        self.host
            .connections()
            .register(actor, Arc::clone(&connection));
        Session::new(actor, connection)
    }

    /// Closes a session's connection and forgets it.
    pub fn disconnect(&self, session: &Session) {
        session.connection.disconnect();
        self.host.connections().unregister(session.actor);
    }

    /// Handles one line of input.
    pub fn handle(&self, session: &mut Session, input: &str) -> Outcome {
        if session.buffer.is_some() {
            self.buffer_line(session, input);
            return Outcome::Continue;
        }

        let line = input.trim();
        if line.is_empty() {
            return Outcome::Continue;
        }

        let matched = self
            .host
            .database()
            .read(|world| self.resolver.resolve(world, session.actor, line));
        if let Some(matched) = matched {
            if let Err(error) = self.host.run_command(&matched, session.actor) {
                report(session, &error);
            }
            return Outcome::Continue;
        }

        match self.builtin(session, line) {
            Some(Ok(outcome)) => outcome,
            Some(Err(error)) => {
                report(session, &error);
                Outcome::Continue
            }
            None => {
                debug!(actor = %session.actor, line, "unknown command");
                session.reply(UNKNOWN_COMMAND);
                Outcome::Continue
            }
        }
    }

    fn builtin(&self, session: &mut Session, line: &str) -> Option<Result<Outcome>> {
        let (word, rest) = split_command(line)?;
        let result = match word.to_lowercase().as_str() {
            "help" => {
                session.reply(HELP_TEXT);
                Ok(Outcome::Continue)
            }
            "quit" => {
                session.reply("Goodbye.");
                self.disconnect(session);
                Ok(Outcome::Quit)
            }
            "@eval" => self.eval(session, rest),
            "@program" => self.program(session, rest),
            "@verbs" => self.list_verbs(session, rest),
            "@abort" => {
                session.reply("Nothing to abort.");
                Ok(Outcome::Continue)
            }
            _ => return None,
        };
        Some(result)
    }

    fn require(&self, actor: ObjectId, flag: &str) -> Result<()> {
        if self.host.database().read(|w| w.has_permission(actor, flag)) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!("{flag} permission required")))
        }
    }

    fn eval(&self, session: &mut Session, code: &str) -> Result<Outcome> {
        self.require(session.actor, PROGRAMMER_FLAG)?;
        if code.is_empty() {
            session.buffer = Some(CodeBuffer {
                target: CodeTarget::Eval,
                lines: Vec::new(),
            });
            session.reply("Enter code. End with \".\" on a line by itself, or @abort.");
        } else {
            self.run_eval(session, code)?;
        }
        Ok(Outcome::Continue)
    }

    fn run_eval(&self, session: &Session, code: &str) -> Result<()> {
        let context = ExecutionContext::new().with_caller(session.actor);
        let value = self.host.execute(code, &context)?;
        session.reply(&format!("=> {value}"));
        Ok(())
    }

    fn program(&self, session: &mut Session, target: &str) -> Result<Outcome> {
        self.require(session.actor, PROGRAMMER_FLAG)?;
        let Some((object, name)) = target.split_once(':') else {
            session.reply("Usage: @program #N:verb");
            return Ok(Outcome::Continue);
        };
        let object = self.object_named(object)?;
        let verb = self
            .host
            .database()
            .read(|w| verb_named(w, object, name.trim()).map(|v| v.id))?;
        session.buffer = Some(CodeBuffer {
            target: CodeTarget::Verb {
                verb,
                label: target.trim().to_string(),
            },
            lines: Vec::new(),
        });
        session.reply(&format!(
            "Programming {}. End with \".\" on a line by itself, or @abort.",
            target.trim()
        ));
        Ok(Outcome::Continue)
    }

    fn list_verbs(&self, session: &Session, target: &str) -> Result<Outcome> {
        let object = self.object_named(target)?;
        let lines = self.host.database().read(|w| -> Result<Vec<String>> {
            Ok(w.verbs_for(object)?
                .into_iter()
                .map(|verb| {
                    let mut line = verb.name.clone();
                    if !verb.aliases.is_empty() {
                        line.push_str(&format!(" ({})", verb.aliases.join(" ")));
                    }
                    let pattern = if verb.pattern.trim().is_empty() {
                        "none"
                    } else {
                        verb.pattern.as_str()
                    };
                    line.push_str(&format!(" [{pattern}] on {}", owner_label(w, verb.owner)));
                    line
                })
                .collect())
        })?;
        if lines.is_empty() {
            session.reply("No verbs.");
        } else {
            session.reply(&lines.join("\n"));
        }
        Ok(Outcome::Continue)
    }

    fn object_named(&self, text: &str) -> Result<ObjectId> {
        let handle: Handle = text
            .trim()
            .parse()
            .map_err(|_| Error::not_found(format!("object {}", text.trim())))?;
        self.host
            .database()
            .read(|w| w.find_by_handle(handle).map(|i| i.id))
            .ok_or_else(|| Error::not_found(format!("object {handle}")))
    }

    fn buffer_line(&self, session: &mut Session, input: &str) {
        match input.trim() {
            "@abort" => {
                session.buffer = None;
                session.reply("Aborted.");
            }
            "." => {
                if let Some(buffer) = session.buffer.take() {
                    if let Err(error) = self.finish_buffer(session, buffer) {
                        report(session, &error);
                    }
                }
            }
            _ => {
                if let Some(buffer) = session.buffer.as_mut() {
                    buffer.lines.push(input.to_string());
                }
            }
        }
    }

    fn finish_buffer(&self, session: &Session, buffer: CodeBuffer) -> Result<()> {
        let code = buffer.lines.join("\n");
        match buffer.target {
            CodeTarget::Eval => self.run_eval(session, &code),
            CodeTarget::Verb { verb, label } => {
                self.host.compile(&code, &[])?;
                self.host
                    .database()
                    .transact(|w| w.update_verb_code(verb, code.as_str()))?;
                session.reply(&format!("Programmed {label}."));
                Ok(())
            }
        }
    }
}

/// Renders an error for the player.
#[must_use]
pub fn describe_error(error: &Error) -> String {
    match &error.kind {
        ErrorKind::CompilationError(diagnostics) => {
            let mut out = String::from("Compilation failed:");
            for diagnostic in diagnostics {
                out.push_str("\n  ");
                out.push_str(&diagnostic.to_string());
            }
            out
        }
        ErrorKind::ScriptFault(fault) => format!("Script error: {fault}"),
        _ => {
            let text = error.to_string();
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => text,
            }
        }
    }
}

fn report(session: &Session, error: &Error) {
    warn!(actor = %session.actor, %error, "command failed");
    session.reply(&describe_error(error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorhen_foundation::{Diagnostic, FrameKind, ScriptFault, StackFrame};

    #[test]
    fn compilation_errors_list_every_diagnostic() {
        let error = Error::compilation(vec![
            Diagnostic::error("unbound symbol: x", 1, 2),
            Diagnostic::error("unknown function: y", 3, 4),
        ]);
        let text = describe_error(&error);
        assert!(text.starts_with("Compilation failed:"));
        assert!(text.contains("1:2: error: unbound symbol: x"));
        assert!(text.contains("3:4: error: unknown function: y"));
    }

    #[test]
    fn faults_show_stack_and_line() {
        let mut fault = ScriptFault::new("division by zero", "(tell 1)\n(/ 1 0)");
        fault.stack.push(StackFrame {
            owner: "#1".to_string(),
            name: "poke".to_string(),
            kind: FrameKind::Verb,
            line: 2,
        });
        let text = describe_error(&Error::script_fault(fault));
        assert!(text.starts_with("Script error: division by zero"));
        assert!(text.contains("verb #1:poke (line 2)"));
        assert!(text.contains("> (/ 1 0)"));
    }

    #[test]
    fn other_errors_are_capitalized() {
        let text = describe_error(&Error::permission_denied("programmer permission required"));
        assert!(text.starts_with('P'));
        assert!(text.contains("programmer permission required"));
    }
}
