//! The interactive console: one local player driving the dispatcher from a
//! line editor.

use tracing::debug;

use moorhen_foundation::Result;

use crate::dispatcher::{CommandDispatcher, Outcome, Session};
use crate::editor::{LineEditor, ReadResult};

const PROMPT: &str = "> ";
const CODE_PROMPT: &str = ".. ";

/// Runs the read-dispatch loop until the player quits or input ends.
pub struct Console<'d, E> {
    dispatcher: &'d CommandDispatcher,
    editor: E,
    show_banner: bool,
}

impl<'d, E: LineEditor> Console<'d, E> {
    /// Creates a console.
    pub fn new(dispatcher: &'d CommandDispatcher, editor: E) -> Self {
        Self {
            dispatcher,
            editor,
            show_banner: true,
        }
    }

    /// Skips the welcome text.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Returns the editor.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Runs the loop.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal fails. Command failures are
    /// reported to the player and the loop continues.
    pub fn run(&mut self, session: &mut Session) -> Result<()> {
        if self.show_banner {
            session.reply(&format!(
                "Moorhen {}. Type \"help\" for commands, \"look\" to look around.",
                env!("CARGO_PKG_VERSION")
            ));
        }

        loop {
            let prompt = if session.is_buffering() {
                CODE_PROMPT
            } else {
                PROMPT
            };
            let line = match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => {
                    debug!("input interrupted");
                    continue;
                }
                ReadResult::Eof => {
                    self.dispatcher.disconnect(session);
                    break;
                }
            };
            if !line.trim().is_empty() {
                self.editor.add_history(&line);
            }
            if self.dispatcher.handle(session, &line) == Outcome::Quit {
                break;
            }
        }
        Ok(())
    }
}
