//! One worker thread per connected actor.
//!
//! Input for an actor is queued on a channel and handled strictly in
//! order. Different actors run in parallel; they only meet at the shared
//! database, where each command is one transaction.

use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use moorhen_foundation::{Error, ErrorKind, ObjectId, Result};

use crate::dispatcher::{CommandDispatcher, Outcome, Session};

/// A running actor thread.
pub struct ActorWorker {
    actor: ObjectId,
    sender: Option<Sender<String>>,
    handle: Option<JoinHandle<()>>,
}

impl ActorWorker {
    /// Starts a thread that feeds `session` through `dispatcher`.
    ///
    /// The thread stops when the actor quits or the worker is dropped, and
    /// disconnects the session on the way out.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn(dispatcher: Arc<CommandDispatcher>, mut session: Session) -> Result<Self> {
        let actor = session.actor();
        let (sender, receiver) = mpsc::channel::<String>();
        let handle = thread::Builder::new()
            .name(format!("actor-{actor}"))
            .spawn(move || {
                info!(%actor, "actor worker started");
                for line in receiver {
                    if dispatcher.handle(&mut session, &line) == Outcome::Quit {
                        break;
                    }
                }
                dispatcher.disconnect(&session);
                info!(%actor, "actor worker stopped");
            })
            .map_err(|e| Error::new(ErrorKind::Io(e.to_string())))?;
        Ok(Self {
            actor,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Returns the actor this worker serves.
    #[must_use]
    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    /// Queues a line of input. Returns false once the worker has stopped.
    pub fn submit(&self, line: impl Into<String>) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        let sent = sender.send(line.into()).is_ok();
        if !sent {
            debug!(actor = %self.actor, "input for stopped worker dropped");
        }
        sent
    }

    /// Stops accepting input, lets queued lines finish, and waits for the
    /// thread.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.sender = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!(actor = %self.actor, "actor worker panicked");
            }
        }
    }
}

impl Drop for ActorWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ActorWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorWorker")
            .field("actor", &self.actor)
            .field("running", &self.sender.is_some())
            .finish()
    }
}
