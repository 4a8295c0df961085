//! Player connections.
//!
//! A [`Connection`] is the outbound side of one player's session. The
//! [`ConnectionRegistry`] maps player objects to their connections so that
//! committed notifications can be delivered.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use moorhen_foundation::{Error, ErrorKind, ObjectId, Result};

/// Outbound text channel to one player.
pub trait Connection: Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    fn send_message(&self, message: &str) -> Result<()>;

    /// Closes the connection.
    fn disconnect(&self);

    /// Returns true until [`Connection::disconnect`] is called.
    fn is_connected(&self) -> bool;
}

fn closed() -> Error {
    Error::new(ErrorKind::Io("connection closed".to_string()))
}

/// Records every message in memory.
#[derive(Debug)]
pub struct BufferedConnection {
    messages: Mutex<Vec<String>>,
    connected: AtomicBool,
}

impl Default for BufferedConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedConnection {
    /// Creates an open connection with no messages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Returns a copy of every message so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Removes and returns every message so far.
    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl Connection for BufferedConnection {
    fn send_message(&self, message: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(closed());
        }
        self.messages.lock().push(message.to_string());
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Writes messages to standard output.
#[derive(Debug)]
pub struct ConsoleConnection {
    connected: AtomicBool,
}

impl Default for ConsoleConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleConnection {
    /// Creates an open console connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
        }
    }
}

impl Connection for ConsoleConnection {
    fn send_message(&self, message: &str) -> Result<()> {
        if !self.is_connected() {
            return Err(closed());
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "{message}")
            .and_then(|()| out.flush())
            .map_err(|e| Error::new(ErrorKind::Io(e.to_string())))
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Live connections by player object.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ObjectId, Arc<dyn Connection>>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a connection to a player, replacing any earlier one.
    pub fn register(&self, player: ObjectId, connection: Arc<dyn Connection>) {
        info!(%player, "player connected");
        self.connections.write().insert(player, connection);
    }

    /// Detaches a player's connection.
    pub fn unregister(&self, player: ObjectId) -> Option<Arc<dyn Connection>> {
        let removed = self.connections.write().remove(&player);
        if removed.is_some() {
            info!(%player, "player disconnected");
        }
        removed
    }

    /// Returns a player's connection.
    #[must_use]
    pub fn get(&self, player: ObjectId) -> Option<Arc<dyn Connection>> {
        self.connections.read().get(&player).cloned()
    }

    /// Returns true if the player has an open connection.
    #[must_use]
    pub fn is_connected(&self, player: ObjectId) -> bool {
        self.get(player).is_some_and(|c| c.is_connected())
    }

    /// Lists players with a registered connection.
    #[must_use]
    pub fn players(&self) -> Vec<ObjectId> {
        self.connections.read().keys().copied().collect()
    }

    /// Sends a message to a player. Returns false if the player has no open
    /// connection or the write failed.
    pub fn send(&self, player: ObjectId, message: &str) -> bool {
        let Some(connection) = self.get(player) else {
            debug!(%player, "dropping message for unconnected player");
            return false;
        };
        match connection.send_message(message) {
            Ok(()) => true,
            Err(error) => {
                debug!(%player, %error, "message not delivered");
                false
            }
        }
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("players", &self.players())
            .finish()
    }
}
