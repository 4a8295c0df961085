//! Runtime configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use moorhen_foundation::{Error, ErrorKind, Handle, Result};
use moorhen_language::{Budget, DEFAULT_MAX_NESTING};

/// Budgets applied to one top-level command, nested calls included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    /// Evaluation steps before the command is aborted.
    pub max_ticks: u64,

    /// Wall-clock time before the command is aborted, in milliseconds.
    pub max_wall_time_ms: u64,

    /// Nested verb and function calls allowed, the top level included.
    pub max_depth: usize,

    /// How deeply forms may nest in source code. Deeper code does not
    /// compile.
    pub max_nesting: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_ticks: 100_000,
            max_wall_time_ms: 5_000,
            max_depth: 50,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl ExecutionLimits {
    /// Starts a fresh budget with these limits.
    #[must_use]
    pub fn budget(&self) -> Budget {
        Budget::new(
            self.max_ticks,
            Duration::from_millis(self.max_wall_time_ms),
            self.max_depth,
        )
    }
}

/// Configuration for a running world.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Script budgets.
    pub limits: ExecutionLimits,

    /// Verb retried with the whole input when nothing else matches.
    pub movement_verb: String,

    /// Handle of the system object, searched last for verbs.
    pub system_handle: u64,

    /// Compiled programs kept in the cache.
    pub compile_cache_capacity: usize,

    /// Seed for id allocation and the script random source.
    pub seed: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            movement_verb: "go".to_string(),
            system_handle: 0,
            compile_cache_capacity: 256,
            seed: 0x6d6f_6f72,
        }
    }
}

impl RuntimeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the script budgets.
    #[must_use]
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the instruction budget.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.limits.max_ticks = max_ticks;
        self
    }

    /// Sets the nested call limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }

    /// Sets the source nesting limit.
    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.limits.max_nesting = max_nesting;
        self
    }

    /// Sets the movement verb.
    #[must_use]
    pub fn with_movement_verb(mut self, verb: impl Into<String>) -> Self {
        self.movement_verb = verb.into();
        self
    }

    /// Sets the compile cache capacity.
    #[must_use]
    pub fn with_compile_cache_capacity(mut self, capacity: usize) -> Self {
        self.compile_cache_capacity = capacity;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the system object's handle.
    #[must_use]
    pub fn system_handle(&self) -> Handle {
        Handle::new(self.system_handle)
    }

    /// Parses a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the text is not a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::new(ErrorKind::Serialization(format!("invalid config: {e}"))))
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Serialization` if it
    /// is not a valid configuration.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::new(ErrorKind::Io(format!("{}: {e}", path.display()))))?;
        Self::from_json_str(&text)
    }
}
