//! Compiled program cache.
//!
//! Programs are keyed by the SHA-256 of their source and parameter names,
//! so editing a verb's code simply produces a new key. The oldest entry is
//! evicted once the cache is full.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use moorhen_foundation::Result;
use moorhen_language::{DEFAULT_MAX_NESTING, Program, compile_with_limits};

type Key = [u8; 32];

#[derive(Default)]
struct Entries {
    programs: HashMap<Key, Arc<Program>>,
    order: VecDeque<Key>,
}

/// Thread-safe cache of compiled programs.
pub struct CompileCache {
    capacity: usize,
    max_nesting: usize,
    entries: Mutex<Entries>,
}

impl CompileCache {
    /// Creates a cache holding at most `capacity` programs. Zero disables
    /// caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            max_nesting: DEFAULT_MAX_NESTING,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Sets how deeply forms may nest in compiled source.
    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Number of cached programs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().programs.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached program.
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.programs.clear();
        entries.order.clear();
    }

    /// Returns the compiled program for `source`, compiling on a miss.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` if the source does not compile. Failures
    /// are not cached.
    pub fn get_or_compile(&self, source: &str, params: &[String]) -> Result<Arc<Program>> {
        let key = digest(source, params);
        if let Some(program) = self.entries.lock().programs.get(&key) {
            debug!(key = %hex(&key[..6]), "compile cache hit");
            return Ok(Arc::clone(program));
        }

        let program = Arc::new(compile_with_limits(source, params, self.max_nesting)?);
        if self.capacity == 0 {
            return Ok(program);
        }

        let mut entries = self.entries.lock();
        if !entries.programs.contains_key(&key) {
            while entries.order.len() >= self.capacity {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                entries.programs.remove(&oldest);
            }
            entries.order.push_back(key);
            entries.programs.insert(key, Arc::clone(&program));
        }
        Ok(program)
    }
}

fn digest(source: &str, params: &[String]) -> Key {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    for param in params {
        hasher.update([0u8]);
        hasher.update(param.as_bytes());
    }
    hasher.finalize().into()
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
