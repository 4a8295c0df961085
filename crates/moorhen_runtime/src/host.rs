//! The script execution host.
//!
//! Every top-level invocation (a resolved command, an `@eval`, a direct
//! call) runs inside one transaction:
//!
//! 1. Take a snapshot of the live world and a fresh budget.
//! 2. Run the code through an [`Execution`], which journals every write.
//! 3. On success, commit the journal and deliver queued notifications.
//!    On any failure, drop the snapshot: nothing the invocation did is
//!    visible and nobody is notified.
//! 4. If the commit conflicts because another invocation wrote something
//!    this one read, run it again from step 1.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use moorhen_foundation::{ObjectId, Result, Value};
use moorhen_language::{Bindings, Program};
use moorhen_parser::VerbMatch;
use moorhen_storage::{COMMIT_ATTEMPTS, Database};

use crate::cache::CompileCache;
use crate::config::RuntimeConfig;
use crate::connection::ConnectionRegistry;
use crate::execution::Execution;

/// Who is running code, on what, and with which arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionContext {
    /// The player the invocation runs for. Receives `tell` output.
    pub caller: Option<ObjectId>,
    /// The object bound to `this`.
    pub this: Option<ObjectId>,
    /// Values bound to `args`.
    pub args: Vec<Value>,
    /// Text bound to `argstr`.
    pub argstr: String,
    /// Name bound to `verb`.
    pub verb: Option<String>,
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caller.
    #[must_use]
    pub fn with_caller(mut self, caller: ObjectId) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Sets `this`.
    #[must_use]
    pub fn with_this(mut self, this: ObjectId) -> Self {
        self.this = Some(this);
        self
    }

    /// Sets `args`.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Sets `argstr`.
    #[must_use]
    pub fn with_argstr(mut self, argstr: impl Into<String>) -> Self {
        self.argstr = argstr.into();
        self
    }

    /// Sets `verb`.
    #[must_use]
    pub fn with_verb(mut self, verb: impl Into<String>) -> Self {
        self.verb = Some(verb.into());
        self
    }

    /// Builds the context variables a script sees.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new()
            .with_args(self.args.iter().cloned())
            .with_argstr(self.argstr.as_str());
        if let Some(caller) = self.caller {
            bindings = bindings.with_caller(caller);
        }
        if let Some(this) = self.this {
            bindings = bindings.with_this(this);
        }
        if let Some(verb) = &self.verb {
            bindings = bindings.with_verb(verb.as_str());
        }
        bindings
    }
}

/// Compiles and runs scripts against the shared database.
pub struct ScriptHost {
    db: Database,
    config: RuntimeConfig,
    cache: CompileCache,
    connections: ConnectionRegistry,
    rng: Mutex<ChaCha8Rng>,
}

impl ScriptHost {
    /// Creates a host over `db` with its own connection registry.
    #[must_use]
    pub fn new(db: Database, config: RuntimeConfig) -> Self {
        Self {
            cache: CompileCache::new(config.compile_cache_capacity)
                .with_max_nesting(config.limits.max_nesting),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(config.seed)),
            connections: ConnectionRegistry::new(),
            db,
            config,
        }
    }

    /// Shares an existing connection registry.
    #[must_use]
    pub fn with_connections(mut self, connections: ConnectionRegistry) -> Self {
        self.connections = connections;
        self
    }

    /// Returns the database.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the connection registry.
    #[must_use]
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Returns the compile cache.
    #[must_use]
    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }

    /// Returns the system object, if the world has one.
    #[must_use]
    pub fn system_object(&self) -> Option<ObjectId> {
        let handle = self.config.system_handle();
        self.db.read(|w| w.find_by_handle(handle).map(|i| i.id))
    }

    /// Compiles `source` through the cache.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` with every diagnostic.
    pub fn compile(&self, source: &str, params: &[String]) -> Result<Arc<Program>> {
        self.cache.get_or_compile(source, params)
    }

    /// Runs an ad-hoc snippet.
    ///
    /// # Errors
    ///
    /// Returns `CompilationError` if the snippet does not compile, a
    /// `ScriptFault` if it fails while running, or the commit error.
    pub fn execute(&self, source: &str, context: &ExecutionContext) -> Result<Value> {
        let bindings = context.bindings();
        self.transaction(context.caller, |exec| exec.eval(source, &bindings))
    }

    /// Runs a resolved command for `actor`.
    ///
    /// # Errors
    ///
    /// Returns the verb's compilation error or fault, or the commit error.
    pub fn run_command(&self, matched: &VerbMatch, actor: ObjectId) -> Result<Value> {
        let context = ExecutionContext::new()
            .with_caller(actor)
            .with_this(matched.this)
            .with_args(matched.args.iter().map(|a| Value::from(a.as_str())))
            .with_argstr(matched.argstr.as_str())
            .with_verb(matched.word.as_str());
        let bindings = context.bindings();
        self.transaction(Some(actor), |exec| {
            exec.run_verb(matched.verb, &bindings, 0)
        })
    }

    /// Calls a function on `target` from outside any script.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `ArityMismatch`, or `TypeMismatch` from
    /// resolution, or the function's fault.
    pub fn call_function(
        &self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        caller: Option<ObjectId>,
    ) -> Result<Value> {
        self.transaction(caller, |exec| exec.run_function(target, name, args.clone(), 0))
    }

    /// Calls a verb on `target` by name from outside any script.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object has no such verb, or the verb's
    /// fault.
    pub fn call_verb(
        &self,
        target: ObjectId,
        name: &str,
        args: Vec<Value>,
        caller: Option<ObjectId>,
    ) -> Result<Value> {
        self.transaction(caller, |exec| exec.run_verb_named(target, name, args.clone(), 0))
    }

    fn transaction(
        &self,
        caller: Option<ObjectId>,
        mut f: impl FnMut(&mut Execution<'_>) -> Result<Value>,
    ) -> Result<Value> {
        let mut attempt = 1;
        loop {
            let mut execution = Execution::new(self, self.db.snapshot(), caller);
            let value = f(&mut execution)?;
            let (world, reads, outbox) = execution.finish();
            match self.db.commit_reading(world, &reads) {
                Ok(summary) => {
                    debug!(
                        changes = summary.changes,
                        notices = outbox.len(),
                        attempt,
                        "invocation committed"
                    );
                    for notice in outbox {
                        self.connections.send(notice.target, &notice.message);
                    }
                    return Ok(value);
                }
                Err(error) if error.is_conflict() && attempt < COMMIT_ATTEMPTS => {
                    debug!(attempt, %error, "invocation lost a commit race, rerunning");
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Draws from the script random source. `bound` must be positive.
    pub(crate) fn random(&self, bound: i64) -> i64 {
        if bound <= 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..bound)
    }
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("config", &self.config)
            .field("cached_programs", &self.cache.len())
            .finish_non_exhaustive()
    }
}
