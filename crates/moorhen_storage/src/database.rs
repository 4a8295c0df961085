//! Shared, transactional access to the world.
//!
//! A [`Database`] owns the live [`World`] behind a lock and the document
//! store it persists to. Readers take O(1) snapshots. Writers mutate a
//! snapshot and [`Database::commit`] it: if nobody committed in the
//! meantime the snapshot simply becomes the live world, otherwise its
//! journal is replayed change by change onto the current live world.
//! Either way, the touched records are then written to the store.
//!
//! Replay is only allowed when no slot the transaction read or wrote was
//! written by a newer commit. Otherwise the commit fails with a conflict
//! and [`Database::transact`] runs the closure again on a fresh snapshot.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use moorhen_foundation::{Error, Result};

use crate::alloc::IdAllocator;
use crate::document::{DocumentStore, DocumentStoreExt, MemoryStore};
use crate::journal::{Change, RecordKey, Slot};
use crate::records::{Class, Function, Instance, Verb};
use crate::world::World;

/// How many times [`Database::transact`] runs a closure that keeps losing
/// commit races before giving up.
pub const COMMIT_ATTEMPTS: u32 = 16;

/// Outcome of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    /// Number of changes applied to the live world.
    pub changes: usize,
    /// Live world version after the commit.
    pub version: u64,
    /// True when the journal had to be replayed onto newer state.
    pub replayed: bool,
}

/// The live world plus its persistence.
#[derive(Clone)]
pub struct Database {
    world: Arc<RwLock<World>>,
    store: Arc<dyn DocumentStore>,
}

impl Database {
    /// Creates an empty database backed by a [`MemoryStore`].
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), seed)
    }

    /// Creates an empty database backed by `store`, ignoring anything the
    /// store already holds.
    #[must_use]
    pub fn with_store(store: Arc<dyn DocumentStore>, seed: u64) -> Self {
        Self {
            world: Arc::new(RwLock::new(World::new(seed))),
            store,
        }
    }

    /// Rebuilds the world from every record in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a record does not decode.
    pub fn open(store: Arc<dyn DocumentStore>, seed: u64) -> Result<Self> {
        let classes = store.all::<Class>(None)?;
        let instances = store.all::<Instance>(None)?;
        let verbs = store.all::<Verb>(None)?;
        let functions = store.all::<Function>(None)?;
        info!(
            classes = classes.len(),
            instances = instances.len(),
            verbs = verbs.len(),
            functions = functions.len(),
            "opened database"
        );
        let world = World::restore(
            Arc::new(IdAllocator::new(seed)),
            classes,
            instances,
            verbs,
            functions,
        );
        Ok(Self {
            world: Arc::new(RwLock::new(world)),
            store,
        })
    }

    /// Returns the document store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns the live world version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.world.read().version()
    }

    /// Takes an O(1) snapshot of the live world.
    #[must_use]
    pub fn snapshot(&self) -> World {
        self.world.read().clone()
    }

    /// Runs a read-only closure against the live world.
    pub fn read<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&self.world.read())
    }

    /// Runs `f` against a snapshot and commits its changes if it succeeds.
    ///
    /// Nothing `f` did is visible to anyone else when it fails. When the
    /// commit conflicts, `f` runs again on a fresh snapshot, up to
    /// [`COMMIT_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, the last conflict, or the error that
    /// stopped the replay.
    pub fn transact<R>(&self, mut f: impl FnMut(&mut World) -> Result<R>) -> Result<R> {
        let mut attempt = 1;
        loop {
            let mut snapshot = self.snapshot();
            let value = f(&mut snapshot)?;
            match self.commit(snapshot) {
                Ok(_) => return Ok(value),
                Err(error) if error.is_conflict() && attempt < COMMIT_ATTEMPTS => {
                    debug!(attempt, %error, "retrying transaction");
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Publishes a snapshot's journal to the live world and the store.
    ///
    /// Same as [`Database::commit_reading`] with nothing read.
    ///
    /// # Errors
    ///
    /// See [`Database::commit_reading`].
    pub fn commit(&self, snapshot: World) -> Result<CommitSummary> {
        self.commit_reading(snapshot, &BTreeSet::new())
    }

    /// Publishes a snapshot's journal, provided nothing in `reads` or in
    /// the journal was written by a commit newer than the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when a slot was written concurrently, or the
    /// error of a change that no longer applies to the live world, for
    /// example a property write to an object that was destroyed
    /// concurrently. The live world is left untouched in both cases.
    pub fn commit_reading(
        &self,
        mut snapshot: World,
        reads: &BTreeSet<Slot>,
    ) -> Result<CommitSummary> {
        if snapshot.journal().is_empty() {
            return Ok(CommitSummary {
                changes: 0,
                version: self.version(),
                replayed: false,
            });
        }

        let mut live = self.world.write();
        let replayed = live.version() != snapshot.version();
        let changes = if replayed {
            let base = snapshot.version();
            let writes: BTreeSet<Slot> =
                snapshot.journal().iter().flat_map(Change::slots).collect();
            if let Some(slot) = live.first_conflict(base, reads.iter().chain(&writes)) {
                debug!(?slot, base, live = live.version(), "commit conflict");
                return Err(Error::conflict(format!("{slot:?} changed concurrently")));
            }
            let mut next = live.clone();
            for change in snapshot.take_journal() {
                next.apply(change)?;
            }
            let changes = next.take_journal();
            next.bump_version();
            next.mark_written(&changes);
            *live = next;
            changes
        } else {
            let changes = snapshot.take_journal();
            snapshot.bump_version();
            snapshot.mark_written(&changes);
            *live = snapshot;
            changes
        };

        // Persist under the write lock so the store sees commits in order
        self.persist(&live, &changes);

        let summary = CommitSummary {
            changes: changes.len(),
            version: live.version(),
            replayed,
        };
        if replayed {
            info!(
                changes = summary.changes,
                version = summary.version,
                "replayed commit onto newer world"
            );
        } else {
            debug!(
                changes = summary.changes,
                version = summary.version,
                "committed"
            );
        }
        Ok(summary)
    }

    fn persist(&self, world: &World, changes: &[Change]) {
        let touched: BTreeSet<RecordKey> = changes.iter().map(Change::record).collect();
        for key in touched {
            let outcome = match key {
                RecordKey::Class(id) => match world.class(id) {
                    Ok(class) => self.store.put(class),
                    Err(_) => self.store.remove::<Class>(id.raw()).map(|_| ()),
                },
                RecordKey::Instance(id) => match world.instance(id) {
                    Ok(instance) => self.store.put(instance),
                    Err(_) => self.store.remove::<Instance>(id.raw()).map(|_| ()),
                },
                RecordKey::Verb(id) => match world.verb(id) {
                    Ok(verb) => self.store.put(verb),
                    Err(_) => self.store.remove::<Verb>(id.raw()).map(|_| ()),
                },
                RecordKey::Function(id) => match world.function(id) {
                    Ok(function) => self.store.put(function),
                    Err(_) => self.store.remove::<Function>(id.raw()).map(|_| ()),
                },
            };
            if let Err(error) = outcome {
                warn!(?key, %error, "failed to persist record");
            }
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("world", &*self.world.read())
            .finish_non_exhaustive()
    }
}
