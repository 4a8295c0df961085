//! World state with O(1) snapshots and a change journal.
//!
//! The `World` is the unified interface to classes, instances, verbs, and
//! functions. It uses persistent data structures, so cloning a world to run
//! a script against a private snapshot costs nothing. Every mutation goes
//! through [`World::apply`], which validates it, updates the indexes, and
//! appends a [`Change`] to the journal.

mod classes;
mod code;
mod instances;

pub use instances::{PERMISSIONS_PROPERTY, WIZARD_FLAG};

use std::fmt;
use std::sync::Arc;

use moorhen_foundation::{
    ClassId, Error, ErrorKind, FunctionId, Handle, ObjectId, Result, VerbId,
};

use crate::alloc::IdAllocator;
use crate::journal::{Change, Slot};
use crate::records::{Class, Function, Instance, Owner, Verb};

/// Snapshot of the object graph.
///
/// Clone is O(1) due to structural sharing. Clones share one
/// [`IdAllocator`], so records created in different snapshots never collide.
#[derive(Clone)]
pub struct World {
    classes: im::HashMap<ClassId, Class>,
    /// Lowercased class name to id.
    class_names: im::HashMap<String, ClassId>,
    /// Memoized inheritance chains, root to leaf.
    chains: im::HashMap<ClassId, Arc<[ClassId]>>,
    instances: im::HashMap<ObjectId, Instance>,
    handles: im::OrdMap<Handle, ObjectId>,
    /// Contents by location; the `None` key holds everything that is nowhere.
    contents: im::HashMap<Option<ObjectId>, im::OrdMap<Handle, ObjectId>>,
    verbs: im::HashMap<VerbId, Verb>,
    /// Verb ids per owner, newest first.
    verbs_by_owner: im::HashMap<Owner, im::Vector<VerbId>>,
    functions: im::HashMap<FunctionId, Function>,
    /// Function ids per owner, newest first.
    functions_by_owner: im::HashMap<Owner, im::Vector<FunctionId>>,
    ids: Arc<IdAllocator>,
    journal: Vec<Change>,
    version: u64,
    /// Version of the commit that last wrote each slot.
    written: im::HashMap<Slot, u64>,
}

impl World {
    /// Creates an empty world whose ids are reproducible from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_allocator(Arc::new(IdAllocator::new(seed)))
    }

    /// Creates an empty world drawing ids from a shared allocator.
    #[must_use]
    pub fn with_allocator(ids: Arc<IdAllocator>) -> Self {
        Self {
            classes: im::HashMap::new(),
            class_names: im::HashMap::new(),
            chains: im::HashMap::new(),
            instances: im::HashMap::new(),
            handles: im::OrdMap::new(),
            contents: im::HashMap::new(),
            verbs: im::HashMap::new(),
            verbs_by_owner: im::HashMap::new(),
            functions: im::HashMap::new(),
            functions_by_owner: im::HashMap::new(),
            ids,
            journal: Vec::new(),
            version: 0,
            written: im::HashMap::new(),
        }
    }

    /// Rebuilds a world from persisted records.
    ///
    /// Records are trusted: parents and locations are linked as stored.
    /// The allocator is advanced past every stored handle and sequence.
    #[must_use]
    pub fn restore(
        ids: Arc<IdAllocator>,
        classes: Vec<Class>,
        instances: Vec<Instance>,
        verbs: Vec<Verb>,
        functions: Vec<Function>,
    ) -> Self {
        let mut world = Self::with_allocator(ids);
        for class in classes {
            world
                .class_names
                .insert(class.name.to_lowercase(), class.id);
            world.classes.insert(class.id, class);
        }
        world.rebuild_chains();

        for instance in instances {
            world.ids.reserve_handle(instance.handle);
            world.handles.insert(instance.handle, instance.id);
            world
                .contents
                .entry(instance.location)
                .or_insert_with(im::OrdMap::new)
                .insert(instance.handle, instance.id);
            world.instances.insert(instance.id, instance);
        }

        for verb in verbs {
            world.ids.reserve_seq(verb.seq);
            world.index_verb(&verb);
            world.verbs.insert(verb.id, verb);
        }
        for function in functions {
            world.ids.reserve_seq(function.seq);
            world.index_function(&function);
            world.functions.insert(function.id, function);
        }
        world
    }

    /// Returns the commit version this snapshot was taken at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the changes made since this snapshot was taken.
    #[must_use]
    pub fn journal(&self) -> &[Change] {
        &self.journal
    }

    /// Removes and returns the journal.
    pub fn take_journal(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.journal)
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Stamps the slots `changes` wrote with the current version.
    pub(crate) fn mark_written(&mut self, changes: &[Change]) {
        for slot in changes.iter().flat_map(Change::slots) {
            self.written.insert(slot, self.version);
        }
    }

    /// Returns the version of the commit that last wrote `slot`, if any
    /// commit since this world was opened did.
    #[must_use]
    pub fn written_at(&self, slot: &Slot) -> Option<u64> {
        self.written.get(slot).copied()
    }

    /// Returns the first of `slots` written by a commit newer than `base`.
    ///
    /// A slot also counts as written when its record was.
    pub fn first_conflict<'a>(
        &self,
        base: u64,
        slots: impl IntoIterator<Item = &'a Slot>,
    ) -> Option<&'a Slot> {
        let newer = |slot: &Slot| self.written_at(slot).is_some_and(|v| v > base);
        slots
            .into_iter()
            .find(|&slot| newer(slot) || slot.parent().is_some_and(|p| newer(&p)))
    }

    /// Returns the shared allocator.
    #[must_use]
    pub fn allocator(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    /// Returns the number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Returns the number of live instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns the number of verbs across all owners.
    #[must_use]
    pub fn verb_count(&self) -> usize {
        self.verbs.len()
    }

    /// Returns the number of functions across all owners.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Iterates over all classes in no particular order.
    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    /// Iterates over all instances in handle order.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.handles
            .values()
            .filter_map(|id| self.instances.get(id))
    }

    /// Iterates over all verbs in no particular order.
    pub fn all_verbs(&self) -> impl Iterator<Item = &Verb> {
        self.verbs.values()
    }

    /// Iterates over all functions in no particular order.
    pub fn all_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    // --- Mutation ---

    /// Validates a change, applies it, and appends it to the journal.
    ///
    /// This is the only way a world is mutated; the typed operations build
    /// a [`Change`] and call this. Replaying a journal onto another world
    /// calls it once per entry.
    ///
    /// # Errors
    ///
    /// Returns the same errors as the typed operation the change came from.
    pub fn apply(&mut self, change: Change) -> Result<()> {
        match &change {
            Change::CreateClass(class) => self.apply_create_class(class)?,
            Change::SetClassParent { class, parent } => {
                self.apply_set_class_parent(*class, *parent)?;
            }
            Change::SetClassDefault { class, name, value } => {
                let entry = self.class_mut(*class)?;
                entry.defaults = entry.defaults.insert(name.clone(), value.clone());
            }
            Change::RemoveClassDefault { class, name } => {
                let entry = self.class_mut(*class)?;
                entry.defaults = entry.defaults.remove(name);
            }
            Change::DeleteClass(class) => {
                // Owned code goes first so it is journaled ahead of the class
                if !self.apply_delete_class(*class)? {
                    return Ok(());
                }
            }
            Change::CreateInstance(instance) => self.apply_create_instance(instance)?,
            Change::SetProperty {
                object,
                name,
                value,
            } => {
                let entry = self.instance_mut(*object)?;
                entry.properties = entry.properties.insert(name.clone(), value.clone());
            }
            Change::ClearProperty { object, name } => {
                let entry = self.instance_mut(*object)?;
                entry.properties = entry.properties.remove(name);
            }
            Change::Move { object, to, .. } => self.apply_move(*object, *to)?,
            Change::DestroyInstance(object) => {
                if !self.apply_destroy(*object)? {
                    return Ok(());
                }
            }
            Change::PutVerb(verb) => self.apply_put_verb(verb)?,
            Change::RemoveVerb(id) => {
                if !self.apply_remove_verb(*id) {
                    return Ok(());
                }
            }
            Change::PutFunction(function) => self.apply_put_function(function)?,
            Change::RemoveFunction(id) => {
                if !self.apply_remove_function(*id) {
                    return Ok(());
                }
            }
        }
        self.journal.push(change);
        Ok(())
    }

    fn class_mut(&mut self, id: ClassId) -> Result<&mut Class> {
        self.classes
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("class {id}")))
    }

    fn instance_mut(&mut self, id: ObjectId) -> Result<&mut Instance> {
        self.instances
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("object {id}")))
    }

    /// Recomputes every memoized inheritance chain.
    fn rebuild_chains(&mut self) {
        let mut chains = im::HashMap::new();
        for id in self.classes.keys() {
            let mut chain = Vec::new();
            let mut cursor = Some(*id);
            while let Some(current) = cursor {
                // Bounded by the class count in case stored data is cyclic
                if chain.len() > self.classes.len() {
                    break;
                }
                chain.push(current);
                cursor = self.classes.get(&current).and_then(|c| c.parent);
            }
            chain.reverse();
            chains.insert(*id, Arc::from(chain));
        }
        self.chains = chains;
    }

    fn alloc_raw<F>(&self, taken: F) -> u64
    where
        F: Fn(u64) -> bool,
    {
        loop {
            let raw = self.ids.raw_id();
            if !taken(raw) {
                return raw;
            }
        }
    }

    fn conflict(message: impl Into<String>) -> Error {
        Error::new(ErrorKind::AlreadyExists(message.into()))
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("version", &self.version)
            .field("classes", &self.classes.len())
            .field("instances", &self.instances.len())
            .field("verbs", &self.verbs.len())
            .field("functions", &self.functions.len())
            .field("journal", &self.journal.len())
            .finish()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(0)
    }
}
