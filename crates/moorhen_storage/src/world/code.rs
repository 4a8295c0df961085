//! Verb and function registries.
//!
//! Records are indexed per owner and kept newest first (descending `seq`).
//! Duplicate names on one owner are allowed; whoever scans a list in order
//! and takes the first match therefore gets the most recently created one.

use chrono::Utc;

use moorhen_foundation::{Error, FunctionId, ObjectId, Result, VerbId};

use super::World;
use crate::journal::Change;
use crate::records::{Function, FunctionSpec, Owner, Verb, VerbSpec};

fn insert_newest_first<T: Clone + PartialEq>(
    list: &mut im::Vector<T>,
    id: T,
    seq: u64,
    seq_of: impl Fn(&T) -> Option<u64>,
) {
    if list.contains(&id) {
        return;
    }
    let at = list
        .iter()
        .position(|other| seq_of(other).is_some_and(|s| s < seq))
        .unwrap_or(list.len());
    list.insert(at, id);
}

impl World {
    fn check_owner(&self, owner: Owner) -> Result<()> {
        match owner {
            Owner::Class(id) => self.class(id).map(|_| ()),
            Owner::Instance(id) => self.instance(id).map(|_| ()),
        }
    }

    // --- Verbs ---

    /// Attaches a new verb to a class or instance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the owner does not exist.
    pub fn add_verb(&mut self, owner: impl Into<Owner>, spec: VerbSpec) -> Result<VerbId> {
        let owner = owner.into();
        let raw = self.alloc_raw(|raw| self.verbs.contains_key(&VerbId::new(raw)));
        let now = Utc::now();
        let verb = Verb {
            id: VerbId::new(raw),
            owner,
            name: spec.name,
            aliases: spec.aliases,
            pattern: spec.pattern,
            description: spec.description,
            code: spec.code,
            created_by: spec.created_by,
            created_at: now,
            updated_at: now,
            seq: self.ids.next_seq(),
        };
        let id = verb.id;
        self.apply(Change::PutVerb(verb))?;
        Ok(id)
    }

    /// Replaces a verb's code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the verb does not exist.
    pub fn update_verb_code(&mut self, id: VerbId, code: impl Into<String>) -> Result<()> {
        let mut verb = self.verb(id)?.clone();
        verb.code = code.into();
        verb.updated_at = Utc::now();
        self.apply(Change::PutVerb(verb))
    }

    /// Removes a verb.
    ///
    /// # Errors
    ///
    /// Removing a missing verb is not an error; this only propagates
    /// journal failures.
    pub fn remove_verb(&mut self, id: VerbId) -> Result<()> {
        self.apply(Change::RemoveVerb(id))
    }

    pub(super) fn apply_put_verb(&mut self, verb: &Verb) -> Result<()> {
        self.check_owner(verb.owner)?;
        if let Some(existing) = self.verbs.get(&verb.id) {
            if existing.owner != verb.owner {
                return Err(Error::internal(format!(
                    "verb {} cannot change owner",
                    verb.id
                )));
            }
        } else {
            self.index_verb(verb);
        }
        self.verbs.insert(verb.id, verb.clone());
        Ok(())
    }

    pub(super) fn index_verb(&mut self, verb: &Verb) {
        let verbs = &self.verbs;
        let list = self
            .verbs_by_owner
            .entry(verb.owner)
            .or_insert_with(im::Vector::new);
        insert_newest_first(list, verb.id, verb.seq, |id| verbs.get(id).map(|v| v.seq));
    }

    pub(super) fn apply_remove_verb(&mut self, id: VerbId) -> bool {
        let Some(verb) = self.verbs.remove(&id) else {
            return false;
        };
        if let Some(list) = self.verbs_by_owner.get_mut(&verb.owner) {
            list.retain(|other| *other != id);
        }
        true
    }

    /// Looks up a verb by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the verb does not exist.
    pub fn verb(&self, id: VerbId) -> Result<&Verb> {
        self.verbs
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("verb {id}")))
    }

    /// Lists the verbs attached directly to an owner, newest first.
    #[must_use]
    pub fn verbs_on(&self, owner: impl Into<Owner>) -> Vec<&Verb> {
        self.verbs_by_owner
            .get(&owner.into())
            .map(|ids| ids.iter().filter_map(|id| self.verbs.get(id)).collect())
            .unwrap_or_default()
    }

    /// Finds the newest verb on an owner whose primary name equals `name`,
    /// ignoring case.
    #[must_use]
    pub fn find_verb(&self, owner: impl Into<Owner>, name: &str) -> Option<&Verb> {
        self.verbs_on(owner)
            .into_iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// Lists the verbs an object responds to: its own, then each class in
    /// its chain from most specific to root. Each group is newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist.
    pub fn verbs_for(&self, object: ObjectId) -> Result<Vec<&Verb>> {
        let instance = self.instance(object)?;
        let mut verbs = self.verbs_on(Owner::Instance(object));
        for class in self.chain_most_specific_first(instance.class) {
            verbs.extend(self.verbs_on(Owner::Class(class)));
        }
        Ok(verbs)
    }

    // --- Functions ---

    /// Attaches a new function to a class or instance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the owner does not exist.
    pub fn add_function(
        &mut self,
        owner: impl Into<Owner>,
        spec: FunctionSpec,
    ) -> Result<FunctionId> {
        let owner = owner.into();
        let raw = self.alloc_raw(|raw| self.functions.contains_key(&FunctionId::new(raw)));
        let now = Utc::now();
        let function = Function {
            id: FunctionId::new(raw),
            owner,
            name: spec.name,
            params: spec.params,
            returns: spec.returns,
            description: spec.description,
            code: spec.code,
            created_by: spec.created_by,
            created_at: now,
            updated_at: now,
            seq: self.ids.next_seq(),
        };
        let id = function.id;
        self.apply(Change::PutFunction(function))?;
        Ok(id)
    }

    /// Replaces a function's code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the function does not exist.
    pub fn update_function_code(&mut self, id: FunctionId, code: impl Into<String>) -> Result<()> {
        let mut function = self.function(id)?.clone();
        function.code = code.into();
        function.updated_at = Utc::now();
        self.apply(Change::PutFunction(function))
    }

    /// Removes a function.
    ///
    /// # Errors
    ///
    /// Removing a missing function is not an error; this only propagates
    /// journal failures.
    pub fn remove_function(&mut self, id: FunctionId) -> Result<()> {
        self.apply(Change::RemoveFunction(id))
    }

    pub(super) fn apply_put_function(&mut self, function: &Function) -> Result<()> {
        self.check_owner(function.owner)?;
        if let Some(existing) = self.functions.get(&function.id) {
            if existing.owner != function.owner {
                return Err(Error::internal(format!(
                    "function {} cannot change owner",
                    function.id
                )));
            }
        } else {
            self.index_function(function);
        }
        self.functions.insert(function.id, function.clone());
        Ok(())
    }

    pub(super) fn index_function(&mut self, function: &Function) {
        let functions = &self.functions;
        let list = self
            .functions_by_owner
            .entry(function.owner)
            .or_insert_with(im::Vector::new);
        insert_newest_first(list, function.id, function.seq, |id| {
            functions.get(id).map(|f| f.seq)
        });
    }

    pub(super) fn apply_remove_function(&mut self, id: FunctionId) -> bool {
        let Some(function) = self.functions.remove(&id) else {
            return false;
        };
        if let Some(list) = self.functions_by_owner.get_mut(&function.owner) {
            list.retain(|other| *other != id);
        }
        true
    }

    /// Looks up a function by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the function does not exist.
    pub fn function(&self, id: FunctionId) -> Result<&Function> {
        self.functions
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("function {id}")))
    }

    /// Lists the functions attached directly to an owner, newest first.
    #[must_use]
    pub fn functions_on(&self, owner: impl Into<Owner>) -> Vec<&Function> {
        self.functions_by_owner
            .get(&owner.into())
            .map(|ids| ids.iter().filter_map(|id| self.functions.get(id)).collect())
            .unwrap_or_default()
    }

    /// Finds the newest function on an owner with the given name, ignoring
    /// case.
    #[must_use]
    pub fn find_function(&self, owner: impl Into<Owner>, name: &str) -> Option<&Function> {
        self.functions_on(owner)
            .into_iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Removes every verb and function attached to an owner.
    pub(super) fn remove_owned_code(&mut self, owner: Owner) -> Result<()> {
        let verbs: Vec<VerbId> = self.verbs_on(owner).iter().map(|v| v.id).collect();
        for id in verbs {
            self.apply(Change::RemoveVerb(id))?;
        }
        let functions: Vec<FunctionId> = self.functions_on(owner).iter().map(|f| f.id).collect();
        for id in functions {
            self.apply(Change::RemoveFunction(id))?;
        }
        self.verbs_by_owner.remove(&owner);
        self.functions_by_owner.remove(&owner);
        Ok(())
    }
}
