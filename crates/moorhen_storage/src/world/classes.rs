//! Class registry: creation, ancestry, and memoized inheritance chains.

use chrono::Utc;

use moorhen_foundation::{ClassId, Error, ErrorKind, PropertyBag, Result, Value};

use super::World;
use crate::journal::Change;
use crate::records::{Class, Owner};

impl World {
    /// Creates a concrete class.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAncestry` if `parent` does not exist and
    /// `AlreadyExists` if the name is taken.
    pub fn create_class(
        &mut self,
        name: &str,
        parent: Option<ClassId>,
        defaults: PropertyBag,
    ) -> Result<ClassId> {
        self.new_class(name, parent, defaults, false)
    }

    /// Creates a class that cannot be instantiated directly.
    ///
    /// # Errors
    ///
    /// Same as [`World::create_class`].
    pub fn create_abstract_class(
        &mut self,
        name: &str,
        parent: Option<ClassId>,
        defaults: PropertyBag,
    ) -> Result<ClassId> {
        self.new_class(name, parent, defaults, true)
    }

    fn new_class(
        &mut self,
        name: &str,
        parent: Option<ClassId>,
        defaults: PropertyBag,
        is_abstract: bool,
    ) -> Result<ClassId> {
        let raw = self.alloc_raw(|raw| self.classes.contains_key(&ClassId::new(raw)));
        let class = Class {
            id: ClassId::new(raw),
            name: name.to_string(),
            parent,
            defaults,
            is_abstract,
            created_at: Utc::now(),
        };
        let id = class.id;
        self.apply(Change::CreateClass(class))?;
        Ok(id)
    }

    pub(super) fn apply_create_class(&mut self, class: &Class) -> Result<()> {
        let key = class.name.trim().to_lowercase();
        if key.is_empty() {
            return Err(Error::new(ErrorKind::Internal(
                "class name must not be empty".to_string(),
            )));
        }
        if self.class_names.contains_key(&key) || self.classes.contains_key(&class.id) {
            return Err(Self::conflict(format!("class {}", class.name)));
        }
        if let Some(parent) = class.parent {
            if !self.classes.contains_key(&parent) {
                return Err(Error::invalid_ancestry(format!(
                    "parent {parent} of {} does not exist",
                    class.name
                )));
            }
        }
        self.class_names.insert(key, class.id);
        self.classes.insert(class.id, class.clone());
        self.rebuild_chains();
        Ok(())
    }

    /// Re-parents a class.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAncestry` if the parent is missing or the change would
    /// make the class its own ancestor.
    pub fn set_class_parent(&mut self, class: ClassId, parent: Option<ClassId>) -> Result<()> {
        self.apply(Change::SetClassParent { class, parent })
    }

    pub(super) fn apply_set_class_parent(
        &mut self,
        class: ClassId,
        parent: Option<ClassId>,
    ) -> Result<()> {
        self.class(class)?;
        if let Some(parent) = parent {
            if !self.classes.contains_key(&parent) {
                return Err(Error::invalid_ancestry(format!(
                    "parent {parent} does not exist"
                )));
            }
            if self.inherits_from(parent, class) {
                return Err(Error::invalid_ancestry(format!(
                    "{parent} already descends from {class}"
                )));
            }
        }
        self.class_mut(class)?.parent = parent;
        self.rebuild_chains();
        Ok(())
    }

    /// Writes a class default. Writing `nil` removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not exist.
    pub fn set_class_default(
        &mut self,
        class: ClassId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.apply(Change::SetClassDefault {
            class,
            name: name.to_string(),
            value: value.into(),
        })
    }

    /// Removes a class default.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not exist.
    pub fn remove_class_default(&mut self, class: ClassId, name: &str) -> Result<()> {
        self.apply(Change::RemoveClassDefault {
            class,
            name: name.to_string(),
        })
    }

    /// Deletes a class and the verbs and functions it owns.
    ///
    /// # Errors
    ///
    /// Returns `ClassInUse` while instances or subclasses exist, and
    /// `NotFound` if the class does not exist.
    pub fn delete_class(&mut self, class: ClassId) -> Result<()> {
        self.apply(Change::DeleteClass(class))
    }

    /// Returns false when the class was already gone.
    pub(super) fn apply_delete_class(&mut self, class: ClassId) -> Result<bool> {
        let Some(record) = self.classes.get(&class) else {
            return Ok(false);
        };
        let name = record.name.clone();
        if self.classes.values().any(|c| c.parent == Some(class)) {
            return Err(Error::new(ErrorKind::ClassInUse(format!(
                "{name} has subclasses"
            ))));
        }
        if self.instances.values().any(|i| i.class == class) {
            return Err(Error::new(ErrorKind::ClassInUse(format!(
                "{name} has instances"
            ))));
        }
        self.remove_owned_code(Owner::Class(class))?;
        self.classes.remove(&class);
        self.class_names.remove(&name.to_lowercase());
        self.rebuild_chains();
        Ok(true)
    }

    // --- Queries ---

    /// Looks up a class.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not exist.
    pub fn class(&self, id: ClassId) -> Result<&Class> {
        self.classes
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("class {id}")))
    }

    /// Looks up a class by name, ignoring case.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<&Class> {
        self.class_names
            .get(&name.trim().to_lowercase())
            .and_then(|id| self.classes.get(id))
    }

    /// Returns the inheritance chain of a class, root first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not exist.
    pub fn inheritance_chain(&self, id: ClassId) -> Result<&[ClassId]> {
        self.chains
            .get(&id)
            .map(|chain| &chain[..])
            .ok_or_else(|| Error::not_found(format!("class {id}")))
    }

    /// Returns the chain of a class, most specific first, or empty if the
    /// class is unknown.
    pub fn chain_most_specific_first(
        &self,
        id: ClassId,
    ) -> impl Iterator<Item = ClassId> + '_ {
        self.chains
            .get(&id)
            .into_iter()
            .flat_map(|chain| chain.iter().rev().copied())
    }

    /// Returns true if `child` is `ancestor` or descends from it.
    #[must_use]
    pub fn inherits_from(&self, child: ClassId, ancestor: ClassId) -> bool {
        self.chains
            .get(&child)
            .is_some_and(|chain| chain.contains(&ancestor))
    }

    /// Lists subclasses of a class, ordered by name.
    ///
    /// With `recursive`, every descendant is included; otherwise only direct
    /// children. The class itself is never included.
    #[must_use]
    pub fn subclasses(&self, id: ClassId, recursive: bool) -> Vec<ClassId> {
        let mut found: Vec<&Class> = self
            .classes
            .values()
            .filter(|c| c.id != id)
            .filter(|c| {
                if recursive {
                    self.inherits_from(c.id, id)
                } else {
                    c.parent == Some(id)
                }
            })
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.into_iter().map(|c| c.id).collect()
    }

    /// Merges the defaults of every class in the chain, root first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not exist.
    pub fn merged_defaults(&self, id: ClassId) -> Result<PropertyBag> {
        let chain = self.inheritance_chain(id)?;
        Ok(chain
            .iter()
            .filter_map(|c| self.classes.get(c))
            .fold(PropertyBag::new(), |bag, class| bag.overlay(&class.defaults)))
    }
}
