//! Instance store, containment graph, and property resolution.

use chrono::Utc;

use moorhen_foundation::{
    ClassId, Error, ErrorKind, Handle, ObjectId, PropertyBag, Result, Value,
};

use super::World;
use crate::journal::Change;
use crate::records::{Instance, Owner};

/// Property holding an object's capability flags.
pub const PERMISSIONS_PROPERTY: &str = "permissions";

/// Flag that grants every permission.
pub const WIZARD_FLAG: &str = "wizard";

impl World {
    /// Creates an instance of a concrete class.
    ///
    /// The new instance's bag is the overlay of every default in the class
    /// chain, root first, so the most derived value wins.
    ///
    /// # Errors
    ///
    /// Returns `AbstractInstantiation` for an abstract class, `NotFound` if
    /// the class or the location does not exist.
    pub fn instantiate(&mut self, class: ClassId, location: Option<ObjectId>) -> Result<ObjectId> {
        let record = self.class(class)?;
        if record.is_abstract {
            return Err(Error::new(ErrorKind::AbstractInstantiation(
                record.name.clone(),
            )));
        }
        let properties = self.merged_defaults(class)?;
        let raw = self.alloc_raw(|raw| self.instances.contains_key(&ObjectId::new(raw)));
        let instance = Instance {
            id: ObjectId::new(raw),
            handle: self.ids.next_handle(),
            class,
            properties,
            location,
            created_at: Utc::now(),
        };
        let id = instance.id;
        self.apply(Change::CreateInstance(instance))?;
        Ok(id)
    }

    pub(super) fn apply_create_instance(&mut self, instance: &Instance) -> Result<()> {
        let class = self.class(instance.class)?;
        if class.is_abstract {
            return Err(Error::new(ErrorKind::AbstractInstantiation(
                class.name.clone(),
            )));
        }
        if let Some(location) = instance.location {
            self.instance(location)?;
        }
        if self.instances.contains_key(&instance.id) || self.handles.contains_key(&instance.handle)
        {
            return Err(Self::conflict(format!("object {}", instance.handle)));
        }
        self.handles.insert(instance.handle, instance.id);
        self.contents
            .entry(instance.location)
            .or_insert_with(im::OrdMap::new)
            .insert(instance.handle, instance.id);
        self.instances.insert(instance.id, instance.clone());
        Ok(())
    }

    /// Destroys an instance.
    ///
    /// Contents are moved to nowhere before the instance is removed, and
    /// the verbs and functions it owns are deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn destroy(&mut self, id: ObjectId) -> Result<()> {
        self.instance(id)?;
        self.apply(Change::DestroyInstance(id))
    }

    /// Returns false when the instance was already gone.
    pub(super) fn apply_destroy(&mut self, id: ObjectId) -> Result<bool> {
        let Some(handle) = self.instances.get(&id).map(|i| i.handle) else {
            return Ok(false);
        };
        let contained: Vec<ObjectId> = self
            .contents
            .get(&Some(id))
            .map(|c| c.values().copied().collect())
            .unwrap_or_default();
        for object in contained {
            self.apply(Change::Move {
                object,
                from: Some(id),
                to: None,
            })?;
        }
        self.remove_owned_code(Owner::Instance(id))?;

        let location = self.instances.get(&id).and_then(|i| i.location);
        self.unindex_location(location, handle);
        self.contents.remove(&Some(id));
        self.handles.remove(&handle);
        self.instances.remove(&id);
        Ok(true)
    }

    /// Moves an instance. `None` means nowhere.
    ///
    /// The whole location ancestry of the destination is checked, so an
    /// object can never end up inside itself, however deep the nesting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if the move would create a containment
    /// cycle, `NotFound` if either object does not exist.
    pub fn move_to(&mut self, id: ObjectId, destination: Option<ObjectId>) -> Result<()> {
        let from = self.instance(id)?.location;
        self.apply(Change::Move {
            object: id,
            from,
            to: destination,
        })
    }

    pub(super) fn apply_move(&mut self, id: ObjectId, to: Option<ObjectId>) -> Result<()> {
        let instance = self.instance(id)?;
        let (handle, from) = (instance.handle, instance.location);
        if let Some(dest) = to {
            self.instance(dest)?;
            if dest == id || self.ancestry(dest).contains(&id) {
                return Err(Error::new(ErrorKind::InvalidLocation(format!(
                    "{handle} cannot be moved inside itself"
                ))));
            }
        }
        if from == to {
            return Ok(());
        }
        self.unindex_location(from, handle);
        self.contents
            .entry(to)
            .or_insert_with(im::OrdMap::new)
            .insert(handle, id);
        self.instance_mut(id)?.location = to;
        Ok(())
    }

    fn unindex_location(&mut self, location: Option<ObjectId>, handle: Handle) {
        let now_empty = match self.contents.get_mut(&location) {
            Some(index) => {
                index.remove(&handle);
                index.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.contents.remove(&location);
        }
    }

    // --- Queries ---

    /// Looks up an instance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn instance(&self, id: ObjectId) -> Result<&Instance> {
        self.instances
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("object {id}")))
    }

    /// Returns true if the instance exists.
    #[must_use]
    pub fn exists(&self, id: ObjectId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Looks up an instance by handle.
    #[must_use]
    pub fn find_by_handle(&self, handle: Handle) -> Option<&Instance> {
        self.handles
            .get(&handle)
            .and_then(|id| self.instances.get(id))
    }

    /// Lists the objects at a location in handle order. `None` lists
    /// everything that is nowhere.
    #[must_use]
    pub fn objects_in(&self, location: Option<ObjectId>) -> Vec<ObjectId> {
        self.contents
            .get(&location)
            .map(|index| index.values().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the location chain of an object, innermost container first.
    #[must_use]
    pub fn ancestry(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut cursor = self.instances.get(&id).and_then(|i| i.location);
        while let Some(current) = cursor {
            if chain.len() > self.instances.len() || chain.contains(&current) {
                break;
            }
            chain.push(current);
            cursor = self.instances.get(&current).and_then(|i| i.location);
        }
        chain
    }

    /// Lists instances of a class in handle order. With `recursive`,
    /// instances of subclasses are included.
    #[must_use]
    pub fn instances_of(&self, class: ClassId, recursive: bool) -> Vec<ObjectId> {
        self.instances()
            .filter(|i| {
                if recursive {
                    self.inherits_from(i.class, class)
                } else {
                    i.class == class
                }
            })
            .map(|i| i.id)
            .collect()
    }

    // --- Properties ---

    /// Resolves a property: the instance's own bag first, then each class
    /// in its chain from most specific to root.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist. An absent property
    /// is `Ok(None)`.
    pub fn get_property(&self, id: ObjectId, name: &str) -> Result<Option<&Value>> {
        let instance = self.instance(id)?;
        if let Some(value) = instance.properties.get(name) {
            return Ok(Some(value));
        }
        Ok(self
            .chain_most_specific_first(instance.class)
            .filter_map(|class| self.classes.get(&class))
            .find_map(|class| class.defaults.get(name)))
    }

    /// Writes a property on the instance's own bag. Writing `nil` removes
    /// the override.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn set_property(&mut self, id: ObjectId, name: &str, value: impl Into<Value>) -> Result<()> {
        self.apply(Change::SetProperty {
            object: id,
            name: name.to_string(),
            value: value.into(),
        })
    }

    /// Removes an instance-level override so the class default shows through.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn clear_property(&mut self, id: ObjectId, name: &str) -> Result<()> {
        self.apply(Change::ClearProperty {
            object: id,
            name: name.to_string(),
        })
    }

    /// Returns the instance's own bag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn own_properties(&self, id: ObjectId) -> Result<&PropertyBag> {
        Ok(&self.instance(id)?.properties)
    }

    /// Returns every property visible on the instance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the instance does not exist.
    pub fn resolved_properties(&self, id: ObjectId) -> Result<PropertyBag> {
        let instance = self.instance(id)?;
        Ok(self
            .merged_defaults(instance.class)?
            .overlay(&instance.properties))
    }

    /// Integer property, or `default` if absent or not an integer.
    #[must_use]
    pub fn get_int_or(&self, id: ObjectId, name: &str, default: i64) -> i64 {
        self.typed(id, name, Value::as_int).unwrap_or(default)
    }

    /// Float property, or `default` if absent or not numeric.
    #[must_use]
    pub fn get_float_or(&self, id: ObjectId, name: &str, default: f64) -> f64 {
        self.typed(id, name, Value::as_number).unwrap_or(default)
    }

    /// Boolean property, or `default` if absent or not a boolean.
    #[must_use]
    pub fn get_bool_or(&self, id: ObjectId, name: &str, default: bool) -> bool {
        self.typed(id, name, Value::as_bool).unwrap_or(default)
    }

    /// String property, or `default` if absent or not a string.
    #[must_use]
    pub fn get_str_or(&self, id: ObjectId, name: &str, default: &str) -> String {
        self.get_property(id, name)
            .ok()
            .flatten()
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn typed<T>(&self, id: ObjectId, name: &str, extract: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.get_property(id, name).ok().flatten().and_then(extract)
    }

    /// Checks a capability flag in the object's `permissions` property.
    ///
    /// The property may be a list of strings or one space-separated
    /// string. The `wizard` flag grants everything.
    #[must_use]
    pub fn has_permission(&self, id: ObjectId, flag: &str) -> bool {
        let Some(value) = self.get_property(id, PERMISSIONS_PROPERTY).ok().flatten() else {
            return false;
        };
        let granted = |f: &str| f.eq_ignore_ascii_case(flag) || f.eq_ignore_ascii_case(WIZARD_FLAG);
        match value {
            Value::String(s) => s.split_whitespace().any(granted),
            Value::List(items) => items.iter().filter_map(Value::as_str).any(granted),
            _ => false,
        }
    }

    /// Human label of an object: its `name` property, else its handle.
    #[must_use]
    pub fn display_name(&self, id: ObjectId) -> String {
        match self.instance(id) {
            Ok(instance) => self
                .get_property(id, "name")
                .ok()
                .flatten()
                .and_then(Value::as_str)
                .map_or_else(|| instance.handle.to_string(), str::to_string),
            Err(_) => format!("<destroyed {id}>"),
        }
    }
}
