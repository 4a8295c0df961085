//! Persistent record types: classes, instances, verbs, and functions.
//!
//! These are plain data. All invariants (acyclic ancestry, containment
//! forest, handle uniqueness) are enforced by [`World`](crate::World).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moorhen_foundation::{ClassId, FunctionId, Handle, ObjectId, PropertyBag, Type, VerbId};

/// A reusable archetype with default properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Class {
    /// Unique id.
    pub id: ClassId,
    /// Human name, unique ignoring case.
    pub name: String,
    /// Parent class (single inheritance).
    pub parent: Option<ClassId>,
    /// Default property values for instances.
    pub defaults: PropertyBag,
    /// Abstract classes cannot be instantiated.
    pub is_abstract: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A concrete object in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique id.
    pub id: ObjectId,
    /// Player-facing number.
    pub handle: Handle,
    /// Owning class.
    pub class: ClassId,
    /// Instance-level property overrides.
    pub properties: PropertyBag,
    /// Containing object, or `None` for nowhere.
    pub location: Option<ObjectId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Instance {
    /// Returns the object's `name` property, if it has one of its own.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }
}

/// What a verb or function is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Owner {
    /// Inherited by every instance of the class and its subclasses.
    Class(ClassId),
    /// Attached to a single instance.
    Instance(ObjectId),
}

impl From<ClassId> for Owner {
    fn from(id: ClassId) -> Self {
        Self::Class(id)
    }
}

impl From<ObjectId> for Owner {
    fn from(id: ObjectId) -> Self {
        Self::Instance(id)
    }
}

/// A pattern-matched, player-invokable unit of code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verb {
    /// Unique id.
    pub id: VerbId,
    /// Class or instance the verb is attached to.
    pub owner: Owner,
    /// Primary name. A `*` marks the shortest accepted abbreviation.
    pub name: String,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// Argument template matched against the rest of the input.
    pub pattern: String,
    /// Help text.
    pub description: String,
    /// Script source.
    pub code: String,
    /// Who created it.
    pub created_by: Option<ObjectId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last code change.
    pub updated_at: DateTime<Utc>,
    /// Creation order, larger is newer.
    pub seq: u64,
}

impl Verb {
    /// Iterates over the name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// One positional parameter of a function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Name bound in the function body.
    pub name: String,
    /// Accepted value type.
    pub ty: Type,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A typed callable addressed by owner and name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Unique id.
    pub id: FunctionId,
    /// Class or instance the function is attached to.
    pub owner: Owner,
    /// Name.
    pub name: String,
    /// Positional parameters.
    pub params: Vec<Param>,
    /// Declared return type.
    pub returns: Type,
    /// Help text.
    pub description: String,
    /// Script source.
    pub code: String,
    /// Who created it.
    pub created_by: Option<ObjectId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last code change.
    pub updated_at: DateTime<Utc>,
    /// Creation order, larger is newer.
    pub seq: u64,
}

/// Fields needed to create a verb.
#[derive(Clone, Debug, Default)]
pub struct VerbSpec {
    /// Primary name.
    pub name: String,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// Argument template.
    pub pattern: String,
    /// Help text.
    pub description: String,
    /// Script source.
    pub code: String,
    /// Who created it.
    pub created_by: Option<ObjectId>,
}

impl VerbSpec {
    /// Starts a verb definition with a name and code.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    /// Sets the aliases.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the argument pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Records the creator.
    #[must_use]
    pub fn created_by(mut self, creator: ObjectId) -> Self {
        self.created_by = Some(creator);
        self
    }
}

/// Fields needed to create a function.
#[derive(Clone, Debug)]
pub struct FunctionSpec {
    /// Name.
    pub name: String,
    /// Positional parameters.
    pub params: Vec<Param>,
    /// Declared return type.
    pub returns: Type,
    /// Help text.
    pub description: String,
    /// Script source.
    pub code: String,
    /// Who created it.
    pub created_by: Option<ObjectId>,
}

impl FunctionSpec {
    /// Starts a function definition returning `any`.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: Type::Any,
            description: String::new(),
            code: code.into(),
            created_by: None,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returning(mut self, ty: Type) -> Self {
        self.returns = ty;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Records the creator.
    #[must_use]
    pub fn created_by(mut self, creator: ObjectId) -> Self {
        self.created_by = Some(creator);
        self
    }
}
