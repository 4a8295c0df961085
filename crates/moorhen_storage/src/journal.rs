//! Fine-grained change records.
//!
//! Every mutation of a [`World`](crate::World) is expressed as a [`Change`]
//! and appended to the world's journal. Committing a snapshot replays its
//! journal onto the shared world, one property or record at a time, so two
//! actors writing different properties of one object never lose an update.
//!
//! Each change also names the [`Slot`]s it writes. A commit is rejected when
//! a slot it read or wrote was written by someone else after its snapshot
//! was taken.

use moorhen_foundation::{ClassId, FunctionId, ObjectId, Value, VerbId};

use crate::records::{Class, Function, Instance, Verb};

/// One atomic mutation of the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// A class was created.
    CreateClass(Class),
    /// A class was re-parented.
    SetClassParent {
        /// The class.
        class: ClassId,
        /// New parent.
        parent: Option<ClassId>,
    },
    /// A class default was written.
    SetClassDefault {
        /// The class.
        class: ClassId,
        /// Property name.
        name: String,
        /// New default.
        value: Value,
    },
    /// A class default was removed.
    RemoveClassDefault {
        /// The class.
        class: ClassId,
        /// Property name.
        name: String,
    },
    /// A class was deleted.
    DeleteClass(ClassId),
    /// An instance was created.
    CreateInstance(Instance),
    /// An instance property was written.
    SetProperty {
        /// The instance.
        object: ObjectId,
        /// Property name.
        name: String,
        /// New value.
        value: Value,
    },
    /// An instance override was removed.
    ClearProperty {
        /// The instance.
        object: ObjectId,
        /// Property name.
        name: String,
    },
    /// An instance changed location.
    Move {
        /// The instance.
        object: ObjectId,
        /// Location when the change was made.
        from: Option<ObjectId>,
        /// New location, `None` for nowhere.
        to: Option<ObjectId>,
    },
    /// An instance was destroyed.
    DestroyInstance(ObjectId),
    /// A verb was created or its code replaced.
    PutVerb(Verb),
    /// A verb was removed.
    RemoveVerb(VerbId),
    /// A function was created or its code replaced.
    PutFunction(Function),
    /// A function was removed.
    RemoveFunction(FunctionId),
}

/// Identifies the persisted record a change touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    /// A class record.
    Class(ClassId),
    /// An instance record.
    Instance(ObjectId),
    /// A verb record.
    Verb(VerbId),
    /// A function record.
    Function(FunctionId),
}

/// The smallest piece of state two transactions can collide on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// An instance's own value for one property.
    Property(ObjectId, String),
    /// Where an instance is.
    Location(ObjectId),
    /// What a location holds; `None` is nowhere.
    Contents(Option<ObjectId>),
    /// Existence and everything else about a record.
    Record(RecordKey),
}

impl Slot {
    /// Returns the record slot whose change also invalidates this one.
    #[must_use]
    pub fn parent(&self) -> Option<Slot> {
        match self {
            Self::Property(object, _) | Self::Location(object) => {
                Some(Self::Record(RecordKey::Instance(*object)))
            }
            Self::Contents(Some(object)) => Some(Self::Record(RecordKey::Instance(*object))),
            Self::Contents(None) | Self::Record(_) => None,
        }
    }
}

impl Change {
    /// Returns the slots this change writes.
    #[must_use]
    pub fn slots(&self) -> Vec<Slot> {
        match self {
            Self::SetProperty { object, name, .. } | Self::ClearProperty { object, name } => {
                vec![Slot::Property(*object, name.clone())]
            }
            Self::Move { object, from, to } => vec![
                Slot::Location(*object),
                Slot::Contents(*from),
                Slot::Contents(*to),
            ],
            Self::CreateInstance(instance) => vec![
                Slot::Record(RecordKey::Instance(instance.id)),
                Slot::Contents(instance.location),
            ],
            _ => vec![Slot::Record(self.record())],
        }
    }

    /// Returns the record that must be rewritten or deleted after this change.
    #[must_use]
    pub fn record(&self) -> RecordKey {
        match self {
            Self::CreateClass(class) => RecordKey::Class(class.id),
            Self::SetClassParent { class, .. }
            | Self::SetClassDefault { class, .. }
            | Self::RemoveClassDefault { class, .. }
            | Self::DeleteClass(class) => RecordKey::Class(*class),
            Self::CreateInstance(instance) => RecordKey::Instance(instance.id),
            Self::SetProperty { object, .. }
            | Self::ClearProperty { object, .. }
            | Self::Move { object, .. }
            | Self::DestroyInstance(object) => RecordKey::Instance(*object),
            Self::PutVerb(verb) => RecordKey::Verb(verb.id),
            Self::RemoveVerb(id) => RecordKey::Verb(*id),
            Self::PutFunction(function) => RecordKey::Function(function.id),
            Self::RemoveFunction(id) => RecordKey::Function(*id),
        }
    }
}
