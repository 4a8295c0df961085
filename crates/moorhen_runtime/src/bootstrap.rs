//! Bootstrap data: verb and function records loaded from JSON, and the core
//! world every server starts from.
//!
//! A bootstrap file looks like:
//!
//! ```json
//! {
//!   "verbs": [
//!     { "name": "l*ook", "aliases": "peer gaze", "pattern": "this",
//!       "description": "...", "targetClass": "thing",
//!       "code": ["(tell (call this \"describe\"))"] }
//!   ],
//!   "functions": [
//!     { "name": "describe", "params": [{ "name": "x", "type": "int" }],
//!       "returns": "string", "targetClass": "thing", "code": ["..."] }
//!   ]
//! }
//! ```
//!
//! Records without `targetClass` go on the system object.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use moorhen_foundation::{
    ClassId, Error, ErrorKind, Handle, ObjectId, PropertyBag, Result, Type, Value,
};
use moorhen_storage::{Database, FunctionSpec, Owner, PERMISSIONS_PROPERTY, VerbSpec, World};

use crate::dispatcher::PROGRAMMER_FLAG;

const CORE_DATA: &str = include_str!("../data/core.json");

/// System property holding the room new players start in.
pub const START_ROOM_PROPERTY: &str = "start_room";

/// A verb as written in a bootstrap file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerbRecord {
    /// Primary name, possibly with a `*` abbreviation mark.
    pub name: String,
    /// Space-separated alternative names.
    #[serde(default)]
    pub aliases: String,
    /// Argument template.
    #[serde(default)]
    pub pattern: String,
    /// Help text.
    #[serde(default)]
    pub description: String,
    /// Class to attach to. Absent means the system object.
    #[serde(default)]
    pub target_class: Option<String>,
    /// Source, one entry per line.
    #[serde(default)]
    pub code: Vec<String>,
}

/// A function parameter as written in a bootstrap file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ParamRecord {
    /// Parameter name.
    pub name: String,
    /// Type name (`int`, `string?`, ...).
    #[serde(rename = "type", default)]
    pub ty: String,
}

/// A function as written in a bootstrap file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    /// Name.
    pub name: String,
    /// Positional parameters.
    #[serde(default)]
    pub params: Vec<ParamRecord>,
    /// Return type name. Absent means `any`.
    #[serde(default)]
    pub returns: Option<String>,
    /// Help text.
    #[serde(default)]
    pub description: String,
    /// Class to attach to. Absent means the system object.
    #[serde(default)]
    pub target_class: Option<String>,
    /// Source, one entry per line.
    #[serde(default)]
    pub code: Vec<String>,
}

/// A parsed bootstrap file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct BootstrapFile {
    /// Verb records.
    #[serde(default)]
    pub verbs: Vec<VerbRecord>,
    /// Function records.
    #[serde(default)]
    pub functions: Vec<FunctionRecord>,
}

impl BootstrapFile {
    /// Parses a bootstrap file.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the JSON is malformed.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
    }

    /// Reads and parses a bootstrap file from disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or `Serialization` if it is
    /// malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::new(ErrorKind::Io(format!("{}: {e}", path.as_ref().display()))))?;
        Self::parse(&text)
    }

    /// The verbs and functions every world starts with.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the built-in data is malformed.
    pub fn core() -> Result<Self> {
        Self::parse(CORE_DATA)
    }
}

/// What a load did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that did not exist before.
    pub created: usize,
    /// Existing records whose code was replaced.
    pub updated: usize,
    /// Existing records left alone.
    pub skipped: usize,
}

/// Installs bootstrap records into a world.
#[derive(Clone, Copy, Debug, Default)]
pub struct BootstrapLoader {
    overwrite: bool,
    system: Option<ObjectId>,
}

impl BootstrapLoader {
    /// Creates a loader that skips existing records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the code of records that already exist.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the owner of records without a `targetClass`.
    #[must_use]
    pub fn with_system(mut self, system: Option<ObjectId>) -> Self {
        self.system = system;
        self
    }

    /// Installs `file` into `world`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown target class or a missing system
    /// object, or `Serialization` for an unknown type name. Records before
    /// the failing one are already applied; load inside a transaction to
    /// get all-or-nothing behaviour.
    pub fn load(&self, world: &mut World, file: &BootstrapFile) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        for record in &file.verbs {
            let owner = self.owner(world, record.target_class.as_deref())?;
            let code = record.code.join("\n");
            match world.find_verb(owner, &record.name).map(|v| v.id) {
                Some(_) if !self.overwrite => report.skipped += 1,
                Some(id) => {
                    world.update_verb_code(id, code)?;
                    report.updated += 1;
                }
                None => {
                    let spec = VerbSpec::new(record.name.as_str(), code)
                        .with_aliases(record.aliases.split_whitespace())
                        .with_pattern(record.pattern.as_str())
                        .with_description(record.description.as_str());
                    world.add_verb(owner, spec)?;
                    report.created += 1;
                }
            }
        }
        for record in &file.functions {
            let owner = self.owner(world, record.target_class.as_deref())?;
            let code = record.code.join("\n");
            match world.find_function(owner, &record.name).map(|f| f.id) {
                Some(_) if !self.overwrite => report.skipped += 1,
                Some(id) => {
                    world.update_function_code(id, code)?;
                    report.updated += 1;
                }
                None => {
                    world.add_function(owner, function_spec(record, code)?)?;
                    report.created += 1;
                }
            }
        }
        Ok(report)
    }

    /// Installs `file` into `db` in one transaction.
    ///
    /// # Errors
    ///
    /// Same as [`BootstrapLoader::load`]; nothing is applied on error.
    pub fn load_into(&self, db: &Database, file: &BootstrapFile) -> Result<LoadReport> {
        let report = db.transact(|world| self.load(world, file))?;
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "bootstrap loaded"
        );
        Ok(report)
    }

    fn owner(&self, world: &World, target_class: Option<&str>) -> Result<Owner> {
        match target_class {
            Some(name) => world
                .class_by_name(name)
                .map(|c| Owner::Class(c.id))
                .ok_or_else(|| Error::not_found(format!("class {name}"))),
            None => self
                .system
                .map(Owner::Instance)
                .ok_or_else(|| Error::not_found("system object")),
        }
    }
}

fn function_spec(record: &FunctionRecord, code: String) -> Result<FunctionSpec> {
    let parse = |name: &str| {
        name.parse::<Type>()
            .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
    };
    let mut spec = FunctionSpec::new(record.name.as_str(), code);
    for param in &record.params {
        spec = spec.with_param(param.name.as_str(), parse(&param.ty)?);
    }
    if let Some(returns) = &record.returns {
        spec = spec.returning(parse(returns)?);
    }
    spec.description.clone_from(&record.description);
    Ok(spec)
}

/// The well-known objects of a core world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreWorld {
    /// The system object (`#0` in a fresh world).
    pub system: ObjectId,
    /// Where new players appear.
    pub start_room: ObjectId,
    /// What loading the core verbs did.
    pub report: LoadReport,
}

/// Creates the core classes, the system object, a start room, and the
/// standard verbs. Running it again on the same database changes nothing.
///
/// # Errors
///
/// Returns `AlreadyExists` if handle `#0` belongs to something other than
/// the system object, or any storage error.
pub fn core_world(db: &Database) -> Result<CoreWorld> {
    let file = BootstrapFile::core()?;
    let core = db.transact(|world| {
        let (system, start_room) = core_objects(world)?;
        let report = BootstrapLoader::new()
            .with_system(Some(system))
            .load(world, &file)?;
        Ok(CoreWorld {
            system,
            start_room,
            report,
        })
    })?;
    info!(
        system = %core.system,
        created = core.report.created,
        skipped = core.report.skipped,
        "core world ready"
    );
    Ok(core)
}

fn ensure_class(
    world: &mut World,
    name: &str,
    parent: Option<ClassId>,
    defaults: PropertyBag,
    is_abstract: bool,
) -> Result<ClassId> {
    if let Some(class) = world.class_by_name(name) {
        return Ok(class.id);
    }
    if is_abstract {
        world.create_abstract_class(name, parent, defaults)
    } else {
        world.create_class(name, parent, defaults)
    }
}

fn core_objects(world: &mut World) -> Result<(ObjectId, ObjectId)> {
    let fixed = PropertyBag::new().insert("fixed", Value::Bool(true));
    let thing = ensure_class(world, "thing", None, PropertyBag::new(), true)?;
    ensure_class(world, "item", Some(thing), PropertyBag::new(), false)?;
    let room = ensure_class(world, "room", Some(thing), fixed.clone(), false)?;
    ensure_class(world, "exit", Some(thing), fixed.clone(), false)?;
    ensure_class(world, "player", Some(thing), fixed, false)?;
    let system_class = ensure_class(world, "system", None, PropertyBag::new(), false)?;

    let occupant = world
        .find_by_handle(Handle::new(0))
        .map(|instance| (instance.id, instance.class));
    let system = match occupant {
        Some((id, class)) if world.inherits_from(class, system_class) => id,
        Some(_) => {
            return Err(Error::new(ErrorKind::AlreadyExists(
                "#0 is not the system object".to_string(),
            )));
        }
        None => {
            let system = world.instantiate(system_class, None)?;
            world.set_property(system, "name", "System")?;
            system
        }
    };

    let existing = world
        .get_property(system, START_ROOM_PROPERTY)?
        .and_then(Value::as_object)
        .filter(|id| world.exists(*id));
    let start_room = match existing {
        Some(room) => room,
        None => {
            let lobby = world.instantiate(room, None)?;
            world.set_property(lobby, "name", "The Lobby")?;
            world.set_property(
                lobby,
                "description",
                "A plain room with bare walls. Everything starts here.",
            )?;
            world.set_property(system, START_ROOM_PROPERTY, lobby)?;
            lobby
        }
    };
    Ok((system, start_room))
}

/// Creates a player in the start room.
///
/// # Errors
///
/// Returns `NotFound` if the world has no `player` class or no start room.
pub fn spawn_player(db: &Database, name: &str, programmer: bool) -> Result<ObjectId> {
    let player = db.transact(|world| {
        let class = world
            .class_by_name("player")
            .map(|c| c.id)
            .ok_or_else(|| Error::not_found("class player"))?;
        let start = world
            .find_by_handle(Handle::new(0))
            .map(|system| system.id)
            .and_then(|system| world.get_property(system, START_ROOM_PROPERTY).ok().flatten())
            .and_then(Value::as_object)
            .ok_or_else(|| Error::not_found("start room"))?;
        let player = world.instantiate(class, Some(start))?;
        world.set_property(player, "name", name)?;
        if programmer {
            world.set_property(player, PERMISSIONS_PROPERTY, PROGRAMMER_FLAG)?;
        }
        Ok(player)
    })?;
    info!(%player, name, programmer, "player created");
    Ok(player)
}
