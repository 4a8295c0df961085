//! Addressed lookups: functions by owner and name, and verbs by name for
//! `call-verb`.
//!
//! Both search the instance first and then its class chain from the most
//! specific class, newest first within each owner.

use moorhen_foundation::{Error, ObjectId, Result, Type, Value};
use moorhen_parser::VerbName;
use moorhen_storage::{Function, Owner, Verb, World};

/// Resolves and type-checks function calls.
pub struct FunctionResolver;

impl FunctionResolver {
    /// Finds the function `name` that `target` responds to.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the object does not exist or has no such
    /// function.
    pub fn resolve<'w>(world: &'w World, target: ObjectId, name: &str) -> Result<&'w Function> {
        let instance = world.instance(target)?;
        if let Some(function) = world.find_function(Owner::Instance(target), name) {
            return Ok(function);
        }
        world
            .chain_most_specific_first(instance.class)
            .find_map(|class| world.find_function(Owner::Class(class), name))
            .ok_or_else(|| Error::not_found(format!("function {name} on {}", instance.handle)))
    }

    /// Checks positional arguments against the function's parameters.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` on a count mismatch, or `TypeMismatch` for
    /// the first argument its parameter does not accept.
    pub fn check_arguments(function: &Function, args: &[Value]) -> Result<()> {
        if args.len() != function.params.len() {
            return Err(Error::arity_mismatch(
                function.params.len().to_string(),
                args.len(),
            ));
        }
        for (param, arg) in function.params.iter().zip(args) {
            check(&param.ty, arg)?;
        }
        Ok(())
    }

    /// Checks a return value against the declared return type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the declared type does not accept it.
    pub fn check_return(function: &Function, value: &Value) -> Result<()> {
        check(&function.returns, value)
    }
}

fn check(expected: &Type, value: &Value) -> Result<()> {
    let actual = value.value_type();
    if expected.accepts(&actual) {
        Ok(())
    } else {
        Err(Error::type_mismatch(expected.clone(), actual))
    }
}

/// Finds the first verb `target` responds to whose name or alias accepts
/// `name`. Patterns are not consulted.
///
/// # Errors
///
/// Returns `NotFound` if the object does not exist or has no such verb.
pub fn verb_named<'w>(world: &'w World, target: ObjectId, name: &str) -> Result<&'w Verb> {
    let handle = world.instance(target)?.handle;
    world
        .verbs_for(target)?
        .into_iter()
        .find(|verb| verb.names().any(|n| VerbName::parse(n).matches(name)))
        .ok_or_else(|| Error::not_found(format!("verb {name} on {handle}")))
}

/// Display label for a code owner: `#12` or `class room`.
#[must_use]
pub fn owner_label(world: &World, owner: Owner) -> String {
    match owner {
        Owner::Instance(id) => world
            .instance(id)
            .map_or_else(|_| id.to_string(), |i| i.handle.to_string()),
        Owner::Class(id) => world
            .class(id)
            .map_or_else(|_| format!("class {id}"), |c| format!("class {}", c.name)),
    }
}
