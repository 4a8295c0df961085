//! The fixed set of functions scripts may call.
//!
//! Scripts have no user-defined functions of their own: every call form
//! names either a special form or one of these builtins, and the compiler
//! resolves and arity-checks the name once. Builtins split into pure ones,
//! evaluated by [`native`](crate::native), and host ones that reach the
//! object graph through [`HostContext`](crate::host::HostContext).

use std::fmt;

/// A builtin function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Builtin {
    // Arithmetic and comparison
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Abs,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Not,

    // Strings
    Str,
    Upper,
    Lower,
    Trim,
    Split,
    Join,
    Substring,
    StartsWith,
    EndsWith,

    // Lists
    List,
    First,
    Rest,
    Nth,
    Count,
    Append,
    Concat,
    IsEmpty,
    Contains,
    Reverse,
    Range,

    // Types and conversion
    TypeOf,
    IsNil,
    ToInt,

    // General
    Now,
    Random,
    Error,

    // Messaging
    Notify,
    Tell,

    // Properties
    Get,
    GetOr,
    Set,
    Has,
    Clear,

    // Containment
    Location,
    Contents,
    Move,
    Create,
    Destroy,

    // Lookups
    ClassOf,
    Class,
    IsA,
    Handle,
    Object,
    Permission,

    // Nested calls
    Call,
    CallVerb,
}

/// Accepted argument counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    /// Fewest arguments.
    pub min: usize,
    /// Most arguments, `None` for variadic.
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    /// Returns true if `count` arguments are accepted.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{} to {max}", self.min),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Name, builtin, and arity for every builtin.
const TABLE: &[(&str, Builtin, Arity)] = &[
    ("+", Builtin::Add, Arity::at_least(0)),
    ("-", Builtin::Sub, Arity::at_least(1)),
    ("*", Builtin::Mul, Arity::at_least(0)),
    ("/", Builtin::Div, Arity::at_least(2)),
    ("mod", Builtin::Mod, Arity::exactly(2)),
    ("min", Builtin::Min, Arity::at_least(1)),
    ("max", Builtin::Max, Arity::at_least(1)),
    ("abs", Builtin::Abs, Arity::exactly(1)),
    ("=", Builtin::Eq, Arity::at_least(2)),
    ("!=", Builtin::NotEq, Arity::exactly(2)),
    ("<", Builtin::Lt, Arity::at_least(2)),
    ("<=", Builtin::Le, Arity::at_least(2)),
    (">", Builtin::Gt, Arity::at_least(2)),
    (">=", Builtin::Ge, Arity::at_least(2)),
    ("not", Builtin::Not, Arity::exactly(1)),
    ("str", Builtin::Str, Arity::at_least(0)),
    ("upper", Builtin::Upper, Arity::exactly(1)),
    ("lower", Builtin::Lower, Arity::exactly(1)),
    ("trim", Builtin::Trim, Arity::exactly(1)),
    ("split", Builtin::Split, Arity::between(1, 2)),
    ("join", Builtin::Join, Arity::between(1, 2)),
    ("substring", Builtin::Substring, Arity::between(2, 3)),
    ("starts-with?", Builtin::StartsWith, Arity::exactly(2)),
    ("ends-with?", Builtin::EndsWith, Arity::exactly(2)),
    ("list", Builtin::List, Arity::at_least(0)),
    ("first", Builtin::First, Arity::exactly(1)),
    ("rest", Builtin::Rest, Arity::exactly(1)),
    ("nth", Builtin::Nth, Arity::exactly(2)),
    ("count", Builtin::Count, Arity::exactly(1)),
    ("append", Builtin::Append, Arity::exactly(2)),
    ("concat", Builtin::Concat, Arity::at_least(0)),
    ("empty?", Builtin::IsEmpty, Arity::exactly(1)),
    ("contains?", Builtin::Contains, Arity::exactly(2)),
    ("reverse", Builtin::Reverse, Arity::exactly(1)),
    ("range", Builtin::Range, Arity::between(1, 2)),
    ("type-of", Builtin::TypeOf, Arity::exactly(1)),
    ("nil?", Builtin::IsNil, Arity::exactly(1)),
    ("int", Builtin::ToInt, Arity::exactly(1)),
    ("now", Builtin::Now, Arity::exactly(0)),
    ("random", Builtin::Random, Arity::exactly(1)),
    ("error", Builtin::Error, Arity::at_least(1)),
    ("notify", Builtin::Notify, Arity::at_least(2)),
    ("tell", Builtin::Tell, Arity::at_least(1)),
    ("get", Builtin::Get, Arity::exactly(2)),
    ("get-or", Builtin::GetOr, Arity::exactly(3)),
    ("set", Builtin::Set, Arity::exactly(3)),
    ("has?", Builtin::Has, Arity::exactly(2)),
    ("clear", Builtin::Clear, Arity::exactly(2)),
    ("location", Builtin::Location, Arity::exactly(1)),
    ("contents", Builtin::Contents, Arity::exactly(1)),
    ("move", Builtin::Move, Arity::exactly(2)),
    ("create", Builtin::Create, Arity::between(1, 2)),
    ("destroy", Builtin::Destroy, Arity::exactly(1)),
    ("class-of", Builtin::ClassOf, Arity::exactly(1)),
    ("class", Builtin::Class, Arity::exactly(1)),
    ("is-a?", Builtin::IsA, Arity::exactly(2)),
    ("handle", Builtin::Handle, Arity::exactly(1)),
    ("object", Builtin::Object, Arity::exactly(1)),
    ("permission?", Builtin::Permission, Arity::exactly(2)),
    ("call", Builtin::Call, Arity::at_least(2)),
    ("call-verb", Builtin::CallVerb, Arity::at_least(2)),
];

impl Builtin {
    /// Looks up a builtin by its script name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        TABLE
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, builtin, _)| *builtin)
    }

    /// Returns every builtin name, in table order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|(name, _, _)| *name)
    }

    fn entry(self) -> (&'static str, Arity) {
        TABLE
            .iter()
            .find(|(_, builtin, _)| *builtin == self)
            .map_or(("?", Arity::at_least(0)), |(name, _, arity)| (*name, *arity))
    }

    /// Returns the script name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.entry().0
    }

    /// Returns the accepted argument counts.
    #[must_use]
    pub fn arity(self) -> Arity {
        self.entry().1
    }

    /// Returns true for builtins that never touch the host.
    #[must_use]
    pub const fn is_pure(self) -> bool {
        !matches!(
            self,
            Self::Now
                | Self::Random
                | Self::Notify
                | Self::Tell
                | Self::Get
                | Self::GetOr
                | Self::Set
                | Self::Has
                | Self::Clear
                | Self::Location
                | Self::Contents
                | Self::Move
                | Self::Create
                | Self::Destroy
                | Self::ClassOf
                | Self::Class
                | Self::IsA
                | Self::Handle
                | Self::Object
                | Self::Permission
                | Self::Call
                | Self::CallVerb
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
