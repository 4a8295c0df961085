//! Type descriptors for function signatures.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for function parameters and return values.
///
/// Used to declare the signature of object functions and check the values
/// passed to them at call time.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The nil type (only value: nil). Also the "void" return type.
    Nil,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
    /// UTC timestamp.
    Timestamp,
    /// Ordered list of values.
    List,
    /// Reference to an object instance.
    Object,
    /// Optional type (value or nil).
    Option(Box<Type>),
    /// Any type (accepts any value).
    Any,
}

impl Type {
    /// Creates an optional type.
    #[must_use]
    pub fn option(inner: Type) -> Self {
        Self::Option(Box::new(inner))
    }

    /// Returns true if this type is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Checks if a value type is accepted by this type.
    ///
    /// - `Any` accepts all types
    /// - `Option(T)` accepts `Nil` and any type that `T` accepts
    /// - `Float` accepts `Int` (numeric promotion)
    /// - Everything else must match exactly
    #[must_use]
    pub fn accepts(&self, value_type: &Type) -> bool {
        match (self, value_type) {
            (Self::Any, _) => true,
            (Self::Option(inner), actual) => matches!(actual, Self::Nil) || inner.accepts(actual),
            (Self::Nil, Self::Nil)
            | (Self::Bool, Self::Bool)
            | (Self::Int | Self::Float, Self::Int)
            | (Self::Float, Self::Float)
            | (Self::String, Self::String)
            | (Self::Timestamp, Self::Timestamp)
            | (Self::List, Self::List)
            | (Self::Object, Self::Object) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::List => write!(f, "list"),
            Self::Object => write!(f, "object"),
            Self::Option(t) => write!(f, "{t:?}?"),
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error returned for an unrecognized type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type name: {}", self.0)
    }
}

impl std::error::Error for UnknownType {}

impl FromStr for Type {
    type Err = UnknownType;

    /// Parses type names as written in bootstrap records.
    ///
    /// A trailing `?` makes the type optional (`string?`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(inner) = trimmed.strip_suffix('?') {
            return inner.parse().map(Type::option);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "nil" | "void" | "none" => Ok(Self::Nil),
            "bool" | "boolean" => Ok(Self::Bool),
            "int" | "integer" => Ok(Self::Int),
            "float" | "double" | "number" => Ok(Self::Float),
            "string" | "str" | "text" => Ok(Self::String),
            "timestamp" | "time" | "datetime" => Ok(Self::Timestamp),
            "list" => Ok(Self::List),
            "object" | "obj" => Ok(Self::Object),
            "any" | "" => Ok(Self::Any),
            _ => Err(UnknownType(s.to_string())),
        }
    }
}
