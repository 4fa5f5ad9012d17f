//! Host-side value model.
//!
//! # Responsibility
//! - Represent untyped values received from (and returned to) the host runtime.
//! - Provide stable host type names for diagnostics.
//!
//! # Invariants
//! - `Int` is the host's native integer box and is exactly `i64` wide.
//! - Values are never coerced here; conversion lives in `marshal`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Host type name for `HostValue::None`.
pub const HOST_TYPE_NONE: &str = "none";
/// Host type name for `HostValue::Bool`.
pub const HOST_TYPE_BOOL: &str = "bool";
/// Host type name for `HostValue::Int`.
pub const HOST_TYPE_INT: &str = "int";
/// Host type name for `HostValue::Float`.
pub const HOST_TYPE_FLOAT: &str = "float";
/// Host type name for `HostValue::Str`.
pub const HOST_TYPE_STR: &str = "str";
/// Host type name for `HostValue::List`.
pub const HOST_TYPE_LIST: &str = "list";

/// One dynamically typed value as seen by the host runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HostValue {
    /// Host null/unit value.
    None,
    Bool(bool),
    /// Host integer box.
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<HostValue>),
}

impl HostValue {
    /// Stable host type name used in conversion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => HOST_TYPE_NONE,
            Self::Bool(_) => HOST_TYPE_BOOL,
            Self::Int(_) => HOST_TYPE_INT,
            Self::Float(_) => HOST_TYPE_FLOAT,
            Self::Str(_) => HOST_TYPE_STR,
            Self::List(_) => HOST_TYPE_LIST,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(value) => write!(f, "{value:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        Self::List(value)
    }
}
