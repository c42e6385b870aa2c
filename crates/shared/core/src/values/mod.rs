//! Scalar values and their declared type tags

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text layout used for `datetime` scalars on the wire
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Declared type of a scalar element.
///
/// Tags the gateway sends that this client does not know are kept verbatim
/// in `Unknown` so newer gateways keep working against older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Bool,
    Char,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Date,
    Time,
    Datetime,
    Unknown(String),
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        match tag {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "string" => Self::String,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::Datetime,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed scalar value extracted from an element
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Datetime(NaiveDateTime),
    /// Scalar whose type tag this client does not recognise, kept as text
    Unknown { type_tag: String, text: String },
}

impl Value {
    /// Type tag this value is declared with on the wire
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::Char(_) => TypeTag::Char,
            Self::Int32(_) => TypeTag::Int32,
            Self::Int64(_) => TypeTag::Int64,
            Self::Float32(_) => TypeTag::Float32,
            Self::Float64(_) => TypeTag::Float64,
            Self::String(_) => TypeTag::String,
            Self::Date(_) => TypeTag::Date,
            Self::Time(_) => TypeTag::Time,
            Self::Datetime(_) => TypeTag::Datetime,
            Self::Unknown { type_tag, .. } => TypeTag::Unknown(type_tag.clone()),
        }
    }

    /// Wire text for this value
    pub fn to_text(&self) -> String {
        match self {
            Self::Datetime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Self::Unknown { text, .. } => text.clone(),
            other => other.to_string(),
        }
    }

    /// Parse wire text according to its declared tag.
    ///
    /// Returns `None` when the text is not valid for a known tag. Unknown
    /// tags never fail.
    pub fn parse(tag: &TypeTag, text: &str) -> Option<Self> {
        let value = match tag {
            TypeTag::Bool => Self::Bool(text.parse().ok()?),
            TypeTag::Char => {
                let mut chars = text.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Self::Char(c)
            }
            TypeTag::Int32 => Self::Int32(text.parse().ok()?),
            TypeTag::Int64 => Self::Int64(text.parse().ok()?),
            TypeTag::Float32 => Self::Float32(text.parse().ok()?),
            TypeTag::Float64 => Self::Float64(text.parse().ok()?),
            TypeTag::String => Self::String(text.to_string()),
            TypeTag::Date => Self::Date(text.parse().ok()?),
            TypeTag::Time => Self::Time(text.parse().ok()?),
            TypeTag::Datetime => Self::Datetime(text.parse().ok()?),
            TypeTag::Unknown(type_tag) => Self::Unknown {
                type_tag: type_tag.clone(),
                text: text.to_string(),
            },
        };
        Some(value)
    }

    /// Numeric view, for fields displayed or aggregated as numbers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::Float32(v) => Some(f64::from(*v)),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Unknown { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Char(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{}", v),
            Self::Time(v) => write!(f, "{}", v),
            Self::Datetime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            Self::Unknown { text, .. } => f.write_str(text),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::Datetime(v)
    }
}
