//! Typed record values

use super::Record;
use serde::{Deserialize, Serialize};

/// A single typed value stored in a [`Record`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Single character
    Char(char),
    /// Signed 8 bit integer
    Sint8(i8),
    /// Signed 16 bit integer
    Sint16(i16),
    /// Signed 32 bit integer
    Sint32(i32),
    /// Unsigned 8 bit integer
    Uint8(u8),
    /// Unsigned 16 bit integer
    Uint16(u16),
    /// Unsigned 32 bit integer
    Uint32(u32),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Opaque bytes
    Blob(Vec<u8>),
    /// Nested record
    Record(Record),
}

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ValueType {
    Bool,
    Char,
    Sint8,
    Sint16,
    Sint32,
    Uint8,
    Uint16,
    Uint32,
    Float,
    Double,
    String,
    Blob,
    Record,
}

impl Value {
    /// Type tag of this value
    pub fn kind(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Char(_) => ValueType::Char,
            Value::Sint8(_) => ValueType::Sint8,
            Value::Sint16(_) => ValueType::Sint16,
            Value::Sint32(_) => ValueType::Sint32,
            Value::Uint8(_) => ValueType::Uint8,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Blob(_) => ValueType::Blob,
            Value::Record(_) => ValueType::Record,
        }
    }

    /// Borrow the nested record, if this is one
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}
