//! Attribute records
//!
//! A [`Record`] is an ordered list of named, typed fields. Keys need not be
//! unique: sequences (such as a list of placements) are stored as repeated
//! keys and read back by iterating [`Record::fields`] in insertion order.
//! Records nest, and a whole tree of records can be written to and read from
//! RON text.
//!
//! ```
//! use chunk_world::record::Record;
//!
//! let mut record = Record::new();
//! record.put_sint32("hp", 12);
//! record.put_string("name", "door");
//!
//! assert_eq!(record.get_sint32("hp").unwrap(), 12);
//! assert!(record.get_bool("locked").is_err());
//! assert!(!record.success());
//! ```

mod value;

pub use value::{Value, ValueType};

use crate::foundation::math::Coordinate;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use thiserror::Error;

/// Record access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Requested key is not present
    #[error("missing field '{0}'")]
    MissingField(String),

    /// Key is present but holds another type
    #[error("field '{key}' holds {found:?}, expected {expected:?}")]
    TypeMismatch {
        /// Field name
        key: String,
        /// Type the caller asked for
        expected: ValueType,
        /// Type actually stored
        found: ValueType,
    },

    /// Field decoded but holds an unusable value
    #[error("field '{key}' is invalid: {reason}")]
    InvalidValue {
        /// Field name
        key: String,
        /// What is wrong with it
        reason: String,
    },

    /// Text encoding failed
    #[error("encode error: {0}")]
    Encode(String),

    /// Text decoding failed
    #[error("decode error: {0}")]
    Decode(String),
}

/// One named field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub key: String,
    /// Field value
    pub value: Value,
}

/// Ordered key/value container with typed accessors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
    #[serde(skip)]
    failed: Cell<bool>,
}

macro_rules! typed_accessors {
    ($($put:ident, $get:ident, $variant:ident, $ty:ty;)*) => {
        $(
            #[doc = concat!("Append a `", stringify!($ty), "` field")]
            pub fn $put(&mut self, key: impl Into<String>, value: $ty) {
                self.put(key, Value::$variant(value));
            }

            #[doc = concat!("Read the first `", stringify!($ty), "` field named `key`")]
            pub fn $get(&self, key: &str) -> Result<$ty, RecordError> {
                match self.lookup(key)? {
                    Value::$variant(v) => Ok(*v),
                    other => Err(self.mismatch(key, ValueType::$variant, other)),
                }
            }
        )*
    };
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove all fields and reset the success flag
    pub fn clear(&mut self) {
        self.fields.clear();
        self.failed.set(false);
    }

    /// Whether the most recent read succeeded
    pub fn success(&self) -> bool {
        !self.failed.get()
    }

    /// Append a field
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.fields.push(Field { key: key.into(), value });
    }

    /// Value of the first field named `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Check whether a field named `key` exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over `(key, value)` pairs in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|f| (f.key.as_str(), &f.value))
    }

    typed_accessors! {
        put_bool, get_bool, Bool, bool;
        put_char, get_char, Char, char;
        put_sint8, get_sint8, Sint8, i8;
        put_sint16, get_sint16, Sint16, i16;
        put_sint32, get_sint32, Sint32, i32;
        put_uint8, get_uint8, Uint8, u8;
        put_uint16, get_uint16, Uint16, u16;
        put_uint32, get_uint32, Uint32, u32;
        put_float, get_float, Float, f32;
        put_double, get_double, Double, f64;
    }

    /// Append a string field
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, Value::String(value.into()));
    }

    /// Read the first string field named `key`
    pub fn get_string(&self, key: &str) -> Result<&str, RecordError> {
        match self.lookup(key)? {
            Value::String(s) => Ok(s),
            other => Err(self.mismatch(key, ValueType::String, other)),
        }
    }

    /// Append a binary field
    pub fn put_blob(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.put(key, Value::Blob(value));
    }

    /// Read the first binary field named `key`
    pub fn get_blob(&self, key: &str) -> Result<&[u8], RecordError> {
        match self.lookup(key)? {
            Value::Blob(b) => Ok(b),
            other => Err(self.mismatch(key, ValueType::Blob, other)),
        }
    }

    /// Append a nested record
    pub fn put_record(&mut self, key: impl Into<String>, value: Record) {
        self.put(key, Value::Record(value));
    }

    /// Read the first nested record named `key`
    pub fn get_record(&self, key: &str) -> Result<&Record, RecordError> {
        match self.lookup(key)? {
            Value::Record(r) => Ok(r),
            other => Err(self.mismatch(key, ValueType::Record, other)),
        }
    }

    /// Append a coordinate as a nested `x`/`y`/`z` record
    pub fn put_coordinate(&mut self, key: impl Into<String>, value: &Coordinate) {
        let mut c = Record::new();
        c.put_sint32("x", value.x);
        c.put_sint32("y", value.y);
        c.put_sint32("z", value.z);
        self.put_record(key, c);
    }

    /// Read a coordinate written by [`Record::put_coordinate`]
    pub fn get_coordinate(&self, key: &str) -> Result<Coordinate, RecordError> {
        let result = self.get_record(key).and_then(|c| {
            Ok(Coordinate::new(c.get_sint32("x")?, c.get_sint32("y")?, c.get_sint32("z")?))
        });
        self.failed.set(result.is_err());
        result
    }

    /// Encode the record as RON text
    pub fn to_ron(&self) -> Result<String, RecordError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RecordError::Encode(e.to_string()))
    }

    /// Decode a record from RON text
    pub fn from_ron(text: &str) -> Result<Self, RecordError> {
        ron::from_str(text).map_err(|e| RecordError::Decode(e.to_string()))
    }

    fn lookup(&self, key: &str) -> Result<&Value, RecordError> {
        let found = self.get(key);
        self.failed.set(found.is_none());
        found.ok_or_else(|| RecordError::MissingField(key.to_string()))
    }

    fn mismatch(&self, key: &str, expected: ValueType, found: &Value) -> RecordError {
        self.failed.set(true);
        RecordError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}
