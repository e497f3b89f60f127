//! Per-placement interactions

use crate::record::{Record, RecordError};

/// Interaction attached to one placement of an entity
///
/// The payload is opaque to the map; whatever interprets it (a script,
/// a dialogue trigger) stores its parameters in `data`. Actions are saved
/// once per hash in the area's shared action table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Action {
    hash: String,
    data: Record,
}

impl Action {
    /// Create an empty action with the given unique hash
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            data: Record::new(),
        }
    }

    /// Unique id of the action
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Action parameters
    pub fn data(&self) -> &Record {
        &self.data
    }

    /// Mutable action parameters
    pub fn data_mut(&mut self) -> &mut Record {
        &mut self.data
    }

    /// Write the action parameters
    pub fn put_state(&self, record: &mut Record) {
        for (key, value) in self.data.fields() {
            record.put(key, value.clone());
        }
    }

    /// Replace the action parameters with those stored in `record`
    pub fn get_state(&mut self, record: &Record) -> Result<(), RecordError> {
        self.data = record.clone();
        Ok(())
    }
}
