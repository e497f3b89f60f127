//! Area errors and load reports

use crate::config::ConfigError;
use crate::record::RecordError;
use thiserror::Error;

/// Area operation errors
#[derive(Error, Debug)]
pub enum WorldError {
    /// Named entities need a non-empty id
    #[error("Entity id must not be empty")]
    EmptyEntityId,

    /// A named entity with this id already exists
    #[error("Duplicate entity id '{0}'")]
    DuplicateEntity(String),

    /// The entity is already placed at this position
    #[error("Entity {index} is already placed at {position}")]
    DuplicatePlacement {
        /// Entity index
        index: usize,
        /// Formatted position
        position: String,
    },

    /// The placed bounding box would leave the `i32` coordinate range
    #[error("Entity {index} cannot be placed at {position}: bounds leave the coordinate range")]
    PositionOutOfRange {
        /// Entity index
        index: usize,
        /// Formatted position
        position: String,
    },

    /// No live entity at the index
    #[error("No entity at index {0}")]
    NoEntityAtIndex(usize),

    /// The entity's placeable has been released
    #[error("Object of entity {0} no longer exists")]
    StaleObject(usize),

    /// The factory could not create an object of this category
    #[error("Unknown object type {category:#x} for '{hash}'")]
    UnknownObjectType {
        /// Content hash of the object
        hash: String,
        /// Raw category bits
        category: u32,
    },

    /// Placements or state refer to a hash with no loaded model
    #[error("No model for '{0}'")]
    MissingModel(String),

    /// A placement refers to an action missing from the action table
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// A named object could not be linked to its gameplay data
    #[error("Cannot link '{0}' to its gameplay data")]
    UnresolvedLink(String),

    /// A zone with this name already exists
    #[error("Duplicate zone '{0}'")]
    DuplicateZone(String),

    /// A required top-level section is absent from the saved record
    #[error("Missing section '{0}'")]
    MissingSection(&'static str),

    /// Malformed record
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// One object or placement skipped while loading
#[derive(Debug)]
pub struct LoadFailure {
    /// What was being loaded
    pub context: String,
    /// Why it was skipped
    pub error: WorldError,
}

/// Everything a best-effort load had to skip
#[derive(Debug, Default)]
pub struct LoadReport {
    failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Check whether nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Skipped items in the order they were encountered
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Log and remember a skipped item
    pub fn push(&mut self, context: impl Into<String>, error: impl Into<WorldError>) {
        let context = context.into();
        let error = error.into();
        log::warn!("Skipping {}: {}", context, error);
        self.failures.push(LoadFailure { context, error });
    }
}
