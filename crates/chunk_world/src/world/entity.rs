//! Map entities
//!
//! An entity is what the area stores for each object on the map. Anonymous
//! entities are scenery nobody needs to find again; named entities can be
//! looked up by id. Several named entities may share one placeable (items
//! that look alike but are backed by different gameplay data): the first
//! one owns it, the others alias it through the area's object table.

use crate::foundation::collections::ObjectKey;

/// Stable index of an entity within its area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(usize);

impl EntityIndex {
    /// Wrap a raw index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw index
    pub fn index(self) -> usize {
        self.0
    }
}

/// How an entity refers to its placeable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    /// The entity owns the object and releases it when retired
    Owning(ObjectKey),
    /// Another entity owns the object
    Aliasing(ObjectKey),
}

impl ObjectRef {
    /// Key of the referenced object
    pub fn key(self) -> ObjectKey {
        match self {
            ObjectRef::Owning(key) | ObjectRef::Aliasing(key) => key,
        }
    }

    /// Check whether this reference owns the object
    pub fn is_owning(self) -> bool {
        matches!(self, ObjectRef::Owning(_))
    }
}

/// An object stored on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// Unnamed entity that exclusively owns its object
    Anonymous {
        /// The placeable
        object: ObjectKey,
    },
    /// Uniquely named entity
    Named {
        /// Id, unique within the area
        id: String,
        /// The placeable
        object: ObjectRef,
    },
}

impl Entity {
    /// Create an anonymous entity
    pub fn anonymous(object: ObjectKey) -> Self {
        Entity::Anonymous { object }
    }

    /// Create a named entity owning its object
    pub fn named(id: impl Into<String>, object: ObjectKey) -> Self {
        Entity::Named {
            id: id.into(),
            object: ObjectRef::Owning(object),
        }
    }

    /// Create a named entity sharing an object owned elsewhere
    pub fn alias(id: impl Into<String>, object: ObjectKey) -> Self {
        Entity::Named {
            id: id.into(),
            object: ObjectRef::Aliasing(object),
        }
    }

    /// Key of the placeable
    pub fn object(&self) -> ObjectKey {
        match self {
            Entity::Anonymous { object } => *object,
            Entity::Named { object, .. } => object.key(),
        }
    }

    /// Id of a named entity
    pub fn id(&self) -> Option<&str> {
        match self {
            Entity::Anonymous { .. } => None,
            Entity::Named { id, .. } => Some(id),
        }
    }

    /// Check whether this is a named entity
    pub fn has_name(&self) -> bool {
        self.id().is_some()
    }

    /// Whether the entity owns its placeable; always true for anonymous ones
    pub fn is_unique(&self) -> bool {
        match self {
            Entity::Anonymous { .. } => true,
            Entity::Named { object, .. } => object.is_owning(),
        }
    }
}
