//! The placeable object contract
//!
//! Anything that can be put on a map implements [`Placeable`]. The chunk tree
//! only needs its extent and category; the area's persistence additionally
//! relies on a content hash (equal hash means equal model data) and on the
//! object writing and reading its own model and state.

use crate::record::{Record, RecordError};
use crate::spatial::Aabb;
use std::any::Any;
use std::fmt;

bitflags::bitflags! {
    /// Object categories, used to filter bounding box queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        /// Static scenery and props
        const OBJECT = 1 << 0;
        /// Player and non-player characters
        const CHARACTER = 1 << 1;
        /// Items lying on the map
        const ITEM = 1 << 2;
        /// Matches every category
        const ANY = Self::OBJECT.bits() | Self::CHARACTER.bits() | Self::ITEM.bits();
    }
}

impl Category {
    /// Check whether an object tagged `tag` passes this filter mask
    pub fn accepts(self, tag: Category) -> bool {
        self.contains(Category::ANY) || self.intersects(tag)
    }
}

/// An object that can be placed in an area
pub trait Placeable: Any + fmt::Debug {
    /// Bounding box relative to the object's reference origin
    fn extent(&self) -> Aabb;

    /// Stable hash of the model data; identical models hash identically
    fn content_hash(&self) -> String;

    /// Category tag of the object
    fn category(&self) -> Category;

    /// Write the immutable model (shape, sprite) data
    fn serialize_model(&self, record: &mut Record);

    /// Read model data written by [`Placeable::serialize_model`]
    fn deserialize_model(&mut self, record: &Record) -> Result<(), RecordError>;

    /// Write the mutable state
    fn serialize_state(&self, record: &mut Record);

    /// Read state written by [`Placeable::serialize_state`]
    fn deserialize_state(&mut self, record: &Record) -> Result<(), RecordError>;

    /// Downcast to Any for type-specific access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates empty placeables while an area is being loaded
pub trait PlaceableFactory {
    /// Create an object of the given category, before its model is read
    ///
    /// Returning `None` marks the category as unknown; the object and all
    /// of its placements are skipped.
    fn create(&self, category: Category, hash: &str) -> Option<Box<dyn Placeable>>;

    /// Link a freshly loaded named object to gameplay data registered under `id`
    ///
    /// Returns `false` if no such data exists. The object stays on the map.
    fn bind_named(&self, _id: &str, _object: &mut dyn Placeable) -> bool {
        true
    }
}

impl<F> PlaceableFactory for F
where
    F: Fn(Category, &str) -> Option<Box<dyn Placeable>>,
{
    fn create(&self, category: Category, hash: &str) -> Option<Box<dyn Placeable>> {
        self(category, hash)
    }
}
