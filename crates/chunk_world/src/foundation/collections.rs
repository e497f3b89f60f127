//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a placeable held in an area's object table
    ///
    /// Keys outlive the value they point at: once the object is released,
    /// lookups through a stale key return `None` instead of aliasing a reused slot.
    pub struct ObjectKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<ObjectKey, T>;
