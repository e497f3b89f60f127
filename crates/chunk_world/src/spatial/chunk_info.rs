//! Chunk tree entries

use super::Aabb;
use crate::foundation::math::Coordinate;
use crate::world::{Action, Category, EntityIndex, Placeable};

/// One placement of an entity in the chunk tree
///
/// The bounding box is computed once, when the entry is created, from the
/// position and the object's extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInfo {
    entity: EntityIndex,
    position: Coordinate,
    bounds: Aabb,
    category: Category,
    action: Option<Action>,
}

impl ChunkInfo {
    /// Create an entry placing `entity` (represented by `object`) at `position`
    pub fn new(entity: EntityIndex, position: Coordinate, object: &dyn Placeable) -> Self {
        Self::with_extent(entity, position, object.extent(), object.category())
    }

    /// Create an entry, or `None` if the placed box would leave the `i32` lattice
    pub fn checked_new(entity: EntityIndex, position: Coordinate, object: &dyn Placeable) -> Option<Self> {
        let bounds = object.extent().checked_translated(&position)?;
        Some(Self {
            entity,
            position,
            bounds,
            category: object.category(),
            action: None,
        })
    }

    /// Create an entry from an explicit extent and category
    ///
    /// Corners past the `i32` range are clamped; use [`ChunkInfo::checked_new`]
    /// to reject such placements instead.
    pub fn with_extent(
        entity: EntityIndex,
        position: Coordinate,
        extent: Aabb,
        category: Category,
    ) -> Self {
        Self {
            entity,
            position,
            bounds: extent.translated(&position),
            category,
            action: None,
        }
    }

    /// Attach an action
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// The placed entity
    pub fn entity(&self) -> EntityIndex {
        self.entity
    }

    /// Position of the object's reference origin
    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// World space bounding box
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Minimum corner of the bounding box
    pub fn min(&self) -> Coordinate {
        self.bounds.min
    }

    /// Maximum corner of the bounding box
    pub fn max(&self) -> Coordinate {
        self.bounds.max
    }

    /// Category of the placed object
    pub fn category(&self) -> Category {
        self.category
    }

    /// Check whether an action is attached
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Attached action, if any
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Attached action for modification, if any
    pub fn action_mut(&mut self) -> Option<&mut Action> {
        self.action.as_mut()
    }

    /// Attach an action, returning the existing one if already set
    pub fn set_action(&mut self, hash: impl Into<String>) -> &mut Action {
        self.action.get_or_insert_with(|| Action::new(hash))
    }

    /// Detach the action
    pub fn take_action(&mut self) -> Option<Action> {
        self.action.take()
    }

    /// Check whether `other` places the same entity at the same position
    pub fn matches(&self, other: &ChunkInfo) -> bool {
        self.is_placement(other.entity, &other.position)
    }

    /// Check whether this entry places `entity` at `position`
    pub fn is_placement(&self, entity: EntityIndex, position: &Coordinate) -> bool {
        self.entity == entity && self.position == *position
    }
}
