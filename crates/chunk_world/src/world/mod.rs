//! Map contents
//!
//! Entities, the objects they place on the map, per-placement actions,
//! zones, and the [`Area`] tying them to the chunk tree.

mod action;
mod area;
mod collector;
mod entity;
mod error;
mod object;
mod placeable;
mod zone;

pub use action::Action;
pub use area::Area;
pub use collector::{collect, Collection, CollectorEntry};
pub use entity::{Entity, EntityIndex, ObjectRef};
pub use error::{LoadFailure, LoadReport, WorldError};
pub use object::{SceneryFactory, SceneryObject};
pub use placeable::{Category, Placeable, PlaceableFactory};
pub use zone::{Zone, ZoneType};
