//! # Chunk World
//!
//! Spatial index and persistence for the objects placed on a game map.
//!
//! ## Features
//!
//! - **Chunk Tree**: Incrementally built octree keyed by integer bounding boxes
//! - **View Culling**: Queries matching the oblique band a map view shows
//! - **Collision Queries**: Bounding box queries filtered by object category
//! - **Deduplicating Saves**: Models shared by many placements are saved once
//!
//! ## Quick Start
//!
//! ```rust
//! use chunk_world::prelude::*;
//!
//! let mut area = Area::new();
//! let tree = SceneryObject::new(
//!     "oak.png",
//!     Aabb::new(Coordinate::new(0, 0, 0), Coordinate::new(3, 3, 12)),
//!     Category::OBJECT,
//! );
//! let oak = area.spawn(Box::new(tree));
//! area.place_entity(oak, Coordinate::new(40, 20, 0)).unwrap();
//!
//! let visible = area.objects_in_view(0, 0, 0, 100, 60);
//! assert_eq!(visible.len(), 1);
//!
//! let mut saved = Record::new();
//! area.put_state(&mut saved);
//!
//! let mut reloaded = Area::new();
//! let report = reloaded.get_state(&saved, &SceneryFactory::new()).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(reloaded.chunks().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod record;
pub mod spatial;
pub mod world;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, WorldConfig},
        foundation::math::Coordinate,
        record::Record,
        spatial::{Aabb, Chunk, ChunkInfo, ViewBand},
        world::{
            Action, Area, Category, Entity, EntityIndex, LoadReport, Placeable,
            PlaceableFactory, SceneryFactory, SceneryObject, WorldError, Zone, ZoneType,
        },
    };
}
