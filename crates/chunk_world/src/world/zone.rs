//! Named regions of an area
//!
//! Zones are plain boxes kept beside the chunk tree. Meta zones mark places
//! scripts refer to by name (spawn points, trigger regions); render zones
//! tell the renderer which parts of the map to draw together.

use crate::foundation::math::Coordinate;
use crate::record::{Record, RecordError};
use crate::spatial::Aabb;

bitflags::bitflags! {
    /// Zone type bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ZoneType: u32 {
        /// Zone can be looked up by name
        const META = 1 << 0;
        /// Zone groups what is drawn together
        const RENDER = 1 << 1;
    }
}

/// A named, typed region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    name: String,
    kind: ZoneType,
    bounds: Aabb,
}

impl Zone {
    /// Create a zone
    pub fn new(name: impl Into<String>, kind: ZoneType, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            kind,
            bounds,
        }
    }

    /// Zone name, unique within its area
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type bits
    pub fn kind(&self) -> ZoneType {
        self.kind
    }

    /// Region covered
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Check whether the zone has all of `kind`'s bits and covers `point`
    pub fn matches(&self, point: &Coordinate, kind: ZoneType) -> bool {
        self.kind.contains(kind) && self.bounds.contains_point(point)
    }

    /// Write type and bounds; the name is the key the caller files this under
    pub fn put_state(&self, record: &mut Record) {
        record.put_uint32("type", self.kind.bits());
        self.bounds.put_corners(record);
    }

    /// Read a zone written by [`Zone::put_state`]
    pub fn from_record(name: impl Into<String>, record: &Record) -> Result<Self, RecordError> {
        let kind = ZoneType::from_bits_retain(record.get_uint32("type")?);
        Ok(Self::new(name, kind, Aabb::read_corners(record)?))
    }
}
