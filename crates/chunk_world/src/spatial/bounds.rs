//! Bounding volume tests
//!
//! Two overlap tests drive the chunk tree: a plain closed-interval AABB test
//! used for collision queries, and a view band test used for render culling.
//! The renderer draws the world in an oblique projection where height and
//! depth share the vertical screen axis, so the visible region is a band in
//! `x` and in `y - z`, not a box.

use crate::foundation::math::{fmt_coordinate, max_corner, min_corner, Coordinate};
use crate::record::{Record, RecordError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-Aligned Bounding Box on the integer lattice
///
/// Both corners are inclusive, so a box with `min == max` covers one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Coordinate,
    /// Maximum corner of the bounding box
    pub max: Coordinate,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Coordinate, max: Coordinate) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "inverted AABB {} - {}",
            fmt_coordinate(&min),
            fmt_coordinate(&max)
        );
        Self { min, max }
    }

    /// Create an AABB, or `None` if `min` exceeds `max` on any axis
    pub fn try_new(min: Coordinate, max: Coordinate) -> Option<Self> {
        (min.x <= max.x && min.y <= max.y && min.z <= max.z).then_some(Self { min, max })
    }

    /// Create a degenerate AABB covering a single point
    pub fn point(p: Coordinate) -> Self {
        Self { min: p, max: p }
    }

    /// Write the corners as `min` and `max` fields
    pub fn put_corners(&self, record: &mut Record) {
        record.put_coordinate("min", &self.min);
        record.put_coordinate("max", &self.max);
    }

    /// Read a box written by [`Aabb::put_corners`]
    ///
    /// An inverted box is rejected rather than stored.
    pub fn read_corners(record: &Record) -> Result<Self, RecordError> {
        let min = record.get_coordinate("min")?;
        let max = record.get_coordinate("max")?;
        Self::try_new(min, max).ok_or_else(|| RecordError::InvalidValue {
            key: "max".to_string(),
            reason: format!("{} lies below min {}", fmt_coordinate(&max), fmt_coordinate(&min)),
        })
    }

    /// Shift the box by an offset, clamping at the lattice edge
    pub fn translated(&self, offset: &Coordinate) -> Self {
        Self {
            min: self.min.zip_map(offset, i32::saturating_add),
            max: self.max.zip_map(offset, i32::saturating_add),
        }
    }

    /// Shift the box by an offset, or `None` if a corner leaves the `i32` range
    pub fn checked_translated(&self, offset: &Coordinate) -> Option<Self> {
        Some(Self {
            min: checked_offset(&self.min, offset)?,
            max: checked_offset(&self.max, offset)?,
        })
    }

    /// Number of lattice points covered along an axis (0 = x, 1 = y, 2 = z)
    pub fn size(&self, axis: usize) -> i64 {
        i64::from(self.max[axis]) - i64::from(self.min[axis]) + 1
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: &Coordinate) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB fully contains another AABB
    pub fn contains(&self, other: &Aabb) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Aabb) -> bool {
        aabb_overlap(&self.min, &self.max, &other.min, &other.max)
    }

    /// Smallest AABB enclosing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: min_corner(&self.min, &other.min),
            max: max_corner(&self.max, &other.max),
        }
    }
}

fn checked_offset(point: &Coordinate, offset: &Coordinate) -> Option<Coordinate> {
    Some(Coordinate::new(
        point.x.checked_add(offset.x)?,
        point.y.checked_add(offset.y)?,
        point.z.checked_add(offset.z)?,
    ))
}

impl Default for Aabb {
    fn default() -> Self {
        Self::point(Coordinate::zeros())
    }
}

impl fmt::Display for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", fmt_coordinate(&self.min), fmt_coordinate(&self.max))
    }
}

/// Check whether two axis aligned bounding boxes overlap
///
/// Intervals are closed: boxes that merely touch count as overlapping.
pub fn aabb_overlap(
    a_min: &Coordinate,
    a_max: &Coordinate,
    b_min: &Coordinate,
    b_max: &Coordinate,
) -> bool {
    a_min.x <= b_max.x && a_max.x >= b_min.x &&
    a_min.y <= b_max.y && a_max.y >= b_min.y &&
    a_min.z <= b_max.z && a_max.z >= b_min.z
}

/// Check whether a view band overlaps an axis aligned bounding box
///
/// The box's `y - z` values span `[min.y - max.z, max.y - min.z]`. Testing
/// that interval against `[min_yz, max_yz]` is conservative: boxes near the
/// corners of the band may be reported visible, visible boxes never missed.
pub fn view_overlap(
    min_x: i32,
    max_x: i32,
    min_yz: i32,
    max_yz: i32,
    min: &Coordinate,
    max: &Coordinate,
) -> bool {
    if min.x > max_x || max.x < min_x {
        return false;
    }

    let box_min_yz = i64::from(min.y) - i64::from(max.z);
    let box_max_yz = i64::from(max.y) - i64::from(min.z);

    box_min_yz <= i64::from(max_yz) && box_max_yz >= i64::from(min_yz)
}

/// The visible region of a map view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewBand {
    /// Left edge of the view
    pub min_x: i32,
    /// Right edge of the view
    pub max_x: i32,
    /// Smallest visible `y - z`
    pub min_yz: i32,
    /// Largest visible `y - z`
    pub max_yz: i32,
}

impl ViewBand {
    /// Band seen by a view at origin `(x, y, z)` spanning `length` by `width`
    ///
    /// Edges past the `i32` range are clamped.
    pub fn new(x: i32, y: i32, z: i32, length: i32, width: i32) -> Self {
        let min_yz = y.saturating_sub(z);
        Self {
            min_x: x,
            max_x: x.saturating_add(length),
            min_yz,
            max_yz: min_yz.saturating_add(width),
        }
    }

    /// Check whether the band overlaps a bounding box
    pub fn overlaps(&self, bounds: &Aabb) -> bool {
        view_overlap(self.min_x, self.max_x, self.min_yz, self.max_yz, &bounds.min, &bounds.max)
    }
}
