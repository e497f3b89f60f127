//! Chunk tree spatial partitioning structure
//!
//! An octree-like structure that keeps track of the location of map objects
//! in 3D space. Unlike most octrees it is built incrementally: objects are
//! added and removed one at a time as the game world changes.
//!
//! Every entry is stored by its AABB in the deepest chunk whose volume fully
//! contains it. A leaf collects entries until it holds more than
//! `max_entries_per_chunk`, then picks split planes through its center and
//! pushes every entry that fits a single octant down into that child.
//! Entries straddling a split plane stay with the parent. Children are only
//! allocated for octants that actually receive entries.
//!
//! The root grows to admit anything placed outside it. It never shrinks, and
//! emptied chunks are kept until [`Chunk::clear`].

use super::{Aabb, ChunkInfo, ViewBand};
use crate::config::WorldConfig;
use crate::foundation::math::{fmt_coordinate, Coordinate};
use crate::world::{Category, EntityIndex, Placeable};
use std::fmt::Write;

/// Single node in the chunk tree
#[derive(Debug, Clone)]
pub struct Chunk {
    /// World-space bounds of this chunk
    bounds: Aabb,

    /// Split planes, set once the chunk has been split
    split: Option<Coordinate>,

    /// Child chunks (8 octants), allocated on first use
    children: [Option<Box<Chunk>>; 8],

    /// Entries that belong to this chunk rather than to a child
    objects: Vec<ChunkInfo>,

    /// Configuration
    config: WorldConfig,
}

/// Bitmask with one bit per octant
type OctantMask = u8;

/// Find the octants of a chunk split at `split` that overlap the given bbox
///
/// Octant layout: bit 0 selects +X, bit 1 selects +Y, bit 2 selects +Z.
/// The lower half of an axis is `[min, split - 1]`, the upper `[split, max]`.
fn find_chunks(split: &Coordinate, bounds: &Aabb) -> OctantMask {
    let mut halves = [[false; 2]; 3];
    for (axis, half) in halves.iter_mut().enumerate() {
        half[0] = bounds.min[axis] < split[axis];
        half[1] = bounds.max[axis] >= split[axis];
    }

    let mut mask = 0;
    for octant in 0..8 {
        let overlaps = (0..3).all(|axis| halves[axis][(octant >> axis) & 1]);
        if overlaps {
            mask |= 1 << octant;
        }
    }
    mask
}

/// The octant that alone overlaps, if exactly one does
fn single_octant(mask: OctantMask) -> Option<usize> {
    (mask.count_ones() == 1).then(|| mask.trailing_zeros() as usize)
}

impl Chunk {
    /// Create an empty root chunk at the origin
    pub fn new(config: WorldConfig) -> Self {
        Self::with_bounds(Aabb::default(), config)
    }

    /// Create an empty chunk covering the given bounds
    ///
    /// Limits below 1 in `config` are raised to 1.
    pub fn with_bounds(bounds: Aabb, config: WorldConfig) -> Self {
        Self {
            bounds,
            split: None,
            children: Default::default(),
            objects: Vec::new(),
            config: config.clamped(),
        }
    }

    /// Check if this chunk is a leaf (has not been split)
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Check whether this chunk or any descendant holds entries
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.child_chunks().all(Chunk::is_empty)
    }

    /// Count total entries in this chunk and all children
    pub fn len(&self) -> usize {
        self.objects.len() + self.child_chunks().map(Chunk::len).sum::<usize>()
    }

    /// Check whether the chunk is large enough to be split
    pub fn can_split(&self) -> bool {
        (0..3).any(|axis| self.splits_axis(axis))
    }

    /// World-space bounds of this chunk
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Minimum corner of the chunk
    pub fn min(&self) -> Coordinate {
        self.bounds.min
    }

    /// Maximum corner of the chunk
    pub fn max(&self) -> Coordinate {
        self.bounds.max
    }

    /// Extent of the chunk in x direction
    pub fn length(&self) -> i64 {
        i64::from(self.bounds.max.x) - i64::from(self.bounds.min.x)
    }

    /// Extent of the chunk in y direction
    pub fn width(&self) -> i64 {
        i64::from(self.bounds.max.y) - i64::from(self.bounds.min.y)
    }

    /// Extent of the chunk in z direction
    pub fn height(&self) -> i64 {
        i64::from(self.bounds.max.z) - i64::from(self.bounds.min.z)
    }

    /// Split planes, if the chunk has been split
    pub fn split_point(&self) -> Option<Coordinate> {
        self.split
    }

    /// Entries held directly by this chunk
    pub fn entries(&self) -> &[ChunkInfo] {
        &self.objects
    }

    /// Allocated children with their octant index
    pub fn children(&self) -> impl Iterator<Item = (usize, &Chunk)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(octant, child)| child.as_deref().map(|c| (octant, c)))
    }

    /// Depth of the deepest chunk below this one (a leaf has depth 0)
    pub fn depth(&self) -> usize {
        self.child_chunks().map(|c| c.depth() + 1).max().unwrap_or(0)
    }

    /// Iterate over every entry in the tree, parents before children
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            stack: self.child_chunks().rev().collect(),
            current: self.objects.iter(),
        }
    }

    /// Add object at given coordinates
    ///
    /// Returns the new entry, so the caller can attach an action to it.
    pub fn add(
        &mut self,
        entity: EntityIndex,
        position: Coordinate,
        object: &dyn Placeable,
    ) -> &mut ChunkInfo {
        self.add_info(ChunkInfo::new(entity, position, object))
    }

    /// Add a pre-built entry
    pub fn add_info(&mut self, info: ChunkInfo) -> &mut ChunkInfo {
        if !self.bounds.contains(info.bounds()) {
            let enlarged = self.bounds.union(info.bounds());
            self.grow(enlarged);
        }
        self.insert(info)
    }

    /// Check if given object is present at given position
    pub fn exists(&self, entity: EntityIndex, position: Coordinate, object: &dyn Placeable) -> bool {
        self.exists_info(&ChunkInfo::new(entity, position, object))
    }

    /// Check if an entry placing the same entity at the same position is present
    pub fn exists_info(&self, info: &ChunkInfo) -> bool {
        if self.objects.iter().any(|o| o.matches(info)) {
            return true;
        }

        let Some(split) = self.split else {
            return false;
        };

        single_octant(find_chunks(&split, info.bounds()))
            .and_then(|octant| self.children[octant].as_deref())
            .is_some_and(|child| child.exists_info(info))
    }

    /// Remove object at given coordinates
    ///
    /// Returns the entity that was placed there, or `None` if there was no
    /// such placement. The entity itself is untouched.
    pub fn remove(
        &mut self,
        entity: EntityIndex,
        position: Coordinate,
        object: &dyn Placeable,
    ) -> Option<EntityIndex> {
        self.remove_info(&ChunkInfo::new(entity, position, object))
    }

    /// Remove the entry matching `info`, returning its entity
    pub fn remove_info(&mut self, info: &ChunkInfo) -> Option<EntityIndex> {
        self.take_info(info).map(|removed| removed.entity())
    }

    /// Remove the entry matching `info` and hand it back, action included
    pub fn take_info(&mut self, info: &ChunkInfo) -> Option<ChunkInfo> {
        if let Some(index) = self.objects.iter().position(|o| o.matches(info)) {
            return Some(self.objects.remove(index));
        }

        let split = self.split?;
        let octant = single_octant(find_chunks(&split, info.bounds()))?;
        self.children[octant].as_deref_mut()?.take_info(info)
    }

    /// Remove every placement of an entity, returning how many were removed
    pub fn remove_entity(&mut self, entity: EntityIndex) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| o.entity() != entity);
        let removed = before - self.objects.len();

        removed
            + self
                .children
                .iter_mut()
                .flatten()
                .map(|child| child.remove_entity(entity))
                .sum::<usize>()
    }

    /// Remove all objects and children from chunk
    ///
    /// The bounds are kept.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.children = Default::default();
        self.split = None;
    }

    /// Collect the objects visible in a map view
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - origin of the view
    /// * `length` - extent of the view along x
    /// * `width` - extent of the view along `y - z`
    pub fn objects_in_view(&self, x: i32, y: i32, z: i32, length: i32, width: i32) -> Vec<&ChunkInfo> {
        self.objects_in_band(&ViewBand::new(x, y, z, length, width))
    }

    /// Collect the objects overlapping a view band
    pub fn objects_in_band(&self, band: &ViewBand) -> Vec<&ChunkInfo> {
        let mut results = Vec::new();
        self.collect_in_band(band, &mut results);
        results
    }

    /// Collect the objects of the given categories overlapping a bounding box
    pub fn objects_in_bbox(&self, min: &Coordinate, max: &Coordinate, category: Category) -> Vec<&ChunkInfo> {
        let query = Aabb { min: *min, max: *max };
        let mut results = Vec::new();
        self.collect_in_bbox(&query, category, &mut results);
        results
    }

    /// Render the tree in graphviz `.dot` format
    pub fn debug_dot(&self) -> String {
        let mut graph = String::from("digraph chunks {\n    node [shape=box];\n");
        let mut next_id = 0;
        self.write_dot(&mut graph, None, &mut next_id);
        graph.push_str("}\n");
        graph
    }

    fn write_dot(&self, graph: &mut String, parent: Option<usize>, next_id: &mut usize) {
        let id = *next_id;
        *next_id += 1;

        let _ = writeln!(
            graph,
            "    c{id} [label=\"{}\\n{} - {}\\n{} entries\"];",
            if self.is_leaf() { "leaf" } else { "split" },
            fmt_coordinate(&self.bounds.min),
            fmt_coordinate(&self.bounds.max),
            self.objects.len()
        );
        if let Some(parent) = parent {
            let _ = writeln!(graph, "    c{parent} -> c{id};");
        }

        for child in self.child_chunks() {
            child.write_dot(graph, Some(id), next_id);
        }
    }

    fn child_chunks(&self) -> impl DoubleEndedIterator<Item = &Chunk> {
        self.children.iter().filter_map(|c| c.as_deref())
    }

    /// Whether both halves of an axis would stay above the minimum extent
    fn splits_axis(&self, axis: usize) -> bool {
        self.bounds.size(axis) >= 2 * i64::from(self.config.min_chunk_extent)
    }

    /// Split planes through the center; unsplittable axes get a plane past `max`
    fn split_planes(&self) -> Coordinate {
        Coordinate::from_fn(|axis, _| {
            let min = i64::from(self.bounds.min[axis]);
            let plane = if self.splits_axis(axis) {
                min + self.bounds.size(axis) / 2
            } else {
                i64::from(self.bounds.max[axis]) + 1
            };
            i32::try_from(plane).unwrap_or(i32::MAX)
        })
    }

    /// World-space bounds of an octant
    fn octant_bounds(&self, split: &Coordinate, octant: usize) -> Aabb {
        let mut min = self.bounds.min;
        let mut max = self.bounds.max;
        for axis in 0..3 {
            if octant & (1 << axis) != 0 {
                min[axis] = split[axis];
            } else {
                max[axis] = split[axis] - 1;
            }
        }
        Aabb { min, max }
    }

    /// Calculate the split planes and push entries down into children
    fn split(&mut self) {
        if self.split.is_some() || !self.can_split() {
            return;
        }

        let split = self.split_planes();
        log::trace!("Splitting chunk {} at {}", self.bounds, fmt_coordinate(&split));
        self.split = Some(split);

        for info in std::mem::take(&mut self.objects) {
            self.insert(info);
        }
    }

    /// Insert an entry already known to lie within this chunk
    fn insert(&mut self, info: ChunkInfo) -> &mut ChunkInfo {
        debug_assert!(self.bounds.contains(info.bounds()));

        if let Some(split) = self.split {
            if let Some(octant) = single_octant(find_chunks(&split, info.bounds())) {
                let region = self.octant_bounds(&split, octant);
                let config = self.config;
                let child = self.children[octant]
                    .get_or_insert_with(|| Box::new(Chunk::with_bounds(region, config)));
                return child.insert(info);
            }
        } else if self.objects.len() >= self.config.max_entries_per_chunk && self.can_split() {
            self.split();
            return self.insert(info);
        }

        let index = self.objects.len();
        self.objects.push(info);
        &mut self.objects[index]
    }

    /// Enlarge the chunk; a split chunk is rebuilt around its new bounds
    fn grow(&mut self, enlarged: Aabb) {
        log::debug!("Growing chunk {} to {}", self.bounds, enlarged);

        let entries = if self.is_leaf() {
            Vec::new()
        } else {
            let mut entries = Vec::with_capacity(self.len());
            self.drain_into(&mut entries);
            self.clear();
            entries
        };

        self.bounds = enlarged;
        for info in entries {
            self.insert(info);
        }
    }

    fn drain_into(&mut self, out: &mut Vec<ChunkInfo>) {
        out.append(&mut self.objects);
        for child in self.children.iter_mut().flatten() {
            child.drain_into(out);
        }
    }

    fn collect_in_band<'a>(&'a self, band: &ViewBand, results: &mut Vec<&'a ChunkInfo>) {
        if !band.overlaps(&self.bounds) {
            return;
        }

        results.extend(self.objects.iter().filter(|o| band.overlaps(o.bounds())));

        for child in self.child_chunks() {
            child.collect_in_band(band, results);
        }
    }

    fn collect_in_bbox<'a>(&'a self, query: &Aabb, category: Category, results: &mut Vec<&'a ChunkInfo>) {
        if !self.bounds.intersects(query) {
            return;
        }

        results.extend(
            self.objects
                .iter()
                .filter(|o| category.accepts(o.category()) && o.bounds().intersects(query)),
        );

        for child in self.child_chunks() {
            child.collect_in_bbox(query, category, results);
        }
    }
}

/// Depth-first iterator over all entries of a chunk tree
pub struct Entries<'a> {
    stack: Vec<&'a Chunk>,
    current: std::slice::Iter<'a, ChunkInfo>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a ChunkInfo;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(info) = self.current.next() {
                return Some(info);
            }

            let chunk = self.stack.pop()?;
            self.current = chunk.objects.iter();
            self.stack.extend(chunk.child_chunks().rev());
        }
    }
}

impl<'a> IntoIterator for &'a Chunk {
    type Item = &'a ChunkInfo;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
