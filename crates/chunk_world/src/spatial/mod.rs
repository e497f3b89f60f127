//! Spatial partitioning data structures
//!
//! Provides the chunk tree used to index map objects by their bounding
//! boxes, for collision queries and render culling.

mod bounds;
mod chunk;
mod chunk_info;

pub use bounds::{aabb_overlap, view_overlap, Aabb, ViewBand};
pub use chunk::{Chunk, Entries};
pub use chunk_info::ChunkInfo;
