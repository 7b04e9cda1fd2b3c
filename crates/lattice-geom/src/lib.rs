//! Lattice Geom -- polygon geometry kernel for the Lattice collision engine.
//!
//! This crate provides the leaf geometry the collision engine is built on:
//!
//! - [`Aabb`]: axis-aligned bounding boxes with an O(1) overlap reject.
//! - [`Polygon`]: closed vertex rings stored with lane padding so that edge
//!   batches can be processed eight at a time, plus the edge-vs-edge
//!   intersection test used by the narrow phase.
//! - [`PolygonArena`]: an explicitly owned arena that buckets polygons by
//!   padded length and hands out generational [`PolygonHandle`]s.
//!
//! # Quick Start
//!
//! ```
//! use lattice_geom::prelude::*;
//!
//! let mut arena = PolygonArena::new(64);
//! let a = arena.alloc(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]).unwrap();
//! let b = arena.alloc(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]).unwrap();
//!
//! let pa = arena.get(a).unwrap();
//! let pb = arena.get(b).unwrap();
//! assert!(pa.aabb().overlaps(pb.aabb()));
//! assert!(pa.has_collision(pb));
//! ```

#![deny(unsafe_code)]

pub mod aabb;
pub mod arena;
pub mod polygon;

pub use aabb::Aabb;
pub use arena::{PolygonArena, PolygonHandle};
pub use polygon::Polygon;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by geometry operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeomError {
    /// A polygon was constructed from an empty vertex list.
    #[error("polygon requires at least one vertex")]
    EmptyPolygon,

    /// The arena has no free slot left in the size class for this polygon.
    #[error("polygon arena exhausted for padded length {padded_len} (capacity {capacity})")]
    ArenaExhausted {
        /// Padded length (size class) that ran out of slots.
        padded_len: usize,
        /// Slot capacity of every size class.
        capacity: usize,
    },

    /// The handle was freed (stale generation) or never allocated.
    #[error("polygon handle {0:?} is stale or was never allocated")]
    StaleHandle(PolygonHandle),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::aabb::Aabb;
    pub use crate::arena::{PolygonArena, PolygonHandle};
    pub use crate::polygon::{padded_len_for, Polygon, LANES};
    pub use crate::GeomError;
}
