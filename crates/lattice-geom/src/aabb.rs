//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world coordinates.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. `(x1, y1)` is the top-left corner,
/// which is the key the collision grid files a shape under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum x (left edge).
    pub x1: f32,
    /// Minimum y (top edge).
    pub y1: f32,
    /// Maximum x (right edge).
    pub x2: f32,
    /// Maximum y (bottom edge).
    pub y2: f32,
}

impl Aabb {
    /// Build a box from its corners.
    ///
    /// # Panics
    ///
    /// Panics if `x1 > x2` or `y1 > y2`.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            x1 <= x2 && y1 <= y2,
            "invalid AABB: ({x1}, {y1}) .. ({x2}, {y2})"
        );
        Self { x1, y1, x2, y2 }
    }

    /// The smallest box containing every point yielded by `points`.
    ///
    /// Returns `None` when `points` is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut bb = Self {
            x1: x,
            y1: y,
            x2: x,
            y2: y,
        };
        for (x, y) in iter {
            bb.x1 = bb.x1.min(x);
            bb.y1 = bb.y1.min(y);
            bb.x2 = bb.x2.max(x);
            bb.y2 = bb.y2.max(y);
        }
        Some(bb)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns `true` unless the boxes are disjoint on some axis.
    ///
    /// Touching faces count as overlap; the exact polygon test decides those.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.x2 < other.x1 || other.x2 < self.x1 || self.y2 < other.y1 || other.y2 < self.y1)
    }

    /// The box shifted by `(dx, dy)`.
    #[inline]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
