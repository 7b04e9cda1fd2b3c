//! Uniform spatial grid rebuilt every tick.
//!
//! The grid is `len x len` cells laid over the bounding box of every active
//! shape's top-left corner. A shape is filed under the single cell holding
//! the top-left corner of its [`Aabb`]; large shapes are not inserted into
//! every cell they cover. Instead the grid remembers the widest and tallest
//! shape of the tick (`max_w`, `max_h`): two shapes can only overlap if their
//! top-left corners are within `max_w` horizontally and `max_h` vertically,
//! so a bounded neighbourhood of cells always contains every partner.
//!
//! Cells keep insertion order. Coordinates outside the grid clamp to the
//! border cells, which keeps the world-to-cell mapping monotonic.

use lattice_geom::{Aabb, PolygonHandle};

// ---------------------------------------------------------------------------
// CollisionCandidate
// ---------------------------------------------------------------------------

/// A non-owning reference to one shape filed in the grid.
///
/// The box is copied from the polygon at insertion time so the broad phase
/// never touches the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionCandidate {
    /// Index of the owning entity.
    pub owner: usize,
    /// Index of the shape within the owner's current or desired set.
    pub shape: usize,
    /// Arena handle of the polygon.
    pub handle: PolygonHandle,
    /// Bounding box of the polygon when it was filed.
    pub aabb: Aabb,
}

// ---------------------------------------------------------------------------
// CollisionGrid
// ---------------------------------------------------------------------------

/// Fixed-resolution grid of candidate lists.
#[derive(Debug)]
pub struct CollisionGrid {
    len: usize,
    cells: Vec<Vec<CollisionCandidate>>,
    origin_x: f32,
    origin_y: f32,
    cell_w: f32,
    cell_h: f32,
    max_w: f32,
    max_h: f32,
}

impl CollisionGrid {
    /// Create an empty `len x len` grid with unit cells at the origin.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "grid length must be at least 1");
        Self {
            len,
            cells: vec![Vec::new(); len * len],
            origin_x: 0.0,
            origin_y: 0.0,
            cell_w: 1.0,
            cell_h: 1.0,
            max_w: 0.0,
            max_h: 0.0,
        }
    }

    /// Empty every cell, keeping their allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Lay the grid over `corners` (the box spanned by every active shape's
    /// top-left corner) for a tick whose largest shape is `max_w x max_h`.
    ///
    /// A cell is never narrower than the widest shape nor shorter than the
    /// tallest one, so neighbourhood scans stay a few cells wide.
    pub fn configure(&mut self, corners: Aabb, max_w: f32, max_h: f32) {
        let len = self.len as f32;
        let span = |extent: f32, max: f32| {
            let size = (extent / len).max(max);
            if size > 0.0 && size.is_finite() {
                size
            } else {
                1.0
            }
        };
        self.origin_x = corners.x1;
        self.origin_y = corners.y1;
        self.cell_w = span(corners.width(), max_w);
        self.cell_h = span(corners.height(), max_h);
        self.max_w = max_w;
        self.max_h = max_h;
    }

    /// Cells per axis.
    #[inline]
    pub fn resolution(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_w, self.cell_h)
    }

    /// Width of the widest shape this tick.
    #[inline]
    pub fn max_w(&self) -> f32 {
        self.max_w
    }

    /// Height of the tallest shape this tick.
    #[inline]
    pub fn max_h(&self) -> f32 {
        self.max_h
    }

    /// Column holding world coordinate `x`, clamped to `[0, len)`.
    #[inline]
    pub fn x_to_grid_x(&self, x: f32) -> usize {
        self.to_cell(x, self.origin_x, self.cell_w)
    }

    /// Row holding world coordinate `y`, clamped to `[0, len)`.
    #[inline]
    pub fn y_to_grid_y(&self, y: f32) -> usize {
        self.to_cell(y, self.origin_y, self.cell_h)
    }

    #[inline]
    fn to_cell(&self, v: f32, origin: f32, size: f32) -> usize {
        let idx = ((v - origin) / size).floor();
        if idx <= 0.0 || idx.is_nan() {
            0
        } else {
            (idx as usize).min(self.len - 1)
        }
    }

    /// The cell a box is filed under: the one holding its top-left corner.
    #[inline]
    pub fn cell_of(&self, aabb: &Aabb) -> (usize, usize) {
        (self.x_to_grid_x(aabb.x1), self.y_to_grid_y(aabb.y1))
    }

    /// Candidates in cell `(x, y)`, in insertion order.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> &[CollisionCandidate] {
        &self.cells[y * self.len + x]
    }

    /// Append a candidate to cell `(x, y)`.
    pub fn insert(&mut self, x: usize, y: usize, candidate: CollisionCandidate) {
        tracing::trace!(
            owner = candidate.owner,
            shape = candidate.shape,
            x,
            y,
            "grid insert"
        );
        self.cells[y * self.len + x].push(candidate);
    }

    /// Remove the first candidate in cell `(x, y)` owned by entity `idx`.
    ///
    /// Returns the removed candidate, or `None` if the cell held none.
    pub fn remove_one_with_idx(
        &mut self,
        x: usize,
        y: usize,
        idx: usize,
    ) -> Option<CollisionCandidate> {
        let cell = &mut self.cells[y * self.len + x];
        let pos = cell.iter().position(|c| c.owner == idx)?;
        tracing::trace!(owner = idx, x, y, "grid remove");
        Some(cell.remove(pos))
    }

    /// Total number of candidates across all cells.
    pub fn candidate_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
