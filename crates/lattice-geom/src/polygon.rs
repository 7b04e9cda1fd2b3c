//! Lane-padded polygons and the edge intersection kernel.
//!
//! A [`Polygon`] is a closed ring of `n` vertices. Its coordinates are stored
//! as two parallel arrays (x and y) of *padded length* `d_len`, the smallest
//! multiple of [`LANES`] that is `>= n`, plus one. Slots past `n` repeat the
//! ring cyclically (`slot[i] == vertex[i % n]`), so:
//!
//! - slot `n` always holds vertex 0 and edge `n - 1` can be read as
//!   `slot[n - 1] -> slot[n]` without wrapping;
//! - the `d_len - 1` stored edges are a multiple of [`LANES`] and every
//!   padding edge duplicates a real edge, so batch processing can never
//!   report an intersection the unpadded ring would not.
//!
//! # Intersection policy
//!
//! Two edges intersect when they cross properly: both parametric positions
//! `t` and `u` lie in the *open* interval `(0, 1)`. Endpoint contacts and
//! parallel edges do not count, which keeps shapes that slide along each
//! other (or touch corner to corner) from blocking. The single exception is
//! a collinear overlap of positive length where both polygons' interiors lie
//! on the same side of the shared line; that is an area overlap, not a
//! touch, and it is reported.
//!
//! The predicate is written so that swapping the two edges produces
//! bit-identical intermediate values (`t` and `u` trade places), which is
//! what keeps `a.has_collision(b) == b.has_collision(a)`.

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::GeomError;

/// Number of edges processed per batch.
pub const LANES: usize = 8;

/// Padded storage length for a polygon with `vertex_count` vertices.
///
/// ```
/// use lattice_geom::polygon::padded_len_for;
/// assert_eq!(padded_len_for(1), 9);
/// assert_eq!(padded_len_for(4), 9);
/// assert_eq!(padded_len_for(8), 9);
/// assert_eq!(padded_len_for(9), 17);
/// ```
#[inline]
pub fn padded_len_for(vertex_count: usize) -> usize {
    vertex_count.div_ceil(LANES) * LANES + 1
}

// ---------------------------------------------------------------------------
// Polygon
// ---------------------------------------------------------------------------

/// A closed polygon with lane-padded vertex storage and a cached [`Aabb`].
///
/// The vertex count is fixed at construction. Transforms apply to every
/// stored slot, padding included, so the cyclic padding invariant holds
/// after any sequence of operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    xs: Vec<f32>,
    ys: Vec<f32>,
    vertex_count: usize,
    aabb: Aabb,
    /// Sign of the signed area: `1.0` counter-clockwise, `-1.0` clockwise,
    /// `0.0` for degenerate rings (points, segments, zero area).
    orientation: f32,
}

impl Polygon {
    /// Build a polygon from its vertex ring. The ring is implicitly closed.
    pub fn new(vertices: &[(f32, f32)]) -> Result<Self, GeomError> {
        let n = vertices.len();
        if n == 0 {
            return Err(GeomError::EmptyPolygon);
        }
        let d_len = padded_len_for(n);
        let mut xs = Vec::with_capacity(d_len);
        let mut ys = Vec::with_capacity(d_len);
        for i in 0..d_len {
            let (x, y) = vertices[i % n];
            xs.push(x);
            ys.push(y);
        }
        let aabb = bounds(&xs[..n], &ys[..n]);
        let orientation = orientation_of(&xs[..n], &ys[..n]);
        Ok(Self {
            xs,
            ys,
            vertex_count: n,
            aabb,
            orientation,
        })
    }

    /// Axis-aligned rectangle with corners `(x1, y1)` and `(x2, y2)`, wound
    /// counter-clockwise.
    ///
    /// # Panics
    ///
    /// Panics if `x1 > x2` or `y1 > y2`.
    pub fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(x1 <= x2 && y1 <= y2, "invalid rect: ({x1}, {y1}) .. ({x2}, {y2})");
        let ring = [(x1, y1), (x2, y1), (x2, y2), (x1, y2)];
        let d_len = padded_len_for(ring.len());
        let (xs, ys): (Vec<f32>, Vec<f32>) = (0..d_len).map(|i| ring[i % ring.len()]).unzip();
        let area = (x2 - x1) * (y2 - y1);
        Self {
            xs,
            ys,
            vertex_count: ring.len(),
            aabb: Aabb { x1, y1, x2, y2 },
            orientation: if area > 0.0 { 1.0 } else { 0.0 },
        }
    }

    /// Number of real (unpadded) vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of stored slots, padding included.
    #[inline]
    pub fn padded_len(&self) -> usize {
        self.xs.len()
    }

    /// Vertex `i` of the ring, `i < vertex_count()`.
    #[inline]
    pub fn vertex(&self, i: usize) -> (f32, f32) {
        assert!(i < self.vertex_count, "vertex index {i} out of range");
        (self.xs[i], self.ys[i])
    }

    /// Iterate the real vertices in ring order.
    pub fn vertices(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.xs[..self.vertex_count]
            .iter()
            .copied()
            .zip(self.ys[..self.vertex_count].iter().copied())
    }

    /// All stored slots, padding included.
    pub fn padded_vertices(&self) -> (&[f32], &[f32]) {
        (&self.xs, &self.ys)
    }

    /// The cached bounding box.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Winding sign: `1.0` counter-clockwise, `-1.0` clockwise, `0.0` degenerate.
    #[inline]
    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    /// Shift every stored vertex by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        for x in &mut self.xs {
            *x += dx;
        }
        for y in &mut self.ys {
            *y += dy;
        }
        self.aabb = self.aabb.translated(dx, dy);
    }

    /// Rotate every stored vertex by `angle` radians about the world origin.
    pub fn rotate_about_origin(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        for (x, y) in self.xs.iter_mut().zip(self.ys.iter_mut()) {
            let (ox, oy) = (*x, *y);
            *x = ox * cos - oy * sin;
            *y = ox * sin + oy * cos;
        }
        self.aabb = bounds(&self.xs[..self.vertex_count], &self.ys[..self.vertex_count]);
    }

    /// Copy another polygon's vertex data into this one.
    ///
    /// # Panics
    ///
    /// Panics if the vertex counts differ; a polygon never changes arity.
    pub fn overwrite(&mut self, other: &Polygon) {
        assert_eq!(
            self.vertex_count, other.vertex_count,
            "polygon overwrite requires equal vertex counts"
        );
        self.xs.copy_from_slice(&other.xs);
        self.ys.copy_from_slice(&other.ys);
        self.aabb = other.aabb;
        self.orientation = other.orientation;
    }

    /// Replace the vertex ring in place.
    ///
    /// # Panics
    ///
    /// Panics if `vertices.len()` differs from the current vertex count.
    pub fn set_vertices(&mut self, vertices: &[(f32, f32)]) {
        let n = self.vertex_count;
        assert_eq!(
            vertices.len(),
            n,
            "polygon set_vertices requires equal vertex counts"
        );
        for i in 0..self.xs.len() {
            let (x, y) = vertices[i % n];
            self.xs[i] = x;
            self.ys[i] = y;
        }
        self.aabb = bounds(&self.xs[..n], &self.ys[..n]);
        self.orientation = orientation_of(&self.xs[..n], &self.ys[..n]);
    }

    /// Returns `true` if any edge of `self` intersects any edge of `other`.
    ///
    /// The polygon with fewer padded slots drives the outer loop over its
    /// real edges; the other polygon's stored edges are tested in batches
    /// of [`LANES`]. Containment without edge contact is not a collision.
    pub fn has_collision(&self, other: &Polygon) -> bool {
        let (outer, inner) = if self.padded_len() <= other.padded_len() {
            (self, other)
        } else {
            (other, self)
        };
        let orientation = outer.orientation * inner.orientation;
        let inner_edges = inner.padded_len() - 1;

        for i in 0..outer.vertex_count {
            let p0 = (outer.xs[i], outer.ys[i]);
            let p1 = (outer.xs[i + 1], outer.ys[i + 1]);

            for base in (0..inner_edges).step_by(LANES) {
                let mut hits = [false; LANES];
                for (lane, hit) in hits.iter_mut().enumerate() {
                    let j = base + lane;
                    let q0 = (inner.xs[j], inner.ys[j]);
                    let q1 = (inner.xs[j + 1], inner.ys[j + 1]);
                    *hit = segments_intersect(p0, p1, q0, q1, orientation);
                }
                if hits.iter().any(|&h| h) {
                    return true;
                }
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Edge kernel
// ---------------------------------------------------------------------------

/// Edge-vs-edge test used by [`Polygon::has_collision`].
///
/// `orientation` is the product of the two owning polygons' winding signs;
/// it only matters for collinear overlaps (see the module docs). Swapping
/// `(p0, p1)` with `(q0, q1)` never changes the result.
#[inline]
pub fn segments_intersect(
    p0: (f32, f32),
    p1: (f32, f32),
    q0: (f32, f32),
    q1: (f32, f32),
    orientation: f32,
) -> bool {
    let (rx, ry) = (p1.0 - p0.0, p1.1 - p0.1);
    let (sx, sy) = (q1.0 - q0.0, q1.1 - q0.1);
    let (qpx, qpy) = (q0.0 - p0.0, q0.1 - p0.1);

    let denom = rx * sy - ry * sx;
    let qp_cross_s = qpx * sy - qpy * sx;
    let qp_cross_r = qpx * ry - qpy * rx;

    if denom != 0.0 {
        let t = qp_cross_s / denom;
        let u = qp_cross_r / denom;
        return t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0;
    }

    // Parallel. Only a same-side collinear overlap counts.
    if qp_cross_r != 0.0 || qp_cross_s != 0.0 {
        return false;
    }
    if orientation * (rx * sx + ry * sy) <= 0.0 {
        return false;
    }
    let along_x = rx.abs() + sx.abs() >= ry.abs() + sy.abs();
    let (a0, a1, b0, b1) = if along_x {
        (p0.0, p1.0, q0.0, q1.0)
    } else {
        (p0.1, p1.1, q0.1, q1.1)
    };
    a0.min(a1).max(b0.min(b1)) < a0.max(a1).min(b0.max(b1))
}

fn bounds(xs: &[f32], ys: &[f32]) -> Aabb {
    let mut bb = Aabb {
        x1: xs[0],
        y1: ys[0],
        x2: xs[0],
        y2: ys[0],
    };
    for (&x, &y) in xs.iter().zip(ys) {
        bb.x1 = bb.x1.min(x);
        bb.y1 = bb.y1.min(y);
        bb.x2 = bb.x2.max(x);
        bb.y2 = bb.y2.max(y);
    }
    bb
}

/// Shoelace sign over the real vertices.
fn orientation_of(xs: &[f32], ys: &[f32]) -> f32 {
    let n = xs.len();
    let mut twice_area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += f64::from(xs[i]) * f64::from(ys[j]) - f64::from(xs[j]) * f64::from(ys[i]);
    }
    if twice_area > 0.0 {
        1.0
    } else if twice_area < 0.0 {
        -1.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f32, cy: f32, half: f32) -> Polygon {
        Polygon::rect(cx - half, cy - half, cx + half, cy + half)
    }

    #[test]
    fn padded_length_is_lane_multiple_plus_one() {
        for n in 1..=40 {
            let d = padded_len_for(n);
            assert!(d > n);
            assert_eq!((d - 1) % LANES, 0);
            assert!(d - 1 - n < LANES);
        }
    }

    #[test]
    fn padding_repeats_ring_cyclically() {
        let ring = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        let p = Polygon::new(&ring).unwrap();
        assert_eq!(p.padded_len(), 9);
        let (xs, ys) = p.padded_vertices();
        for i in 0..p.padded_len() {
            assert_eq!((xs[i], ys[i]), ring[i % 3]);
        }
    }

    #[test]
    fn empty_polygon_is_rejected() {
        assert_eq!(Polygon::new(&[]), Err(GeomError::EmptyPolygon));
    }

    #[test]
    fn orientation_follows_winding() {
        let ccw = Polygon::new(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap();
        let cw = Polygon::new(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0)]).unwrap();
        let seg = Polygon::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(ccw.orientation(), 1.0);
        assert_eq!(cw.orientation(), -1.0);
        assert_eq!(seg.orientation(), 0.0);
    }

    #[test]
    fn overlapping_squares_collide() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(0.5, 0.0, 0.5);
        assert!(a.has_collision(&b));
        assert!(b.has_collision(&a));
    }

    #[test]
    fn offset_squares_with_crossing_edges_collide() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(0.5, 0.25, 0.5);
        assert!(a.has_collision(&b));
        assert!(b.has_collision(&a));
    }

    #[test]
    fn distant_squares_do_not_collide() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(3.0, 0.0, 0.5);
        assert!(!a.has_collision(&b));
    }

    #[test]
    fn side_by_side_touching_squares_do_not_collide() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(1.0, 0.0, 0.5);
        assert!(!a.has_collision(&b));
        assert!(!b.has_collision(&a));
    }

    #[test]
    fn sliding_along_a_wall_does_not_collide() {
        let wall = Polygon::rect(-0.5, -5.0, 0.5, 5.0);
        let unit = Polygon::rect(0.5, 0.2, 1.5, 1.2);
        assert!(!wall.has_collision(&unit));
        assert!(!unit.has_collision(&wall));
    }

    #[test]
    fn corner_touch_does_not_collide() {
        let a = square(0.0, 0.0, 0.5);
        let b = square(1.0, 1.0, 0.5);
        assert!(!a.has_collision(&b));
    }

    #[test]
    fn collinear_rule_respects_mixed_winding() {
        let a = square(0.0, 0.0, 0.5);
        let b_cw = Polygon::new(&[(0.0, -0.5), (0.0, 0.5), (1.0, 0.5), (1.0, -0.5)]).unwrap();
        assert_eq!(b_cw.orientation(), -1.0);
        assert!(a.has_collision(&b_cw));
        assert!(b_cw.has_collision(&a));
    }

    #[test]
    fn contained_polygon_without_edge_contact_is_not_a_collision() {
        let outer = square(0.0, 0.0, 5.0);
        let inner = square(0.0, 0.0, 1.0);
        assert!(!outer.has_collision(&inner));
    }

    #[test]
    fn large_polygon_against_small_polygon() {
        let n = 20;
        let ring: Vec<(f32, f32)> = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                (a.cos() * 2.0, a.sin() * 2.0)
            })
            .collect();
        let circle = Polygon::new(&ring).unwrap();
        assert_eq!(circle.padded_len(), 25);
        let bar = Polygon::rect(1.5, -0.25, 2.5, 0.25);
        assert!(circle.has_collision(&bar));
        assert!(bar.has_collision(&circle));
    }

    #[test]
    fn translate_moves_vertices_and_aabb() {
        let mut p = square(0.0, 0.0, 0.5);
        p.translate(2.0, -1.0);
        assert_eq!(*p.aabb(), Aabb::new(1.5, -1.5, 2.5, -0.5));
        let (xs, ys) = p.padded_vertices();
        for i in 0..p.padded_len() {
            assert_eq!((xs[i], ys[i]), p.vertex(i % 4));
        }
    }

    #[test]
    fn rotate_recomputes_aabb() {
        let mut p = Polygon::rect(1.0, -0.5, 3.0, 0.5);
        p.rotate_about_origin(std::f32::consts::FRAC_PI_2);
        let bb = p.aabb();
        assert!((bb.x1 + 0.5).abs() < 1e-5);
        assert!((bb.x2 - 0.5).abs() < 1e-5);
        assert!((bb.y1 - 1.0).abs() < 1e-5);
        assert!((bb.y2 - 3.0).abs() < 1e-5);
        assert_eq!(p.orientation(), 1.0);
        let (xs, ys) = p.padded_vertices();
        for i in 0..p.padded_len() {
            assert_eq!((xs[i], ys[i]), p.vertex(i % 4));
        }
    }

    #[test]
    fn rotate_keeps_padding_copies_in_step() {
        let ring: Vec<(f32, f32)> = (0..11)
            .map(|i| {
                let a = i as f32 / 11.0 * std::f32::consts::TAU;
                (3.0 + a.cos(), -2.0 + a.sin())
            })
            .collect();
        let mut p = Polygon::new(&ring).unwrap();
        assert_eq!(p.padded_len(), 17);
        p.rotate_about_origin(0.7);
        let (xs, ys) = p.padded_vertices();
        for i in 0..p.padded_len() {
            assert_eq!((xs[i], ys[i]), p.vertex(i % 11));
        }
    }

    #[test]
    fn overwrite_copies_same_arity() {
        let mut a = square(0.0, 0.0, 0.5);
        let b = square(4.0, 4.0, 1.0);
        a.overwrite(&b);
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "equal vertex counts")]
    fn overwrite_rejects_arity_mismatch() {
        let mut a = square(0.0, 0.0, 0.5);
        let tri = Polygon::new(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap();
        a.overwrite(&tri);
    }

    #[test]
    fn set_vertices_refreshes_padding() {
        let mut p = Polygon::new(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap();
        p.set_vertices(&[(5.0, 5.0), (5.0, 6.0), (6.0, 5.0)]);
        let (xs, ys) = p.padded_vertices();
        assert_eq!((xs[3], ys[3]), (5.0, 5.0));
        assert_eq!((xs[8], ys[8]), (6.0, 5.0));
        assert_eq!(p.orientation(), -1.0);
        assert_eq!(*p.aabb(), Aabb::new(5.0, 5.0, 6.0, 6.0));
    }

    #[test]
    fn segment_kernel_excludes_endpoints() {
        // T-junction: endpoint of one edge on the interior of the other.
        assert!(!segments_intersect((0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0), 1.0));
        // Proper crossing.
        assert!(segments_intersect((0.0, 0.0), (2.0, 0.0), (1.0, -1.0), (1.0, 1.0), 1.0));
    }
}
