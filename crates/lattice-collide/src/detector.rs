//! Collision detection: grid build, parallel pair search, merge.
//!
//! [`CollisionEngine`] owns the tick-scoped scratch state (grid, active shape
//! list) and the worker pool. Each tick the game loop binds its motion
//! records and polygon arena with [`CollisionEngine::set_motion_source`],
//! which yields a [`TickSession`]; [`TickSession::find_collisions`] then:
//!
//! 1. scans every active entity (`StayAtCurrentPos` or `GoToDesiredPos`) for
//!    the bounding box of shape top-left corners and the largest shape size;
//! 2. lays the grid over that box;
//! 3. files every authoritative shape in the grid and in the flat active list;
//! 4. splits the active list into contiguous ranges, one per pool thread plus
//!    the caller, and runs [`find_and_add_collisions_gt`] over each range in
//!    parallel, each range writing to its own output list;
//! 5. concatenates the outputs.
//!
//! # Exactly-once pairs
//!
//! [`find_and_add_collisions_gt`] only looks *right*: cells with a column
//! index below the candidate's are never scanned, and inside the candidate's
//! own column a partner must have a box `x1` at least as large as the
//! candidate's, with ties broken by owner index. For any two overlapping
//! shapes exactly one of them passes these rules, so each pair is emitted
//! once without shared state between workers and without a dedup pass.
//! The only exception is entities with several shapes in the grid, where two
//! shape pairs can name the same entity pair; that case is folded in the
//! merge.

use std::ops::Range;

use lattice_geom::{Aabb, PolygonArena};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CollisionConfig;
use crate::grid::{CollisionCandidate, CollisionGrid};
use crate::intent::MoveIntent;
use crate::motion::{EntityMotionRecord, ShapeSet};
use crate::pool::{partition_ranges, WorkerPool};
use crate::EngineError;

// ---------------------------------------------------------------------------
// CollisionPair
// ---------------------------------------------------------------------------

/// Two entities whose shapes overlapped this tick. Unordered in meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionPair {
    /// First entity index.
    pub entity_a: usize,
    /// Second entity index.
    pub entity_b: usize,
}

impl CollisionPair {
    /// # Panics
    ///
    /// Panics if `entity_a == entity_b`; an entity never collides with itself.
    #[inline]
    pub fn new(entity_a: usize, entity_b: usize) -> Self {
        assert_ne!(entity_a, entity_b, "collision pair with itself");
        Self { entity_a, entity_b }
    }

    /// The same pair with the smaller index first.
    #[inline]
    pub fn canonical(self) -> Self {
        Self {
            entity_a: self.entity_a.min(self.entity_b),
            entity_b: self.entity_a.max(self.entity_b),
        }
    }

    /// Returns `true` if `idx` is one of the two entities.
    #[inline]
    pub fn involves(self, idx: usize) -> bool {
        self.entity_a == idx || self.entity_b == idx
    }
}

// ---------------------------------------------------------------------------
// ActiveShape
// ---------------------------------------------------------------------------

/// An entry of the active list: a filed candidate and the cell it sits in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveShape {
    pub candidate: CollisionCandidate,
    pub cell_x: usize,
    pub cell_y: usize,
}

// ---------------------------------------------------------------------------
// CollisionEngine
// ---------------------------------------------------------------------------

/// Owns the grid, the active list and the worker pool across ticks.
#[derive(Debug)]
pub struct CollisionEngine {
    pub(crate) config: CollisionConfig,
    pub(crate) grid: CollisionGrid,
    pub(crate) active: Vec<ActiveShape>,
    pub(crate) pool: WorkerPool,
    pub(crate) multi_shape: bool,
}

impl CollisionEngine {
    /// Validate `config` and spawn the worker pool.
    pub fn new(config: CollisionConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = WorkerPool::new(config.resolved_worker_threads())?;
        debug!(
            grid_len = config.grid_len,
            workers = pool.size(),
            "collision engine created"
        );
        Ok(Self {
            grid: CollisionGrid::new(config.grid_len),
            active: Vec::new(),
            pool,
            multi_shape: false,
            config,
        })
    }

    /// Drop all tick-scoped state.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.active.clear();
        self.multi_shape = false;
    }

    /// Bind this tick's motion records and polygon arena.
    ///
    /// Resets the engine first; the returned session is the only way to run
    /// detection and resolution for the tick.
    pub fn set_motion_source<'a>(
        &'a mut self,
        records: &'a mut [EntityMotionRecord],
        arena: &'a PolygonArena,
    ) -> TickSession<'a> {
        self.reset();
        TickSession {
            engine: self,
            records,
            arena,
        }
    }

    /// An empty polygon arena sized by `arena_slots_per_class`.
    pub fn new_arena(&self) -> PolygonArena {
        PolygonArena::new(self.config.arena_slots_per_class)
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    /// Shapes filed by the last `find_collisions`.
    pub fn active(&self) -> &[ActiveShape] {
        &self.active
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// TickSession
// ---------------------------------------------------------------------------

/// One tick's binding of engine, motion records and arena.
pub struct TickSession<'a> {
    pub(crate) engine: &'a mut CollisionEngine,
    pub(crate) records: &'a mut [EntityMotionRecord],
    pub(crate) arena: &'a PolygonArena,
}

impl<'a> TickSession<'a> {
    /// Find every pair of entities whose authoritative shapes overlap.
    ///
    /// `could_matter(a, b)` filters pairs before the exact polygon test; it
    /// must be a pure function of the two entity indices. The result is
    /// unordered and never contains a self-pair or the same entity pair
    /// twice.
    pub fn find_collisions<F>(&mut self, could_matter: &F) -> Vec<CollisionPair>
    where
        F: Fn(usize, usize) -> bool + Sync,
    {
        let engine = &mut *self.engine;
        let arena = self.arena;
        engine.reset();

        // Tick bounds over every shape of every active entity.
        let mut corners: Option<Aabb> = None;
        let (mut max_w, mut max_h) = (0.0f32, 0.0f32);
        for rec in self.records.iter().filter(|r| r.move_intent().is_active()) {
            for (handle, _) in rec.all_shapes() {
                let Some(poly) = arena.get(handle) else {
                    continue;
                };
                let bb = poly.aabb();
                let corner = Aabb {
                    x1: bb.x1,
                    y1: bb.y1,
                    x2: bb.x1,
                    y2: bb.y1,
                };
                corners = Some(corners.map_or(corner, |c| c.union(&corner)));
                max_w = max_w.max(bb.width());
                max_h = max_h.max(bb.height());
            }
        }
        let Some(corners) = corners else {
            debug!(entities = self.records.len(), "no active shapes this tick");
            return Vec::new();
        };
        engine.grid.configure(corners, max_w, max_h);

        // File authoritative shapes.
        for (idx, rec) in self.records.iter().enumerate() {
            let Some(set) = ShapeSet::for_intent(rec.move_intent()) else {
                continue;
            };
            let mut filed = 0;
            for (shape, &handle) in rec.shapes(set).iter().enumerate() {
                let Some(poly) = arena.get(handle) else {
                    warn!(entity = idx, shape, ?handle, "skipping stale shape handle");
                    continue;
                };
                let candidate = CollisionCandidate {
                    owner: idx,
                    shape,
                    handle,
                    aabb: *poly.aabb(),
                };
                let (cell_x, cell_y) = engine.grid.cell_of(&candidate.aabb);
                engine.grid.insert(cell_x, cell_y, candidate);
                engine.active.push(ActiveShape {
                    candidate,
                    cell_x,
                    cell_y,
                });
                filed += 1;
            }
            if filed > 1 {
                engine.multi_shape = true;
            }
        }

        // Parallel pair search; each part owns its output list.
        let ranges = partition_ranges(engine.active.len(), engine.pool.participants());
        let mut parts: Vec<(Range<usize>, Vec<CollisionPair>)> =
            ranges.into_iter().map(|r| (r, Vec::new())).collect();
        let grid = &engine.grid;
        let active = &engine.active;
        engine.pool.run_partitioned(&mut parts, |(range, out)| {
            for shape in &active[range.clone()] {
                find_and_add_collisions_gt(grid, arena, shape, could_matter, out);
            }
        });

        let workers = parts.len();
        let mut pairs: Vec<CollisionPair> =
            parts.into_iter().flat_map(|(_, out)| out).collect();
        if engine.multi_shape {
            fold_duplicate_pairs(&mut pairs);
        }

        let (cell_w, cell_h) = engine.grid.cell_size();
        debug!(
            active_shapes = engine.active.len(),
            pairs = pairs.len(),
            workers,
            cell_w,
            cell_h,
            "find_collisions complete"
        );
        pairs
    }

    /// Intent of entity `idx`.
    #[inline]
    pub fn move_intent(&self, idx: usize) -> MoveIntent {
        self.records[idx].move_intent()
    }

    /// Overwrite the intent of entity `idx` (used by collision handling
    /// before [`update_intent_after_collision`](Self::update_intent_after_collision)).
    #[inline]
    pub fn set_move_intent(&mut self, idx: usize, intent: MoveIntent) {
        self.records[idx].set_move_intent(intent);
    }

    pub fn records(&self) -> &[EntityMotionRecord] {
        self.records
    }

    pub fn grid(&self) -> &CollisionGrid {
        &self.engine.grid
    }

    pub fn arena(&self) -> &PolygonArena {
        self.arena
    }
}

// ---------------------------------------------------------------------------
// Pair search
// ---------------------------------------------------------------------------

/// Search to the right of `shape` for overlapping partners and append one
/// pair per hit to `out`.
///
/// Scans columns `[shape.cell_x, col(x1 + max_w)]` and rows
/// `[row(y1 - max_h), row(y1 + max_h)]`. Within the shape's own column a
/// partner must satisfy `partner.x1 > x1`, or `partner.x1 == x1` with
/// `partner.owner < owner`. Reads the grid only, so it is safe to run from
/// many threads at once.
pub fn find_and_add_collisions_gt<F>(
    grid: &CollisionGrid,
    arena: &PolygonArena,
    shape: &ActiveShape,
    could_matter: &F,
    out: &mut Vec<CollisionPair>,
) where
    F: Fn(usize, usize) -> bool,
{
    let c = &shape.candidate;
    let x_hi = grid.x_to_grid_x(c.aabb.x1 + grid.max_w());
    let y_lo = grid.y_to_grid_y(c.aabb.y1 - grid.max_h());
    let y_hi = grid.y_to_grid_y(c.aabb.y1 + grid.max_h());

    for gx in shape.cell_x..=x_hi {
        for gy in y_lo..=y_hi {
            for other in grid.cell(gx, gy) {
                if other.owner == c.owner {
                    continue;
                }
                if gx == shape.cell_x {
                    if other.aabb.x1 < c.aabb.x1 {
                        continue;
                    }
                    if other.aabb.x1 == c.aabb.x1 && c.owner <= other.owner {
                        continue;
                    }
                }
                if narrow_phase(arena, c, other, could_matter) {
                    out.push(CollisionPair::new(c.owner, other.owner));
                }
            }
        }
    }
}

/// Search the full neighbourhood of `candidate` for partners owned by any
/// other entity and append one pair per hit to `out`.
///
/// Used while resolving intents, where shapes are filed and removed one
/// entity at a time and the left/right split no longer holds.
pub fn find_and_add_collisions_neq<F>(
    grid: &CollisionGrid,
    arena: &PolygonArena,
    candidate: &CollisionCandidate,
    could_matter: &F,
    out: &mut Vec<CollisionPair>,
) where
    F: Fn(usize, usize) -> bool,
{
    let c = candidate;
    let x_lo = grid.x_to_grid_x(c.aabb.x1 - grid.max_w());
    let x_hi = grid.x_to_grid_x(c.aabb.x1 + grid.max_w());
    let y_lo = grid.y_to_grid_y(c.aabb.y1 - grid.max_h());
    let y_hi = grid.y_to_grid_y(c.aabb.y1 + grid.max_h());

    for gx in x_lo..=x_hi {
        for gy in y_lo..=y_hi {
            for other in grid.cell(gx, gy) {
                if other.owner != c.owner && narrow_phase(arena, c, other, could_matter) {
                    out.push(CollisionPair::new(c.owner, other.owner));
                }
            }
        }
    }
}

/// Box reject, collaborator filter, then the exact polygon test.
fn narrow_phase<F>(
    arena: &PolygonArena,
    a: &CollisionCandidate,
    b: &CollisionCandidate,
    could_matter: &F,
) -> bool
where
    F: Fn(usize, usize) -> bool,
{
    if !a.aabb.overlaps(&b.aabb) || !could_matter(a.owner, b.owner) {
        return false;
    }
    match (arena.get(a.handle), arena.get(b.handle)) {
        (Some(pa), Some(pb)) => pa.has_collision(pb),
        _ => false,
    }
}

/// Canonicalize, sort and drop repeated entity pairs.
fn fold_duplicate_pairs(pairs: &mut Vec<CollisionPair>) {
    for pair in pairs.iter_mut() {
        *pair = pair.canonical();
    }
    pairs.sort_unstable_by_key(|p| (p.entity_a, p.entity_b));
    pairs.dedup();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
