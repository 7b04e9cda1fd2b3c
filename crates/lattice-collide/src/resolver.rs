//! Move-intent resolution after a collision.
//!
//! After both parties of a pair have run their collision handling, each one's
//! intent is reconciled against what it was before. Legal transitions:
//!
//! | before           | requested            | effect                                 |
//! |------------------|----------------------|----------------------------------------|
//! | any              | unchanged            | none                                   |
//! | `GoToDesiredPos` | `StayAtCurrentPos`   | desired shapes out, current shapes in  |
//! | `Stay`/`GoTo`    | `RemoveShapes`       | filed shapes out                       |
//! | `GoToDesiredPos` | conditional move     | resolved to `Stay` or `GoTo`, below    |
//!
//! Anything else means entity logic broke the protocol and panics.
//!
//! Filing a new shape set searches the grid around it with
//! [`find_and_add_collisions_neq`] and appends what it finds to the caller's
//! worklist, so a tick keeps resolving until no new pairs turn up.

use lattice_geom::Polygon;
use tracing::{trace, warn};

use crate::detector::{find_and_add_collisions_neq, CollisionPair, TickSession};
use crate::grid::CollisionCandidate;
use crate::intent::MoveIntent;
use crate::motion::ShapeSet;

/// Decide a conditional move from the other party's intents.
///
/// `desired_hits_other` is only consulted when both parties asked for a
/// conditional move; it reports whether this entity's desired shapes overlap
/// the other's current shapes.
///
/// # Panics
///
/// Panics on an intent combination the protocol never produces.
pub fn resolve_conditional_intent(
    other_prev: MoveIntent,
    other_now: MoveIntent,
    desired_hits_other: impl FnOnce() -> bool,
) -> MoveIntent {
    use MoveIntent::*;
    match (other_prev, other_now) {
        (_, StayAtCurrentPos) => StayAtCurrentPos,
        (GoToDesiredPos, GoToDesiredPosIfOtherDoesntCollide) => {
            if desired_hits_other() {
                StayAtCurrentPos
            } else {
                GoToDesiredPos
            }
        }
        (_, GoToDesiredPos) => StayAtCurrentPos,
        (_, RemoveShapes) => GoToDesiredPos,
        (prev, now) => panic!(
            "conditional move against an entity going from {prev:?} to {now:?}"
        ),
    }
}

impl TickSession<'_> {
    /// Reconcile entity `idx`'s intent after its collision with `other_idx`.
    ///
    /// `prev` and `other_prev` are the two intents from before collision
    /// handling ran; the records already hold the requested ones. New pairs
    /// found while refiling shapes are appended to `worklist`.
    ///
    /// # Panics
    ///
    /// Panics if the requested transition is not one of the legal ones.
    pub fn update_intent_after_collision<F>(
        &mut self,
        idx: usize,
        prev: MoveIntent,
        other_idx: usize,
        other_prev: MoveIntent,
        could_matter: &F,
        worklist: &mut Vec<CollisionPair>,
    ) where
        F: Fn(usize, usize) -> bool,
    {
        use MoveIntent::*;
        let requested = self.move_intent(idx);
        if requested == prev {
            return;
        }
        trace!(entity = idx, ?prev, ?requested, other = other_idx, "intent transition");

        match (prev, requested) {
            (GoToDesiredPos, StayAtCurrentPos) => {
                self.swap_to_current(idx, could_matter, worklist);
            }
            (StayAtCurrentPos | GoToDesiredPos, RemoveShapes) => {
                if let Some(set) = ShapeSet::for_intent(prev) {
                    self.unfile(idx, set);
                }
            }
            (GoToDesiredPos, GoToDesiredPosIfOtherDoesntCollide) => {
                let other_now = self.move_intent(other_idx);
                let resolved = resolve_conditional_intent(other_prev, other_now, || {
                    self.shape_sets_collide(idx, ShapeSet::Desired, other_idx, ShapeSet::Current)
                });
                trace!(
                    entity = idx,
                    ?other_prev,
                    ?other_now,
                    ?resolved,
                    "conditional move resolved"
                );
                self.set_move_intent(idx, resolved);
                if resolved == StayAtCurrentPos {
                    self.swap_to_current(idx, could_matter, worklist);
                }
            }
            _ => panic!(
                "illegal move intent transition for entity {idx}: {prev:?} -> {requested:?} \
                 (other entity {other_idx} was {other_prev:?})"
            ),
        }
    }

    /// Take `idx`'s desired shapes out of the grid, file its current ones and
    /// search around them.
    fn swap_to_current<F>(
        &mut self,
        idx: usize,
        could_matter: &F,
        worklist: &mut Vec<CollisionPair>,
    ) where
        F: Fn(usize, usize) -> bool,
    {
        self.unfile(idx, ShapeSet::Desired);
        self.file_and_search(idx, ShapeSet::Current, could_matter, worklist);
    }

    fn unfile(&mut self, idx: usize, set: ShapeSet) {
        let grid = &mut self.engine.grid;
        for &handle in self.records[idx].shapes(set) {
            let Some(poly) = self.arena.get(handle) else {
                continue;
            };
            let (x, y) = grid.cell_of(poly.aabb());
            if grid.remove_one_with_idx(x, y, idx).is_none() {
                warn!(entity = idx, ?set, x, y, "shape missing from its grid cell");
            }
        }
    }

    fn file_and_search<F>(
        &mut self,
        idx: usize,
        set: ShapeSet,
        could_matter: &F,
        worklist: &mut Vec<CollisionPair>,
    ) where
        F: Fn(usize, usize) -> bool,
    {
        let arena = self.arena;
        let grid = &mut self.engine.grid;
        let mut found = Vec::new();
        for (shape, &handle) in self.records[idx].shapes(set).iter().enumerate() {
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
            let (x, y) = grid.cell_of(&candidate.aabb);
            grid.insert(x, y, candidate);
            find_and_add_collisions_neq(grid, arena, &candidate, could_matter, &mut found);
        }

        // One entry per partner even when several shapes hit it.
        found.sort_unstable_by_key(|p| p.entity_b);
        found.dedup();
        trace!(entity = idx, new_pairs = found.len(), "refiled shapes");
        worklist.extend(found);
    }

    fn polygons(&self, idx: usize, set: ShapeSet) -> impl Iterator<Item = &Polygon> + '_ {
        let arena = self.arena;
        self.records[idx]
            .shapes(set)
            .iter()
            .filter_map(move |&h| arena.get(h))
    }

    /// Whether any shape in `a`'s `a_set` collides with any in `b`'s `b_set`.
    pub fn shape_sets_collide(&self, a: usize, a_set: ShapeSet, b: usize, b_set: ShapeSet) -> bool {
        self.polygons(a, a_set).any(|pa| {
            self.polygons(b, b_set)
                .any(|pb| pa.aabb().overlaps(pb.aabb()) && pa.has_collision(pb))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
