//! Per-entity motion records.
//!
//! An [`EntityMotionRecord`] is owned by the game loop and persists across
//! ticks. It lists the entity's *current* shapes (where it is) and *desired*
//! shapes (where it wants to be) as arena handles, plus its [`MoveIntent`].
//! The collision engine only ever reads geometry through these lists.

use lattice_geom::{GeomError, PolygonArena, PolygonHandle};
use serde::{Deserialize, Serialize};

use crate::intent::MoveIntent;

/// Which of an entity's two shape lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeSet {
    /// Where the entity is.
    Current,
    /// Where the entity wants to move.
    Desired,
}

impl ShapeSet {
    /// The set an intent makes authoritative, if any.
    pub fn for_intent(intent: MoveIntent) -> Option<Self> {
        match intent {
            MoveIntent::StayAtCurrentPos => Some(Self::Current),
            MoveIntent::GoToDesiredPos => Some(Self::Desired),
            _ => None,
        }
    }
}

/// Shapes and movement intent for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMotionRecord {
    current: Vec<PolygonHandle>,
    desired: Vec<PolygonHandle>,
    intent: MoveIntent,
}

impl EntityMotionRecord {
    /// Create an empty record with intent `NotSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record whose current shapes are `shapes`.
    pub fn with_current(shapes: impl IntoIterator<Item = PolygonHandle>) -> Self {
        Self {
            current: shapes.into_iter().collect(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn move_intent(&self) -> MoveIntent {
        self.intent
    }

    #[inline]
    pub fn set_move_intent(&mut self, intent: MoveIntent) {
        self.intent = intent;
    }

    /// Start-of-tick reset.
    pub fn reset_intent(&mut self) {
        self.intent = MoveIntent::NotSet;
    }

    pub fn push_current(&mut self, shape: PolygonHandle) {
        self.current.push(shape);
    }

    pub fn push_desired(&mut self, shape: PolygonHandle) {
        self.desired.push(shape);
    }

    /// Drop every desired shape handle. The polygons stay in the arena.
    pub fn clear_desired(&mut self) {
        self.desired.clear();
    }

    /// Promote the desired shapes to current ones, returning the handles
    /// that were current before.
    pub fn commit_desired(&mut self) -> Vec<PolygonHandle> {
        let old = std::mem::take(&mut self.current);
        self.current = std::mem::take(&mut self.desired);
        old
    }

    /// End-of-tick commit of the resolved intent.
    ///
    /// `GoToDesiredPos` promotes the desired shapes and frees the old current
    /// ones, `RemoveShapes` frees every shape, anything else frees the desired
    /// shapes. The intent goes back to `NotSet`. Every released handle is
    /// freed even if an earlier one was stale; the first stale one is
    /// reported.
    ///
    /// # Panics
    ///
    /// Panics if the intent is `GoToDesiredPos` but the record has no desired
    /// shapes; committing it would silently drop the entity.
    pub fn apply_intent(&mut self, arena: &mut PolygonArena) -> Result<(), GeomError> {
        let released = match self.intent {
            MoveIntent::GoToDesiredPos => {
                assert!(
                    !self.desired.is_empty(),
                    "entity with GoToDesiredPos has no desired shapes"
                );
                self.commit_desired()
            }
            MoveIntent::RemoveShapes => {
                let mut all = std::mem::take(&mut self.current);
                all.append(&mut self.desired);
                all
            }
            _ => std::mem::take(&mut self.desired),
        };
        self.reset_intent();

        let mut result = Ok(());
        for handle in released {
            if !arena.free(handle) && result.is_ok() {
                result = Err(GeomError::StaleHandle(handle));
            }
        }
        result
    }

    /// Current shapes as `(handle, shape_index)`, in insertion order.
    pub fn cur_shapes(&self) -> impl Iterator<Item = (PolygonHandle, usize)> + '_ {
        self.current.iter().copied().zip(0..)
    }

    /// Desired shapes as `(handle, shape_index)`, in insertion order.
    pub fn des_shapes(&self) -> impl Iterator<Item = (PolygonHandle, usize)> + '_ {
        self.desired.iter().copied().zip(0..)
    }

    /// Current shapes followed by desired shapes.
    pub fn all_shapes(&self) -> impl Iterator<Item = (PolygonHandle, usize)> + '_ {
        self.cur_shapes().chain(self.des_shapes())
    }

    /// The handles in one shape set.
    pub fn shapes(&self, set: ShapeSet) -> &[PolygonHandle] {
        match set {
            ShapeSet::Current => &self.current,
            ShapeSet::Desired => &self.desired,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_geom::PolygonArena;

    fn handles(n: usize) -> Vec<PolygonHandle> {
        let mut arena = PolygonArena::new(16);
        (0..n)
            .map(|i| {
                let x = i as f32;
                arena
                    .alloc(&[(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0)])
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn iteration_visits_each_shape_once_in_order() {
        let h = handles(5);
        let mut rec = EntityMotionRecord::with_current(h[..2].iter().copied());
        for &d in &h[2..] {
            rec.push_desired(d);
        }
        let cur: Vec<_> = rec.cur_shapes().collect();
        let des: Vec<_> = rec.des_shapes().collect();
        let all: Vec<_> = rec.all_shapes().map(|(h, _)| h).collect();
        assert_eq!(cur, vec![(h[0], 0), (h[1], 1)]);
        assert_eq!(des, vec![(h[2], 0), (h[3], 1), (h[4], 2)]);
        assert_eq!(all, h);
    }

    #[test]
    fn reset_intent_returns_to_not_set() {
        let mut rec = EntityMotionRecord::new();
        rec.set_move_intent(MoveIntent::GoToDesiredPos);
        rec.reset_intent();
        assert_eq!(rec.move_intent(), MoveIntent::NotSet);
    }

    #[test]
    fn commit_desired_swaps_sets() {
        let h = handles(3);
        let mut rec = EntityMotionRecord::with_current([h[0]]);
        rec.push_desired(h[1]);
        rec.push_desired(h[2]);
        let old = rec.commit_desired();
        assert_eq!(old, vec![h[0]]);
        assert_eq!(rec.shapes(ShapeSet::Current), &[h[1], h[2]]);
        assert!(rec.shapes(ShapeSet::Desired).is_empty());
    }

    fn rect(arena: &mut PolygonArena, x: f32) -> PolygonHandle {
        arena
            .alloc(&[(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0), (x, 1.0)])
            .unwrap()
    }

    #[test]
    fn apply_intent_promotes_desired_shapes() {
        let mut arena = PolygonArena::new(4);
        let cur = rect(&mut arena, 0.0);
        let des = rect(&mut arena, 1.0);
        let mut rec = EntityMotionRecord::with_current([cur]);
        rec.push_desired(des);
        rec.set_move_intent(MoveIntent::GoToDesiredPos);
        rec.apply_intent(&mut arena).unwrap();
        assert_eq!(rec.shapes(ShapeSet::Current), &[des]);
        assert!(rec.shapes(ShapeSet::Desired).is_empty());
        assert_eq!(rec.move_intent(), MoveIntent::NotSet);
        assert!(!arena.contains(cur));
        assert!(arena.contains(des));
    }

    #[test]
    fn apply_intent_stay_drops_desired_and_remove_drops_all() {
        let mut arena = PolygonArena::new(4);
        let cur = rect(&mut arena, 0.0);
        let des = rect(&mut arena, 1.0);
        let mut rec = EntityMotionRecord::with_current([cur]);
        rec.push_desired(des);
        rec.set_move_intent(MoveIntent::StayAtCurrentPos);
        rec.apply_intent(&mut arena).unwrap();
        assert_eq!(rec.shapes(ShapeSet::Current), &[cur]);
        assert!(!arena.contains(des));

        rec.set_move_intent(MoveIntent::RemoveShapes);
        rec.apply_intent(&mut arena).unwrap();
        assert!(rec.shapes(ShapeSet::Current).is_empty());
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "has no desired shapes")]
    fn apply_intent_go_to_without_desired_shapes_panics() {
        let mut arena = PolygonArena::new(4);
        let cur = rect(&mut arena, 0.0);
        let mut rec = EntityMotionRecord::with_current([cur]);
        rec.set_move_intent(MoveIntent::GoToDesiredPos);
        let _ = rec.apply_intent(&mut arena);
    }

    #[test]
    fn clear_desired_keeps_polygons_in_the_arena() {
        let mut arena = PolygonArena::new(4);
        let cur = rect(&mut arena, 0.0);
        let des = rect(&mut arena, 1.0);
        let mut rec = EntityMotionRecord::with_current([cur]);
        rec.push_desired(des);
        rec.clear_desired();
        assert!(rec.shapes(ShapeSet::Desired).is_empty());
        assert_eq!(rec.shapes(ShapeSet::Current), &[cur]);
        assert!(arena.contains(des));
    }

    #[test]
    fn apply_intent_reports_stale_handles() {
        let mut arena = PolygonArena::new(4);
        let cur = rect(&mut arena, 0.0);
        let des = rect(&mut arena, 1.0);
        arena.free(des);
        let mut rec = EntityMotionRecord::with_current([cur]);
        rec.push_desired(des);
        rec.set_move_intent(MoveIntent::RemoveShapes);
        assert_eq!(rec.apply_intent(&mut arena), Err(GeomError::StaleHandle(des)));
        assert!(!arena.contains(cur));
    }

    #[test]
    fn authoritative_set_follows_intent() {
        assert_eq!(
            ShapeSet::for_intent(MoveIntent::StayAtCurrentPos),
            Some(ShapeSet::Current)
        );
        assert_eq!(
            ShapeSet::for_intent(MoveIntent::GoToDesiredPos),
            Some(ShapeSet::Desired)
        );
        assert_eq!(ShapeSet::for_intent(MoveIntent::RemoveShapes), None);
        assert_eq!(ShapeSet::for_intent(MoveIntent::NotSet), None);
    }
}
