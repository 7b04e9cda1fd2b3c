//! Per-tick collision driver.
//!
//! [`CollisionTick`] runs one tick of the collision protocol against a
//! game's entities:
//!
//! 1. Binds the motion records and arena to the engine.
//! 2. Detects every colliding pair (parallel).
//! 3. Drains the pair worklist in order. For each pair, the first entity
//!    handles the collision against the second, then the second against the
//!    first, then both intents are reconciled. Reconciliation may append
//!    pairs, which are drained in the same pass.
//! 4. Records timing and pair counts in a [`TickReport`].
//!
//! Pairs involving an entity that already dropped its shapes are skipped.
//!
//! # Example
//!
//! ```
//! use lattice_collide::prelude::*;
//! use lattice_geom::prelude::*;
//!
//! struct Crate;
//!
//! impl CollisionBehavior for Crate {
//!     fn collision_could_matter(&self, _other: &Self) -> bool {
//!         true
//!     }
//!     fn handle_collision(&mut self, _other: &Self, ctx: &CollisionContext) -> MoveIntent {
//!         match ctx.own_intent {
//!             MoveIntent::GoToDesiredPos => MoveIntent::StayAtCurrentPos,
//!             other => other,
//!         }
//!     }
//! }
//!
//! let mut arena = PolygonArena::new(16);
//! let mut records = Vec::new();
//! for x in [0.0, 0.5] {
//!     let handle = arena.insert(Polygon::rect(x, 0.0, x + 1.0, 1.0)).unwrap();
//!     let mut rec = EntityMotionRecord::with_current([handle]);
//!     rec.set_move_intent(MoveIntent::StayAtCurrentPos);
//!     records.push(rec);
//! }
//! let mut entities = vec![Crate, Crate];
//!
//! let mut ticker = CollisionTick::new(CollisionConfig::default()).unwrap();
//! let report = ticker.run(&mut records, &arena, &mut entities);
//! assert_eq!(report.initial_pairs, 1);
//! assert_eq!(ticker.tick_count(), 1);
//! ```

use std::time::{Duration, Instant};

use lattice_geom::PolygonArena;
use tracing::debug;

use crate::behavior::{CollisionBehavior, CollisionContext};
use crate::config::CollisionConfig;
use crate::detector::CollisionEngine;
use crate::intent::MoveIntent;
use crate::motion::EntityMotionRecord;
use crate::EngineError;

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// Pair counts and timings for one collision tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number the report belongs to.
    pub tick: u64,
    /// Pairs returned by detection.
    pub initial_pairs: usize,
    /// Pairs whose collision handling ran, including ones found during
    /// resolution.
    pub resolved_pairs: usize,
    /// Pairs dropped because a participant had already removed its shapes.
    pub skipped_pairs: usize,
    /// Wall-clock time spent in detection.
    pub detect_time: Duration,
    /// Wall-clock time spent draining the worklist.
    pub resolve_time: Duration,
}

// ---------------------------------------------------------------------------
// CollisionTick
// ---------------------------------------------------------------------------

/// Owns a [`CollisionEngine`] and runs it once per tick.
#[derive(Debug)]
pub struct CollisionTick {
    engine: CollisionEngine,
    tick_counter: u64,
    last_report: TickReport,
}

impl CollisionTick {
    pub fn new(config: CollisionConfig) -> Result<Self, EngineError> {
        Ok(Self::with_engine(CollisionEngine::new(config)?))
    }

    pub fn with_engine(engine: CollisionEngine) -> Self {
        Self {
            engine,
            tick_counter: 0,
            last_report: TickReport::default(),
        }
    }

    pub fn engine(&self) -> &CollisionEngine {
        &self.engine
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Run detection and resolution for one tick.
    ///
    /// `records[i]` and `entities[i]` describe the same entity. Every record
    /// must already carry its intent for this tick.
    ///
    /// # Panics
    ///
    /// Panics if the two slices differ in length, or if an entity's collision
    /// handling requests an illegal intent transition.
    pub fn run<B>(
        &mut self,
        records: &mut [EntityMotionRecord],
        arena: &PolygonArena,
        entities: &mut [B],
    ) -> TickReport
    where
        B: CollisionBehavior + Sync,
    {
        assert_eq!(
            records.len(),
            entities.len(),
            "motion records and entities differ in length"
        );
        let tick = self.tick_counter;

        let detect_start = Instant::now();
        let mut session = self.engine.set_motion_source(records, arena);
        let mut worklist = session.find_collisions(&could_matter_for(entities));
        let detect_time = detect_start.elapsed();
        let initial_pairs = worklist.len();

        let resolve_start = Instant::now();
        let mut resolved_pairs = 0;
        let mut skipped_pairs = 0;
        let mut cursor = 0;
        while cursor < worklist.len() {
            let pair = worklist[cursor];
            cursor += 1;
            let (a, b) = (pair.entity_a, pair.entity_b);
            let prev_a = session.move_intent(a);
            let prev_b = session.move_intent(b);
            if prev_a == MoveIntent::RemoveShapes || prev_b == MoveIntent::RemoveShapes {
                debug!(tick, a, b, "skipping pair with removed entity");
                skipped_pairs += 1;
                continue;
            }

            let ctx = CollisionContext {
                tick,
                own_index: a,
                other_index: b,
                own_intent: prev_a,
                other_intent: prev_b,
            };
            let (ea, eb) = pair_mut(entities, a, b);
            let new_a = ea.handle_collision(eb, &ctx);
            session.set_move_intent(a, new_a);
            let ctx_b = CollisionContext {
                other_intent: new_a,
                ..ctx.swapped()
            };
            let new_b = eb.handle_collision(ea, &ctx_b);
            session.set_move_intent(b, new_b);

            let could_matter = could_matter_for(entities);
            session.update_intent_after_collision(
                a,
                prev_a,
                b,
                prev_b,
                &could_matter,
                &mut worklist,
            );
            session.update_intent_after_collision(
                b,
                prev_b,
                a,
                prev_a,
                &could_matter,
                &mut worklist,
            );
            resolved_pairs += 1;
        }

        let report = TickReport {
            tick,
            initial_pairs,
            resolved_pairs,
            skipped_pairs,
            detect_time,
            resolve_time: resolve_start.elapsed(),
        };
        debug!(
            tick,
            initial_pairs,
            resolved_pairs,
            skipped_pairs,
            detect_us = report.detect_time.as_micros() as u64,
            resolve_us = report.resolve_time.as_micros() as u64,
            "collision tick complete"
        );
        self.tick_counter += 1;
        self.last_report = report.clone();
        report
    }
}

/// Apply every record's resolved intent to the arena and reset the intents
/// for the next tick. See [`EntityMotionRecord::apply_intent`].
///
/// Every record is committed; the first stale handle is reported.
pub fn commit_tick(
    records: &mut [EntityMotionRecord],
    arena: &mut PolygonArena,
) -> Result<(), EngineError> {
    let mut result = Ok(());
    for rec in records.iter_mut() {
        if let Err(err) = rec.apply_intent(arena) {
            if result.is_ok() {
                result = Err(err.into());
            }
        }
    }
    result
}

/// Index-based collision filter over the entity slice.
fn could_matter_for<B>(entities: &[B]) -> impl Fn(usize, usize) -> bool + Sync + '_
where
    B: CollisionBehavior + Sync,
{
    move |a, b| entities[a].collision_could_matter(&entities[b])
}

/// Two distinct mutable elements of one slice.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "pair_mut called with the same index twice");
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
