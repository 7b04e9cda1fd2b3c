//! Collision engine benchmarks.
//!
//! - `find_collisions` on a uniform crowd at several entity counts, serial
//!   and with a worker pool.
//! - A full `CollisionTick::run` (detection plus resolution) on a crowd where
//!   most entities want to move.
//!
//! Run with: `cargo bench --bench collision_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use lattice_collide::prelude::*;
use lattice_geom::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Unit-ish boxes scattered over a square whose side grows with the count so
/// density stays constant. Roughly 80% of entities want to move.
fn crowd(count: usize, seed: u64) -> (PolygonArena, Vec<EntityMotionRecord>) {
    let mut rng = Pcg64::seed_from_u64(seed);
    let side = (count as f32).sqrt() * 2.0;
    let mut arena = PolygonArena::new(count * 2 + 1);
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let x = rng.gen_range(0.0..side);
        let y = rng.gen_range(0.0..side);
        let w = rng.gen_range(0.5..1.5);
        let h = rng.gen_range(0.5..1.5);
        let cur = arena
            .insert(Polygon::rect(x, y, x + w, y + h))
            .expect("arena sized for crowd");
        let mut rec = EntityMotionRecord::with_current([cur]);
        if rng.gen_bool(0.8) {
            let (dx, dy) = (rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
            let des = arena
                .insert(Polygon::rect(x + dx, y + dy, x + dx + w, y + dy + h))
                .expect("arena sized for crowd");
            rec.push_desired(des);
            rec.set_move_intent(MoveIntent::GoToDesiredPos);
        } else {
            rec.set_move_intent(MoveIntent::StayAtCurrentPos);
        }
        records.push(rec);
    }
    (arena, records)
}

fn engine(threads: usize) -> CollisionEngine {
    CollisionEngine::new(CollisionConfig {
        worker_threads: Some(threads),
        ..Default::default()
    })
    .expect("valid bench config")
}

struct Polite;

impl CollisionBehavior for Polite {
    fn collision_could_matter(&self, _other: &Self) -> bool {
        true
    }

    fn handle_collision(&mut self, _other: &Self, ctx: &CollisionContext) -> MoveIntent {
        match ctx.own_intent {
            MoveIntent::GoToDesiredPos => MoveIntent::GoToDesiredPosIfOtherDoesntCollide,
            own => own,
        }
    }
}

// ---------------------------------------------------------------------------
// Benchmark 1: detection scaling
// ---------------------------------------------------------------------------

fn bench_find_collisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_collisions");
    for count in [1_000usize, 5_000, 20_000] {
        let (arena, mut records) = crowd(count, 42);
        for threads in [0usize, 3] {
            let mut engine = engine(threads);
            let id = BenchmarkId::new(format!("threads_{threads}"), count);
            group.bench_with_input(id, &count, |b, &_count| {
                b.iter(|| {
                    let mut session = engine.set_motion_source(&mut records, &arena);
                    black_box(session.find_collisions(&|_, _| true));
                });
            });
        }
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 2: full tick
// ---------------------------------------------------------------------------

fn bench_full_tick(c: &mut Criterion) {
    let count = 5_000;
    let (arena, records) = crowd(count, 7);
    let mut entities: Vec<Polite> = (0..count).map(|_| Polite).collect();
    let mut ticker = CollisionTick::with_engine(engine(3));

    c.bench_function("collision_tick_5k_entities", |b| {
        b.iter(|| {
            // Resolution rewrites intents, so every iteration starts fresh.
            let mut records = records.clone();
            black_box(ticker.run(&mut records, &arena, &mut entities));
        });
    });
}

criterion_group!(benches, bench_find_collisions, bench_full_tick);
criterion_main!(benches);
