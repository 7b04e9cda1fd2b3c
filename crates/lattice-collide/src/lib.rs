//! Lattice Collide -- tick-based 2D collision engine.
//!
//! Every tick, entities declare where they are (current shapes), where they
//! want to be (desired shapes) and a [`MoveIntent`]. This crate finds every
//! pair of entities whose authoritative shapes overlap and reconciles their
//! movement requests so the simulation never lets two of them overlap
//! against the rules of the game.
//!
//! - [`grid`]: uniform spatial grid keyed by shape top-left corners.
//! - [`detector`]: [`CollisionEngine`] and the per-tick [`TickSession`], with
//!   the parallel pair search.
//! - [`resolver`]: the move-intent state machine run after each collision.
//! - [`behavior`]: the [`CollisionBehavior`] trait games implement for their
//!   entities.
//! - [`tick`]: [`CollisionTick`], a driver that runs detection and resolution
//!   for one tick and reports on it.
//!
//! Geometry lives in the `lattice-geom` crate.
//!
//! # Quick Start
//!
//! ```
//! use lattice_collide::prelude::*;
//! use lattice_geom::prelude::*;
//!
//! let mut arena = PolygonArena::new(64);
//! let mut records: Vec<EntityMotionRecord> = [(0.0, 0.0), (0.5, 0.0), (3.0, 0.0)]
//!     .into_iter()
//!     .map(|(cx, cy)| {
//!         let square = Polygon::rect(cx - 0.5, cy - 0.5, cx + 0.5, cy + 0.5);
//!         let mut rec = EntityMotionRecord::with_current([arena.insert(square).unwrap()]);
//!         rec.set_move_intent(MoveIntent::StayAtCurrentPos);
//!         rec
//!     })
//!     .collect();
//!
//! let mut engine = CollisionEngine::new(CollisionConfig::default()).unwrap();
//! let mut session = engine.set_motion_source(&mut records, &arena);
//! let pairs = session.find_collisions(&|_, _| true);
//! assert_eq!(pairs.len(), 1);
//! assert_eq!(pairs[0].canonical(), CollisionPair::new(0, 1));
//! ```

#![deny(unsafe_code)]

pub mod behavior;
pub mod config;
pub mod detector;
pub mod grid;
pub mod intent;
pub mod motion;
pub mod pool;
pub mod resolver;
pub mod tick;

pub use behavior::{CollisionBehavior, CollisionContext};
pub use config::CollisionConfig;
pub use detector::{CollisionEngine, CollisionPair, TickSession};
pub use intent::MoveIntent;
pub use motion::{EntityMotionRecord, ShapeSet};
pub use tick::{commit_tick, CollisionTick, TickReport};

use lattice_geom::GeomError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the collision engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A configuration value the engine cannot run with.
    #[error("invalid collision config: {0}")]
    InvalidConfig(String),

    /// The worker thread pool could not be started.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A geometry operation failed.
    #[error(transparent)]
    Geom(#[from] GeomError),

    /// The configuration JSON could not be parsed.
    #[error("failed to parse collision config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::behavior::{CollisionBehavior, CollisionContext};
    pub use crate::config::CollisionConfig;
    pub use crate::detector::{CollisionEngine, CollisionPair, TickSession};
    pub use crate::intent::MoveIntent;
    pub use crate::motion::{EntityMotionRecord, ShapeSet};
    pub use crate::tick::{commit_tick, CollisionTick, TickReport};
    pub use crate::EngineError;
}
