//! Entity collaborator capability.
//!
//! The engine never knows what an entity *is*. A game implements
//! [`CollisionBehavior`] for its entity type (usually an enum over entity
//! kinds) and the tick driver calls it for every detected pair.

use serde::{Deserialize, Serialize};

use crate::intent::MoveIntent;

/// What an entity sees when asked to handle a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionContext {
    /// Tick number.
    pub tick: u64,
    /// Index of the entity handling the collision.
    pub own_index: usize,
    /// Index of the entity it collided with.
    pub other_index: usize,
    /// The handler's intent going in.
    pub own_intent: MoveIntent,
    /// The other entity's intent going in. When the second party of a pair
    /// runs, this already holds the first party's response.
    pub other_intent: MoveIntent,
}

impl CollisionContext {
    /// The same collision seen from the other side.
    pub fn swapped(self) -> Self {
        Self {
            own_index: self.other_index,
            other_index: self.own_index,
            own_intent: self.other_intent,
            other_intent: self.own_intent,
            ..self
        }
    }
}

/// Per-entity collision logic supplied by the game.
pub trait CollisionBehavior {
    /// Whether a collision between `self` and `other` can matter at all.
    ///
    /// Must be a pure function of the two entities; it runs on worker threads
    /// during detection.
    fn collision_could_matter(&self, other: &Self) -> bool;

    /// React to a collision with `other` and return this entity's new intent.
    ///
    /// Returning `ctx.own_intent` leaves the entity as it was.
    fn handle_collision(&mut self, other: &Self, ctx: &CollisionContext) -> MoveIntent;
}
