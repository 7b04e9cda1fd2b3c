//! Per-entity movement intent.

use serde::{Deserialize, Serialize};

/// What an entity wants to do with its shapes this tick.
///
/// Entity logic moves every record out of `NotSet` before detection runs;
/// only `StayAtCurrentPos` and `GoToDesiredPos` put shapes in the grid.
/// Collision handling may then request `StayAtCurrentPos`, `RemoveShapes`
/// or `GoToDesiredPosIfOtherDoesntCollide`, which the resolver reconciles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveIntent {
    /// Not decided yet. Reset value at the start of every tick.
    #[default]
    NotSet,
    /// Occupy the current shapes.
    StayAtCurrentPos,
    /// Occupy the desired shapes.
    GoToDesiredPos,
    /// Move only if the other party of the collision turns out not to be in
    /// the way. Legal only as a request from `GoToDesiredPos`.
    GoToDesiredPosIfOtherDoesntCollide,
    /// Take every shape out of the simulation.
    RemoveShapes,
}

impl MoveIntent {
    /// Returns `true` for the two intents whose shapes take part in detection.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::StayAtCurrentPos | Self::GoToDesiredPos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_set() {
        assert_eq!(MoveIntent::default(), MoveIntent::NotSet);
    }

    #[test]
    fn only_stay_and_go_are_active() {
        assert!(MoveIntent::StayAtCurrentPos.is_active());
        assert!(MoveIntent::GoToDesiredPos.is_active());
        assert!(!MoveIntent::NotSet.is_active());
        assert!(!MoveIntent::GoToDesiredPosIfOtherDoesntCollide.is_active());
        assert!(!MoveIntent::RemoveShapes.is_active());
    }
}
