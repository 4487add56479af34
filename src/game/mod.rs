//! Duel simulation modules

pub mod ai;
pub mod aim;
pub mod arbiter;
pub mod ballistics;
pub mod combatant;
pub mod duel;
pub mod events;
pub mod outcome;
pub mod personality;
pub mod round;
pub mod session;
pub mod snapshot;

pub use combatant::CombatPhase;
pub use duel::{Duel, DuelError, DuelSettings};
pub use events::DuelEvent;
pub use outcome::{EndReason, RoundOutcome, RoundResult};
pub use personality::{Archetype, Personality, PersonalityPool};
pub use round::{GoWindow, RoundPhase};
pub use session::MatchTarget;
pub use snapshot::HudSnapshot;

use serde::{Deserialize, Serialize};

use crate::util::math::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Human-controlled
    Player,
    /// AI-controlled
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    /// Slot in per-side arrays
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }
}

/// Where the human's crosshair is anchored before jitter
pub trait TargetSource: Send {
    /// `torso` is the opponent's hit point this tick
    fn aim_base(&self, torso: Point) -> Point;
}

/// Aim straight at the opponent's torso
#[derive(Debug, Clone, Copy, Default)]
pub struct TorsoTarget;

impl TargetSource for TorsoTarget {
    fn aim_base(&self, torso: Point) -> Point {
        torso
    }
}

/// Aim at a fixed world point, e.g. a pointer position
#[derive(Debug, Clone, Copy)]
pub struct PointerTarget(pub Point);

impl TargetSource for PointerTarget {
    fn aim_base(&self, _torso: Point) -> Point {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent().index(), 0);
    }

    #[test]
    fn test_target_sources() {
        let torso = Point::new(470.0, 310.0);
        assert_eq!(TorsoTarget.aim_base(torso), torso);
        assert_eq!(PointerTarget(Point::new(1.0, 2.0)).aim_base(torso), Point::new(1.0, 2.0));
    }
}
