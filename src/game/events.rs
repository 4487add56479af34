//! Notifications published by the duel for presentation collaborators
//! (sprite selection, particle effects, the result banner)

use serde::{Deserialize, Serialize};

use crate::util::math::Point;

use super::combatant::CombatPhase;
use super::outcome::{EndReason, RoundOutcome, RoundResult};
use super::round::RoundPhase;
use super::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DuelEvent {
    /// Round moved standoff -> duel -> over (or back to standoff on reset)
    RoundPhaseChanged {
        from: RoundPhase,
        to: RoundPhase,
        at: f32,
    },

    /// A combatant changed logical phase
    CombatantPhaseChanged {
        side: Side,
        from: CombatPhase,
        to: CombatPhase,
        at: f32,
    },

    /// The go signal fired
    GoSignal {
        at: f32,
        personality: String,
    },

    /// A projectile left the muzzle
    ShotFired {
        side: Side,
        projectile_id: u32,
        origin: Point,
        aim: Point,
        at: f32,
    },

    /// Hit effect request
    ParticleSpawn {
        position: Point,
        /// Radians; 0 sprays rightward
        direction: f32,
    },

    /// A projectile connected
    Hit {
        shooter: Side,
        target: Side,
        at: f32,
        lethal: bool,
    },

    /// The round reached a terminal decision
    RoundEnded {
        result: RoundResult,
        reason: EndReason,
        player_score: u32,
        enemy_score: u32,
        match_over: bool,
    },

    /// The outcome is ready to show (death animations have played out)
    OutcomeReady {
        outcome: RoundOutcome,
    },
}
