//! Terminal-condition detection and tie-break for a round in the duel phase

use super::outcome::{EndReason, RoundResult};

/// Death timestamps this close are a simultaneous hit
pub const TIE_EPSILON: f32 = 0.045;

/// What the arbiter looks at each tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArbiterInput {
    pub player_dead_at: Option<f32>,
    pub enemy_dead_at: Option<f32>,
    pub player_has_shot: bool,
    pub enemy_has_shot: bool,
    pub projectiles_in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub result: RoundResult,
    pub reason: EndReason,
}

#[derive(Debug, Clone, Copy)]
pub struct RoundArbiter {
    pub tie_epsilon: f32,
}

impl Default for RoundArbiter {
    fn default() -> Self {
        Self { tie_epsilon: TIE_EPSILON }
    }
}

impl RoundArbiter {
    /// Decide the round, or `None` while it is still open
    pub fn evaluate(&self, input: &ArbiterInput) -> Option<Verdict> {
        match (input.player_dead_at, input.enemy_dead_at) {
            (Some(p), Some(e)) => Some(self.both_down(p, e)),
            (Some(_), None) => Some(Verdict {
                result: RoundResult::Lost,
                reason: EndReason::Shot,
            }),
            (None, Some(_)) => Some(Verdict {
                result: RoundResult::Won,
                reason: EndReason::Shot,
            }),
            (None, None) => {
                if input.player_has_shot && input.enemy_has_shot && input.projectiles_in_flight == 0 {
                    Some(Verdict {
                        result: RoundResult::Draw,
                        reason: EndReason::BothMissed,
                    })
                } else {
                    None
                }
            }
        }
    }

    fn both_down(&self, player_at: f32, enemy_at: f32) -> Verdict {
        if (player_at - enemy_at).abs() <= self.tie_epsilon {
            Verdict {
                result: RoundResult::Draw,
                reason: EndReason::SimultaneousHit,
            }
        } else if player_at < enemy_at {
            Verdict {
                result: RoundResult::Lost,
                reason: EndReason::PlayerDownFirst,
            }
        } else {
            Verdict {
                result: RoundResult::Won,
                reason: EndReason::EnemyDownFirst,
            }
        }
    }
}
