//! Scripted stand-in for the human side: react, hold until steady, release

use uuid::Uuid;

use crate::game::{CombatPhase, Duel, RoundPhase, Side};

/// One human-side intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Press,
    Release,
    Holster,
}

impl Intent {
    pub fn apply(self, duel: &mut Duel) {
        match self {
            Intent::Press => duel.press_draw(),
            Intent::Release => duel.release_draw(),
            Intent::Holster => duel.request_holster(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Seconds between the go signal and the press
    reaction: f32,
    /// Release once the spread has settled to this radius
    release_spread: Option<f32>,
    round_id: Option<Uuid>,
    pressed: bool,
    released: bool,
}

impl Autopilot {
    pub fn new(reaction_ms: u64) -> Self {
        Self {
            reaction: reaction_ms as f32 / 1000.0,
            release_spread: None,
            round_id: None,
            pressed: false,
            released: false,
        }
    }

    /// Release at `spread` instead of at the hit radius
    pub fn with_release_spread(mut self, spread: f32) -> Self {
        self.release_spread = Some(spread);
        self
    }

    /// Next intent for this tick, if any. Never presses before the go signal.
    pub fn decide(&mut self, duel: &Duel) -> Option<Intent> {
        if self.round_id != Some(duel.round_id()) {
            self.round_id = Some(duel.round_id());
            self.pressed = false;
            self.released = false;
        }

        if duel.round_phase() != RoundPhase::Duel {
            return None;
        }
        let go_at = duel.go_at()?;

        if !self.pressed {
            if duel.time() >= go_at + self.reaction {
                self.pressed = true;
                return Some(Intent::Press);
            }
            return None;
        }

        let preview = duel.aim_preview();

        if !self.released {
            let threshold = self.release_spread.unwrap_or_else(|| duel.hit_radius());
            return match preview {
                Some(aim) if aim.spread <= threshold => {
                    self.released = true;
                    Some(Intent::Release)
                }
                _ => None,
            };
        }

        match duel.phase(Side::Player) {
            // practice range: rearmed after recovery, go again
            CombatPhase::Aiming if preview.is_some() && !duel.input().held => {
                self.released = false;
                Some(Intent::Press)
            }
            // missed and spent: put it away and draw again
            CombatPhase::Aiming if duel.combatant(Side::Player).has_shot => Some(Intent::Holster),
            CombatPhase::Holstered => {
                self.released = false;
                Some(Intent::Press)
            }
            _ => None,
        }
    }
}
