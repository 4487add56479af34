//! Read-only per-tick HUD summary

use serde::Serialize;

use crate::util::math::Point;

use super::combatant::CombatPhase;
use super::duel::Duel;
use super::round::RoundPhase;
use super::Side;

/// Everything a status bar needs, captured from a [`Duel`] at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub time: f32,
    pub round_number: u32,
    pub round_label: String,
    pub status: String,
    pub sub_status: String,
    pub score_line: String,
    pub target_label: String,
    /// Standoff fill, 0..=1
    pub tension: Option<f32>,
    pub go_banner: bool,
    pub personality: String,
    pub enemy_flinching: bool,
    pub player_phase: CombatPhase,
    pub enemy_phase: CombatPhase,
    /// Present only while a shot is available
    pub spread: Option<f32>,
    pub hit_chance: Option<f32>,
    pub crosshair: Option<Point>,
    pub projectiles: usize,
    pub player_flash: f32,
    pub enemy_flash: f32,
}

impl HudSnapshot {
    pub fn capture(duel: &Duel) -> Self {
        let practice = duel.settings().practice;
        let (player_score, enemy_score) = duel.scores();
        let round_number = duel.session().rounds_played() + 1;
        let preview = duel.aim_preview();

        let round_label = if practice {
            format!("Round {} (Practice)", round_number)
        } else {
            format!("Round {}", round_number)
        };

        let status = if practice {
            "Practice Range (DUEL)"
        } else {
            match duel.round_phase() {
                RoundPhase::Standoff => "Wait for DRAW!",
                RoundPhase::Duel => "Duel",
                RoundPhase::Over => "Round over",
            }
        };

        let sub_status = match (duel.phase(Side::Player), preview) {
            (CombatPhase::Aiming, Some(aim)) => format!(
                "Spread {:.1}px • ~Hit {}% • Release to shoot • Holster",
                aim.spread,
                (aim.hit_chance * 100.0).round() as u32
            ),
            (CombatPhase::Drawing, _) if duel.release_queued() => "Quick shot queued…".to_string(),
            (CombatPhase::Drawing, _) => "Drawing…".to_string(),
            (CombatPhase::Holstering, _) => "Holstering…".to_string(),
            _ if practice => "Hold/release to test aim. Holster without firing.".to_string(),
            _ => String::new(),
        };

        let personality = if practice {
            format!("{} (practice)", duel.personality().name)
        } else {
            duel.personality().name.clone()
        };

        Self {
            time: duel.time(),
            round_number,
            round_label,
            status: status.to_string(),
            sub_status,
            score_line: format!("YOU {} - {} THEM", player_score, enemy_score),
            target_label: duel.session().target().to_string(),
            tension: duel.tension(),
            go_banner: duel.go_banner_visible(),
            personality,
            enemy_flinching: duel.enemy_flinching(),
            player_phase: duel.phase(Side::Player),
            enemy_phase: duel.phase(Side::Enemy),
            spread: preview.map(|p| p.spread),
            hit_chance: preview.map(|p| p.hit_chance),
            crosshair: preview.map(|p| p.crosshair),
            projectiles: duel.projectiles().len(),
            player_flash: duel.combatant(Side::Player).hit_flash,
            enemy_flash: duel.combatant(Side::Enemy).hit_flash,
        }
    }
}
