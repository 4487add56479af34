//! Round results and the display-ready outcome payload

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::util::time::format_latency;

use super::combatant::Metrics;

/// Round result from the human's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResult {
    Won,
    Lost,
    Draw,
}

/// Why the round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Human acted before the go signal
    FalseStart,
    /// Opponent broke before the go signal
    EnemyFalseStart,
    Shot,
    SimultaneousHit,
    PlayerDownFirst,
    EnemyDownFirst,
    BothMissed,
}

impl EndReason {
    pub fn is_false_start(self) -> bool {
        matches!(self, EndReason::FalseStart | EndReason::EnemyFalseStart)
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::FalseStart => "FALSE START",
            EndReason::EnemyFalseStart => "ENEMY FALSE START",
            EndReason::Shot => "SHOT",
            EndReason::SimultaneousHit => "SIMULTANEOUS HIT",
            EndReason::PlayerDownFirst => "YOU WENT DOWN FIRST",
            EndReason::EnemyDownFirst => "THEM WENT DOWN FIRST",
            EndReason::BothMissed => "BOTH MISSED",
        };
        f.write_str(s)
    }
}

/// Per-side latencies in seconds, measured on the round clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyBreakdown {
    /// Go signal -> draw start
    pub react: Option<f32>,
    /// Draw start -> drawn
    pub draw: Option<f32>,
    /// Drawn -> shot
    pub aim: Option<f32>,
    /// Go signal -> shot
    pub shot: Option<f32>,
}

impl LatencyBreakdown {
    pub fn from_metrics(m: &Metrics, go_at: Option<f32>) -> Self {
        let between = |a: Option<f32>, b: Option<f32>| match (a, b) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        };
        Self {
            react: between(go_at, m.reacted_at),
            draw: between(m.reacted_at, m.drawn_at),
            aim: between(m.drawn_at, m.shot_at),
            shot: between(go_at, m.shot_at),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "react {} • draw {} • aim {} • shot {}",
            format_latency(self.react),
            format_latency(self.draw),
            format_latency(self.aim),
            format_latency(self.shot)
        )
    }
}

/// Everything the result banner needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub headline: String,
    pub result: RoundResult,
    pub reason: EndReason,
    pub player: LatencyBreakdown,
    pub enemy: LatencyBreakdown,
    pub player_score: u32,
    pub enemy_score: u32,
    pub match_over: bool,
    pub ended_at: f32,
    /// Round time at which the banner may be shown
    pub display_at: f32,
}

/// Banner pause for false starts, and padding after death animations
const FALSE_START_DELAY: f32 = 0.2;
const DEATH_PADDING: f32 = 0.2;

impl RoundOutcome {
    pub fn headline(result: RoundResult, match_over: bool, player_took_match: bool) -> &'static str {
        if match_over {
            return if player_took_match { "MATCH WON" } else { "MATCH LOST" };
        }
        match result {
            RoundResult::Won => "ENEMY DOWN",
            RoundResult::Lost => "YOU DIED",
            RoundResult::Draw => "DRAW",
        }
    }

    /// Seconds to hold the banner so death animations (durations of the dead sides) finish
    pub fn display_delay(reason: EndReason, death_durations: &[f32]) -> f32 {
        if reason.is_false_start() {
            return FALSE_START_DELAY;
        }
        death_durations.iter().copied().fold(0.0, f32::max) + DEATH_PADDING
    }

    /// Multi-line text for logs and plain displays
    pub fn message(&self) -> String {
        let prompt = if self.match_over {
            "New match to continue"
        } else {
            "Reset to continue • new match to start over"
        };
        format!(
            "{}\n{}\nYou  — {}\nThem — {}\n{}",
            self.headline,
            self.reason,
            self.player.summary(),
            self.enemy.summary(),
            prompt
        )
    }
}
