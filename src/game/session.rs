//! Match scoring across rounds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::outcome::RoundResult;
use super::Side;

/// Score a side must reach to take the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    FirstTo(u32),
    Endless,
}

impl MatchTarget {
    /// Selectable targets, in cycling order
    pub const CYCLE: [MatchTarget; 5] = [
        MatchTarget::FirstTo(3),
        MatchTarget::FirstTo(5),
        MatchTarget::FirstTo(7),
        MatchTarget::FirstTo(10),
        MatchTarget::Endless,
    ];

    pub fn next(self) -> MatchTarget {
        let idx = Self::CYCLE.iter().position(|t| *t == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }

    pub fn reached_by(self, score: u32) -> bool {
        match self {
            MatchTarget::FirstTo(n) => score >= n,
            MatchTarget::Endless => false,
        }
    }
}

impl Default for MatchTarget {
    fn default() -> Self {
        MatchTarget::FirstTo(3)
    }
}

impl fmt::Display for MatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTarget::FirstTo(n) => write!(f, "First to {}", n),
            MatchTarget::Endless => f.write_str("Endless"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid match target {0:?}: expected a positive number or \"endless\"")]
pub struct ParseMatchTargetError(pub String);

impl FromStr for MatchTarget {
    type Err = ParseMatchTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("endless") || trimmed.eq_ignore_ascii_case("inf") {
            return Ok(MatchTarget::Endless);
        }
        match trimmed.parse::<u32>() {
            Ok(n) if n > 0 => Ok(MatchTarget::FirstTo(n)),
            _ => Err(ParseMatchTargetError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchSession {
    pub id: Uuid,
    player_score: u32,
    enemy_score: u32,
    /// Every decided round, draws included
    rounds_played: u32,
    target: MatchTarget,
}

impl MatchSession {
    pub fn new(target: MatchTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_score: 0,
            enemy_score: 0,
            rounds_played: 0,
            target,
        }
    }

    pub fn player_score(&self) -> u32 {
        self.player_score
    }

    pub fn enemy_score(&self) -> u32 {
        self.enemy_score
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn target(&self) -> MatchTarget {
        self.target
    }

    /// Takes effect immediately, including for an already-decided score
    pub fn set_target(&mut self, target: MatchTarget) {
        self.target = target;
    }

    /// Score a decided round; returns whether the match is now over
    pub fn record(&mut self, result: RoundResult) -> bool {
        match result {
            RoundResult::Won => self.player_score += 1,
            RoundResult::Lost => self.enemy_score += 1,
            RoundResult::Draw => {}
        }
        self.rounds_played += 1;
        self.is_over()
    }

    pub fn is_over(&self) -> bool {
        self.target.reached_by(self.player_score) || self.target.reached_by(self.enemy_score)
    }

    /// Side that reached the target, once the match is over
    pub fn winner(&self) -> Option<Side> {
        if self.target.reached_by(self.player_score) {
            Some(Side::Player)
        } else if self.target.reached_by(self.enemy_score) {
            Some(Side::Enemy)
        } else {
            None
        }
    }

    pub fn leader(&self) -> Option<Side> {
        match self.player_score.cmp(&self.enemy_score) {
            std::cmp::Ordering::Greater => Some(Side::Player),
            std::cmp::Ordering::Less => Some(Side::Enemy),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Player minus enemy
    pub fn differential(&self) -> i64 {
        self.player_score as i64 - self.enemy_score as i64
    }

    /// Fresh match with the same target
    pub fn reset(&mut self) {
        *self = Self::new(self.target);
    }
}
