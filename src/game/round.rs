//! Round state machine: standoff -> duel -> over

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::math::uniform;

use super::outcome::{EndReason, RoundOutcome, RoundResult};

/// How long the go banner stays up
pub const GO_BANNER_TIME: f32 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Waiting for the go signal
    Standoff,
    Duel,
    /// Terminal until reset
    Over,
}

/// Range the go time is sampled from (seconds into the round)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoWindow {
    pub min: f32,
    pub max: f32,
}

impl Default for GoWindow {
    fn default() -> Self {
        Self { min: 1.5, max: 3.8 }
    }
}

impl GoWindow {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        uniform(rng, self.min, self.max.max(self.min))
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    /// Log correlation only
    pub id: Uuid,
    phase: RoundPhase,
    /// Round clock (sum of clamped steps)
    time: f32,
    go_time: f32,
    go_fired: bool,
    go_at: Option<f32>,
    go_banner_until: f32,
    result: Option<RoundResult>,
    reason: Option<EndReason>,
    ended_at: Option<f32>,
    outcome: Option<RoundOutcome>,
    outcome_published: bool,
}

impl Round {
    pub fn new(go_time: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: RoundPhase::Standoff,
            time: 0.0,
            go_time,
            go_fired: false,
            go_at: None,
            go_banner_until: 0.0,
            result: None,
            reason: None,
            ended_at: None,
            outcome: None,
            outcome_published: false,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn go_time(&self) -> f32 {
        self.go_time
    }

    pub fn go_fired(&self) -> bool {
        self.go_fired
    }

    pub fn go_at(&self) -> Option<f32> {
        self.go_at
    }

    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn reason(&self) -> Option<EndReason> {
        self.reason
    }

    pub fn ended_at(&self) -> Option<f32> {
        self.ended_at
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    /// Advance the round clock; returns the new time
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.time += dt;
        self.time
    }

    /// Standoff progress toward the go signal, 0..=1. `None` outside standoff.
    pub fn tension(&self) -> Option<f32> {
        if self.phase != RoundPhase::Standoff {
            return None;
        }
        if self.go_time <= 0.0 {
            return Some(1.0);
        }
        Some((self.time / self.go_time).clamp(0.0, 1.0))
    }

    pub fn go_due(&self) -> bool {
        self.phase == RoundPhase::Standoff && !self.go_fired && self.time >= self.go_time
    }

    pub fn banner_visible(&self) -> bool {
        self.go_fired && self.time < self.go_banner_until
    }

    /// Natural go: goAt is the scheduled time even when observed a little late
    pub fn trigger_go(&mut self, now: f32) -> bool {
        if self.go_fired || self.phase != RoundPhase::Standoff {
            return false;
        }
        self.go_fired = true;
        self.phase = RoundPhase::Duel;
        self.go_at = Some(self.go_time);
        self.go_banner_until = now + GO_BANNER_TIME;
        true
    }

    /// Practice: skip the standoff, go fires immediately with no banner
    pub fn force_go(&mut self, now: f32) -> bool {
        if self.phase != RoundPhase::Standoff {
            return false;
        }
        self.go_fired = true;
        self.phase = RoundPhase::Duel;
        self.go_at = Some(now);
        self.go_time = now;
        self.go_banner_until = 0.0;
        true
    }

    /// Enter the terminal phase. Happens at most once per round.
    pub fn finish(&mut self, result: RoundResult, reason: EndReason, now: f32) -> bool {
        if self.phase == RoundPhase::Over {
            return false;
        }
        self.phase = RoundPhase::Over;
        self.result = Some(result);
        self.reason = Some(reason);
        self.ended_at = Some(now);
        true
    }

    pub fn set_outcome(&mut self, outcome: RoundOutcome) {
        self.outcome = Some(outcome);
        self.outcome_published = false;
    }

    /// Hand out the outcome once its display time has arrived
    pub fn take_ready_outcome(&mut self) -> Option<RoundOutcome> {
        if self.outcome_published {
            return None;
        }
        let outcome = self.outcome.as_ref()?;
        if self.time < outcome.display_at {
            return None;
        }
        self.outcome_published = true;
        Some(outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::outcome::LatencyBreakdown;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn outcome(display_at: f32) -> RoundOutcome {
        RoundOutcome {
            headline: "DRAW".into(),
            result: RoundResult::Draw,
            reason: EndReason::BothMissed,
            player: LatencyBreakdown::default(),
            enemy: LatencyBreakdown::default(),
            player_score: 0,
            enemy_score: 0,
            match_over: false,
            ended_at: 3.0,
            display_at,
        }
    }

    #[test]
    fn test_go_window_sample_in_range() {
        let w = GoWindow::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..500 {
            let t = w.sample(&mut rng);
            assert!((1.5..=3.8).contains(&t));
        }
        let fixed = GoWindow { min: 2.0, max: 2.0 };
        assert_eq!(fixed.sample(&mut rng), 2.0);
    }

    #[test]
    fn test_tension_rises_then_disappears() {
        let mut r = Round::new(2.0);
        assert_eq!(r.tension(), Some(0.0));
        r.tick(1.0);
        assert_eq!(r.tension(), Some(0.5));
        r.tick(1.5);
        assert_eq!(r.tension(), Some(1.0));
        assert!(r.go_due());
        assert!(r.trigger_go(2.5));
        assert_eq!(r.tension(), None);
    }

    #[test]
    fn test_natural_go_uses_scheduled_time() {
        let mut r = Round::new(2.0);
        r.tick(2.016);
        assert!(r.trigger_go(r.time()));
        assert_eq!(r.go_at(), Some(2.0));
        assert_eq!(r.phase(), RoundPhase::Duel);
        assert!(r.banner_visible());
        r.tick(0.7);
        assert!(!r.banner_visible());
        assert!(!r.trigger_go(3.0));
    }

    #[test]
    fn test_force_go_uses_now() {
        let mut r = Round::new(3.0);
        r.tick(0.4);
        assert!(r.force_go(0.4));
        assert_eq!(r.go_at(), Some(0.4));
        assert_eq!(r.go_time(), 0.4);
        assert!(!r.banner_visible());
    }

    #[test]
    fn test_finish_only_once_and_forward_only() {
        let mut r = Round::new(2.0);
        assert!(r.finish(RoundResult::Lost, EndReason::FalseStart, 0.5));
        assert!(!r.finish(RoundResult::Won, EndReason::Shot, 0.6));
        assert_eq!(r.result(), Some(RoundResult::Lost));
        assert_eq!(r.ended_at(), Some(0.5));
        assert!(!r.trigger_go(2.0));
        assert!(!r.force_go(2.0));
        assert_eq!(r.phase(), RoundPhase::Over);
    }

    #[test]
    fn test_outcome_published_once_after_delay() {
        let mut r = Round::new(2.0);
        r.tick(3.0);
        r.finish(RoundResult::Draw, EndReason::BothMissed, 3.0);
        r.set_outcome(outcome(3.2));
        assert!(r.take_ready_outcome().is_none());
        r.tick(0.25);
        assert!(r.take_ready_outcome().is_some());
        assert!(r.take_ready_outcome().is_none());
    }
}
