//! Real-time runner: drives a duel from a tokio interval and records a match summary

pub mod autopilot;

pub use autopilot::{Autopilot, Intent};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::outcome::LatencyBreakdown;
use crate::game::{Duel, DuelEvent, EndReason, RoundOutcome, RoundResult};
use crate::util::time::{tick_delta, Timer};

/// Commands accepted from outside the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelCommand {
    PressDraw,
    ReleaseDraw,
    Holster,
    Reset { new_match: bool },
    SetPractice(bool),
    SetEnemyAi(bool),
    CycleTarget,
}

impl DuelCommand {
    /// Parse a console line ("draw", "release", "holster", "reset", "new", ...)
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let cmd = match words.next()?.to_ascii_lowercase().as_str() {
            "d" | "draw" | "press" => DuelCommand::PressDraw,
            "f" | "fire" | "release" => DuelCommand::ReleaseDraw,
            "q" | "holster" => DuelCommand::Holster,
            "r" | "reset" => DuelCommand::Reset { new_match: false },
            "n" | "new" => DuelCommand::Reset { new_match: true },
            "t" | "target" => DuelCommand::CycleTarget,
            "practice" => DuelCommand::SetPractice(parse_switch(words.next())?),
            "ai" => DuelCommand::SetEnemyAi(parse_switch(words.next())?),
            _ => return None,
        };
        Some(cmd)
    }
}

fn parse_switch(word: Option<&str>) -> Option<bool> {
    match word? {
        "on" | "1" | "true" => Some(true),
        "off" | "0" | "false" => Some(false),
        _ => None,
    }
}

/// One decided round as recorded by the runner
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub round_id: Uuid,
    pub headline: String,
    pub result: RoundResult,
    pub reason: EndReason,
    pub personality: String,
    pub player: LatencyBreakdown,
    pub enemy: LatencyBreakdown,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub wall_ms: u64,
    pub ticks: u64,
    pub player_score: u32,
    pub enemy_score: u32,
    pub match_over: bool,
    pub rounds: Vec<RoundRecord>,
}

/// Handle for feeding commands into a running duel
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    pub commands: mpsc::UnboundedSender<DuelCommand>,
}

pub struct DuelRunner {
    duel: Duel,
    tick_rate: u32,
    autopilot: Option<Autopilot>,
    max_rounds: u32,
    command_rx: mpsc::UnboundedReceiver<DuelCommand>,
    summary: MatchSummary,
    ticks: u64,
    finished: bool,
}

impl DuelRunner {
    pub fn new(
        duel: Duel,
        tick_rate: u32,
        autopilot: Option<Autopilot>,
        max_rounds: u32,
    ) -> (Self, RunnerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let summary = MatchSummary {
            match_id: duel.session().id,
            started_at: Utc::now(),
            finished_at: None,
            wall_ms: 0,
            ticks: 0,
            player_score: 0,
            enemy_score: 0,
            match_over: false,
            rounds: Vec::new(),
        };
        let runner = Self {
            duel,
            tick_rate: tick_rate.max(1),
            autopilot,
            max_rounds,
            command_rx: rx,
            summary,
            ticks: 0,
            finished: false,
        };
        (runner, RunnerHandle { commands: tx })
    }

    pub fn duel(&self) -> &Duel {
        &self.duel
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn summary(&self) -> &MatchSummary {
        &self.summary
    }

    /// Run the tick loop until the match concludes, the round cap is hit, or `shutdown` resolves
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) -> MatchSummary {
        info!(
            match_id = %self.summary.match_id,
            tick_rate = self.tick_rate,
            autopilot = self.autopilot.is_some(),
            "Runner started"
        );

        let timer = Timer::new();
        let dt = tick_delta(self.tick_rate);
        let mut ticker = interval(Duration::from_micros(1_000_000 / self.tick_rate as u64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(match_id = %self.summary.match_id, "Shutdown requested, stopping runner");
                    break;
                }
                _ = ticker.tick() => {
                    self.step(dt);
                    if self.finished {
                        break;
                    }
                }
            }
        }

        self.summary.wall_ms = timer.elapsed_ms();
        self.summary.finished_at = Some(Utc::now());
        info!(
            match_id = %self.summary.match_id,
            player_score = self.summary.player_score,
            enemy_score = self.summary.enemy_score,
            rounds = self.summary.rounds.len(),
            wall_ms = self.summary.wall_ms,
            "Runner stopped"
        );
        self.summary
    }

    /// One tick: commands, autopilot, simulation, event handling
    pub fn step(&mut self, dt: f32) -> Vec<DuelEvent> {
        while let Ok(cmd) = self.command_rx.try_recv() {
            self.apply(cmd);
        }

        if let Some(pilot) = self.autopilot.as_mut() {
            if let Some(intent) = pilot.decide(&self.duel) {
                intent.apply(&mut self.duel);
            }
        }

        self.duel.advance(dt);
        self.ticks += 1;
        self.summary.ticks = self.ticks;

        let events = self.duel.drain_events();
        for event in &events {
            self.handle_event(event);
        }
        events
    }

    fn apply(&mut self, cmd: DuelCommand) {
        debug!(?cmd, "Command");
        let result = match cmd {
            DuelCommand::PressDraw => {
                self.duel.press_draw();
                Ok(())
            }
            DuelCommand::ReleaseDraw => {
                self.duel.release_draw();
                Ok(())
            }
            DuelCommand::Holster => {
                self.duel.request_holster();
                Ok(())
            }
            DuelCommand::Reset { new_match } => self.duel.reset(new_match),
            DuelCommand::SetPractice(on) => self.duel.set_practice(on),
            DuelCommand::SetEnemyAi(on) => self.duel.set_enemy_ai(on),
            DuelCommand::CycleTarget => {
                let target = self.duel.cycle_match_target();
                info!(match_target = %target, "Match target changed");
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!(?cmd, error = %e, "Command rejected");
        }
    }

    fn handle_event(&mut self, event: &DuelEvent) {
        match serde_json::to_string(event) {
            Ok(json) => debug!(event = %json, "Duel event"),
            Err(e) => warn!(error = %e, "Failed to encode event"),
        }

        if let DuelEvent::OutcomeReady { outcome } = event {
            self.record(outcome);
            self.after_outcome(outcome);
        }
    }

    fn record(&mut self, outcome: &RoundOutcome) {
        info!(
            match_id = %self.summary.match_id,
            round_id = %self.duel.round_id(),
            "{}", outcome.message()
        );
        self.summary.player_score = outcome.player_score;
        self.summary.enemy_score = outcome.enemy_score;
        self.summary.match_over = outcome.match_over;
        self.summary.rounds.push(RoundRecord {
            round_id: self.duel.round_id(),
            headline: outcome.headline.clone(),
            result: outcome.result,
            reason: outcome.reason,
            personality: self.duel.personality().name.clone(),
            player: outcome.player,
            enemy: outcome.enemy,
            recorded_at: Utc::now(),
        });
    }

    /// Only the autopilot moves on by itself; a console user resets explicitly
    fn after_outcome(&mut self, outcome: &RoundOutcome) {
        if self.autopilot.is_none() {
            return;
        }
        if outcome.match_over || self.summary.rounds.len() as u32 >= self.max_rounds {
            self.finished = true;
            return;
        }
        if let Err(e) = self.duel.reset(false) {
            warn!(error = %e, "Could not start next round");
            self.finished = true;
        }
    }
}
