//! The duel simulation instance: owns every piece of round state and
//! advances it in a fixed order per tick.
//!
//! Tick order: standoff logic, player combat, enemy combat, projectiles,
//! cosmetic decay, arbitration, outcome readiness. All intents are
//! no-op guarded so collaborators can forward raw input freely.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::math::{sign, Point};
use crate::util::time::clamp_step;

use super::ai::EnemyScheduler;
use super::aim::AimModel;
use super::arbiter::{ArbiterInput, RoundArbiter};
use super::ballistics::{BallisticResolver, Impact, Projectile, TargetState};
use super::combatant::{
    CombatPhase, Combatant, CombatantController, ControllerSignal, DrawProfile, InputState,
};
use super::events::DuelEvent;
use super::outcome::{EndReason, LatencyBreakdown, RoundOutcome, RoundResult};
use super::personality::{Personality, PersonalityPool};
use super::round::{GoWindow, Round, RoundPhase};
use super::session::{MatchSession, MatchTarget};
use super::snapshot::HudSnapshot;
use super::{Side, TargetSource, TorsoTarget};

pub const PLAYER_START: Point = Point::new(170.0, 320.0);
pub const ENEMY_START: Point = Point::new(470.0, 320.0);
/// Seconds a struck combatant flashes
const HIT_FLASH: f32 = 0.22;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelSettings {
    /// Practice range: no standoff, no false starts, hits never kill, rounds never end
    pub practice: bool,
    /// Opponent scheduler enabled
    pub enemy_ai: bool,
    pub match_target: MatchTarget,
    pub seed: u64,
    pub go_window: GoWindow,
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            practice: false,
            enemy_ai: true,
            match_target: MatchTarget::default(),
            seed: 0,
            go_window: GoWindow::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuelError {
    #[error("match already concluded; start a new match")]
    MatchConcluded,
}

/// Current aim read-out while the human has a shot available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimPreview {
    pub spread: f32,
    pub hit_chance: f32,
    pub crosshair: Point,
}

pub struct Duel {
    settings: DuelSettings,
    rng: ChaCha8Rng,
    round: Round,
    player: CombatantController,
    enemy: CombatantController,
    scheduler: EnemyScheduler,
    resolver: BallisticResolver,
    aim: AimModel,
    arbiter: RoundArbiter,
    session: MatchSession,
    pool: PersonalityPool,
    personality: Personality,
    input: InputState,
    target_source: Box<dyn TargetSource>,
    events: Vec<DuelEvent>,
}

impl Duel {
    pub fn new(settings: DuelSettings) -> Self {
        Self::with_pool(settings, PersonalityPool::default())
    }

    pub fn with_pool(settings: DuelSettings, pool: PersonalityPool) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let session = MatchSession::new(settings.match_target);
        let personality = pool.pick(0, 0, 0, &mut rng);
        let go_time = settings.go_window.sample(&mut rng);

        let mut duel = Self {
            rng,
            round: Round::new(go_time),
            player: Self::make_player(),
            enemy: Self::make_enemy(&personality),
            scheduler: EnemyScheduler::default(),
            resolver: BallisticResolver::new(!settings.practice),
            aim: AimModel::default(),
            arbiter: RoundArbiter::default(),
            session,
            pool,
            personality,
            input: InputState::default(),
            target_source: Box::new(TorsoTarget),
            events: Vec::new(),
            settings,
        };

        info!(match_id = %duel.session.id, seed = duel.settings.seed, "Match started");
        duel.begin_round();
        duel
    }

    /// Replace where the human's crosshair is anchored
    pub fn set_target_source(&mut self, source: Box<dyn TargetSource>) {
        self.target_source = source;
    }

    fn make_player() -> CombatantController {
        let facing = sign(ENEMY_START.x - PLAYER_START.x);
        CombatantController::new(Combatant::new(PLAYER_START, facing), DrawProfile::player())
    }

    fn make_enemy(personality: &Personality) -> CombatantController {
        let facing = sign(PLAYER_START.x - ENEMY_START.x);
        CombatantController::new(
            Combatant::new(ENEMY_START, facing),
            DrawProfile::enemy(personality.draw_speed),
        )
    }

    /// Log and (in practice) skip the standoff for a freshly built round
    fn begin_round(&mut self) {
        info!(
            match_id = %self.session.id,
            round_id = %self.round.id,
            personality = %self.personality.name,
            go_time = self.round.go_time(),
            practice = self.settings.practice,
            "Round started"
        );
        if self.settings.practice {
            self.force_go(0.0);
        }
    }

    /// Rebuild all round state, reselecting the opponent
    fn start_round(&mut self) {
        let previous = self.round.phase();

        self.personality = self.pool.pick(
            self.session.player_score(),
            self.session.enemy_score(),
            self.session.rounds_played(),
            &mut self.rng,
        );
        let go_time = self.settings.go_window.sample(&mut self.rng);
        self.round = Round::new(go_time);
        self.player = Self::make_player();
        self.enemy = Self::make_enemy(&self.personality);
        self.scheduler.clear();
        self.resolver.clear();
        self.resolver.lethal = !self.settings.practice;
        self.input = InputState::default();

        if previous != RoundPhase::Standoff {
            self.emit(DuelEvent::RoundPhaseChanged {
                from: previous,
                to: RoundPhase::Standoff,
                at: 0.0,
            });
        }
        self.begin_round();
        self.publish_transitions();
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds (clamped to [0, 0.05])
    pub fn advance(&mut self, dt: f32) {
        let dt = clamp_step(dt);
        let now = self.round.tick(dt);

        if !self.settings.practice && self.round.phase() == RoundPhase::Standoff {
            self.update_standoff(dt, now);
        }

        self.update_player(dt, now);
        self.update_enemy(dt, now);
        self.update_projectiles(dt, now);

        self.player.decay_flash(dt);
        self.enemy.decay_flash(dt);

        if !self.settings.practice {
            self.evaluate_round_end(now);
        }

        if let Some(outcome) = self.round.take_ready_outcome() {
            self.emit(DuelEvent::OutcomeReady { outcome });
        }
        self.publish_transitions();
    }

    fn update_standoff(&mut self, dt: f32, now: f32) {
        if self.settings.enemy_ai
            && EnemyScheduler::rolls_false_start(&self.personality, dt, &mut self.rng)
        {
            self.end_round(RoundResult::Won, EndReason::EnemyFalseStart, now);
            return;
        }
        if self.round.go_due() {
            self.trigger_go(now);
        }
    }

    fn update_player(&mut self, dt: f32, now: f32) {
        match self.player.advance(dt, now, self.input.held, &mut self.rng) {
            ControllerSignal::Drawn { fire_now: true } => {
                if self.round.phase() == RoundPhase::Duel && self.enemy.is_alive() {
                    self.fire_player(now);
                }
            }
            ControllerSignal::Recovered if self.settings.practice => self.player.rearm(),
            _ => {}
        }

        if self.input.held {
            self.player.hold_aim(now);
        }
    }

    fn update_enemy(&mut self, dt: f32, now: f32) {
        match self.enemy.advance(dt, now, true, &mut self.rng) {
            ControllerSignal::Drawn { .. } => {
                self.scheduler.plan_fire(now, &self.personality, &mut self.rng);
            }
            ControllerSignal::Recovered if self.settings.practice => {
                self.enemy.rearm();
                self.scheduler.plan_refire(now, &mut self.rng);
            }
            _ => {}
        }

        if !self.settings.enemy_ai || self.round.phase() != RoundPhase::Duel {
            return;
        }

        match self.enemy.phase() {
            CombatPhase::Aiming if !self.enemy.combatant().has_shot => {
                self.scheduler
                    .ensure_fire_planned(now, &self.personality, &mut self.rng);
                if self.scheduler.fire_due(now) && self.player.is_alive() {
                    self.fire_enemy(now);
                }
            }
            CombatPhase::Holstered => {
                if self.scheduler.take_draw_due(now) {
                    self.enemy.begin_draw(now);
                }
            }
            _ => {}
        }
    }

    fn update_projectiles(&mut self, dt: f32, now: f32) {
        let targets = [
            self.target_state(Side::Player),
            self.target_state(Side::Enemy),
        ];
        for impact in self.resolver.advance(dt, now, targets) {
            self.apply_impact(impact);
        }
    }

    fn target_state(&self, side: Side) -> TargetState {
        let c = self.controller(side);
        TargetState {
            hit_point: self.resolver.hit_point(c.combatant().position),
            alive: c.is_alive(),
        }
    }

    fn apply_impact(&mut self, impact: Impact) {
        let lethal = self.resolver.lethal;
        let target = self.controller_mut(impact.target);
        target.flash(HIT_FLASH);
        if lethal {
            target.kill(impact.at);
        }

        debug!(
            round_id = %self.round.id,
            shooter = ?impact.shooter,
            victim = ?impact.target,
            at = impact.at,
            lethal,
            "Projectile hit"
        );

        self.emit(DuelEvent::ParticleSpawn {
            position: impact.point,
            direction: impact.direction,
        });
        self.emit(DuelEvent::Hit {
            shooter: impact.shooter,
            target: impact.target,
            at: impact.at,
            lethal,
        });
    }

    fn evaluate_round_end(&mut self, now: f32) {
        if self.round.phase() != RoundPhase::Duel {
            return;
        }
        let input = ArbiterInput {
            player_dead_at: self.player.combatant().dead_at,
            enemy_dead_at: self.enemy.combatant().dead_at,
            player_has_shot: self.player.combatant().has_shot,
            enemy_has_shot: self.enemy.combatant().has_shot,
            projectiles_in_flight: self.resolver.in_flight(),
        };
        if let Some(verdict) = self.arbiter.evaluate(&input) {
            self.end_round(verdict.result, verdict.reason, now);
        }
    }

    // ------------------------------------------------------------------
    // Round flow
    // ------------------------------------------------------------------

    fn trigger_go(&mut self, now: f32) {
        if !self.round.trigger_go(now) {
            return;
        }
        self.after_go(now);
    }

    fn force_go(&mut self, now: f32) {
        if !self.round.force_go(now) {
            return;
        }
        self.after_go(now);
    }

    fn after_go(&mut self, now: f32) {
        let go_at = self.round.go_at().unwrap_or(now);

        info!(
            round_id = %self.round.id,
            go_at,
            personality = %self.personality.name,
            "Go signal"
        );
        self.emit(DuelEvent::RoundPhaseChanged {
            from: RoundPhase::Standoff,
            to: RoundPhase::Duel,
            at: now,
        });
        self.emit(DuelEvent::GoSignal {
            at: go_at,
            personality: self.personality.name.clone(),
        });

        if self.settings.enemy_ai {
            self.scheduler
                .schedule_from_go(go_at, now, &self.personality, &mut self.rng);
        } else {
            self.scheduler.clear();
        }
    }

    fn end_round(&mut self, result: RoundResult, reason: EndReason, now: f32) {
        if self.settings.practice {
            return;
        }
        let from = self.round.phase();
        if !self.round.finish(result, reason, now) {
            return;
        }

        let match_over = self.session.record(result);
        let player_took_match = self.session.winner() == Some(Side::Player);

        let death_durations: Vec<f32> = [&self.player, &self.enemy]
            .into_iter()
            .filter(|c| !c.is_alive())
            .map(|c| c.profile().death_duration)
            .collect();

        let go_at = self.round.go_at();
        let outcome = RoundOutcome {
            headline: RoundOutcome::headline(result, match_over, player_took_match).to_string(),
            result,
            reason,
            player: LatencyBreakdown::from_metrics(&self.player.combatant().metrics, go_at),
            enemy: LatencyBreakdown::from_metrics(&self.enemy.combatant().metrics, go_at),
            player_score: self.session.player_score(),
            enemy_score: self.session.enemy_score(),
            match_over,
            ended_at: now,
            display_at: now + RoundOutcome::display_delay(reason, &death_durations),
        };

        info!(
            match_id = %self.session.id,
            round_id = %self.round.id,
            result = ?result,
            reason = %reason,
            player_score = outcome.player_score,
            enemy_score = outcome.enemy_score,
            match_over,
            "Round ended"
        );

        self.emit(DuelEvent::RoundPhaseChanged {
            from,
            to: RoundPhase::Over,
            at: now,
        });
        self.emit(DuelEvent::RoundEnded {
            result,
            reason,
            player_score: outcome.player_score,
            enemy_score: outcome.enemy_score,
            match_over,
        });
        self.round.set_outcome(outcome);
    }

    // ------------------------------------------------------------------
    // Shots
    // ------------------------------------------------------------------

    fn aim_base(&self) -> Point {
        let torso = self.resolver.hit_point(self.enemy.combatant().position);
        self.target_source.aim_base(torso)
    }

    fn crosshair(&self, now: f32, spread: f32) -> Point {
        let (s1, s2) = self.player.combatant().aim_seeds;
        self.aim.crosshair_center(now, self.aim_base(), spread, s1, s2)
    }

    fn fire_player(&mut self, now: f32) {
        // sample before committing, the commit clears the aim clock
        let spread = self.spread();
        let crosshair = self.crosshair(now, spread);
        if !self.player.commit_shot(now) {
            return;
        }

        let aim = self.resolver.impact_point(crosshair, spread, &mut self.rng);
        let c = self.player.combatant();
        let (position, facing) = (c.position, c.facing);
        let (projectile_id, origin) = {
            let p = self.resolver.fire(Side::Player, position, facing, aim);
            (p.id, p.origin)
        };

        debug!(round_id = %self.round.id, spread, at = now, "Player fired");
        self.emit(DuelEvent::ShotFired {
            side: Side::Player,
            projectile_id,
            origin,
            aim,
            at: now,
        });
    }

    fn fire_enemy(&mut self, now: f32) {
        let accuracy = self.scheduler.fire_accuracy(
            &self.personality,
            !self.enemy.is_alive(),
            &mut self.rng,
        );
        if !self.enemy.commit_shot(now) {
            return;
        }

        let c = self.enemy.combatant();
        let (position, facing) = (c.position, c.facing);
        let muzzle = self.resolver.muzzle(position, facing);
        let target = self.resolver.hit_point(self.player.combatant().position);
        let (aim, will_hit) = self.scheduler.plan_impact(
            accuracy,
            muzzle,
            target,
            self.resolver.hit_radius,
            &mut self.rng,
        );
        let (projectile_id, origin) = {
            let p = self.resolver.fire(Side::Enemy, position, facing, aim);
            (p.id, p.origin)
        };

        debug!(
            round_id = %self.round.id,
            personality = %self.personality.name,
            accuracy,
            will_hit,
            at = now,
            "Enemy fired"
        );
        self.emit(DuelEvent::ShotFired {
            side: Side::Enemy,
            projectile_id,
            origin,
            aim,
            at: now,
        });
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    /// Draw button went down
    pub fn press_draw(&mut self) {
        self.input.held = true;

        if self.round.phase() == RoundPhase::Over || self.session.is_over() {
            return;
        }
        let now = self.round.time();

        if self.settings.practice && self.round.phase() != RoundPhase::Duel {
            self.force_go(now);
        }
        if !self.settings.practice && self.round.go_due() {
            self.trigger_go(now);
        }
        if !self.settings.practice && self.round.phase() == RoundPhase::Standoff {
            self.end_round(RoundResult::Lost, EndReason::FalseStart, now);
            self.publish_transitions();
            return;
        }
        if self.round.phase() != RoundPhase::Duel {
            return;
        }

        match self.player.phase() {
            CombatPhase::Holstered => {
                self.player.begin_draw(now);
            }
            CombatPhase::Aiming => self.player.hold_aim(now),
            _ => {}
        }
        self.publish_transitions();
    }

    /// Draw button came up
    pub fn release_draw(&mut self) {
        // a key-up without a matching key-down
        if !self.input.held {
            return;
        }
        self.input.held = false;

        if self.input.suppress_next_release {
            self.input.suppress_next_release = false;
            return;
        }
        if self.round.phase() != RoundPhase::Duel {
            return;
        }
        let now = self.round.time();

        match self.player.phase() {
            CombatPhase::Drawing => {
                self.player.queue_release();
            }
            CombatPhase::Aiming => {
                if self.player.is_alive() && self.enemy.is_alive() {
                    self.fire_player(now);
                }
            }
            _ => {}
        }
        self.publish_transitions();
    }

    /// Put the gun away without firing
    pub fn request_holster(&mut self) {
        let now = self.round.time();
        if self.player.request_holster(now) && self.input.held {
            self.input.suppress_next_release = true;
        }
        self.publish_transitions();
    }

    /// Start the next round, or a whole new match
    pub fn reset(&mut self, new_match: bool) -> Result<(), DuelError> {
        if new_match {
            self.new_match();
            return Ok(());
        }
        if self.session.is_over() {
            return Err(DuelError::MatchConcluded);
        }
        self.start_round();
        Ok(())
    }

    pub fn new_match(&mut self) {
        self.session.reset();
        info!(match_id = %self.session.id, match_target = %self.session.target(), "New match");
        self.start_round();
    }

    /// Toggle practice; restarts the current round
    pub fn set_practice(&mut self, practice: bool) -> Result<(), DuelError> {
        if self.session.is_over() {
            return Err(DuelError::MatchConcluded);
        }
        self.settings.practice = practice;
        self.reset(false)
    }

    /// Toggle the opponent scheduler; restarts the current round
    pub fn set_enemy_ai(&mut self, enemy_ai: bool) -> Result<(), DuelError> {
        if self.session.is_over() {
            return Err(DuelError::MatchConcluded);
        }
        self.settings.enemy_ai = enemy_ai;
        self.reset(false)
    }

    pub fn set_match_target(&mut self, target: MatchTarget) {
        self.settings.match_target = target;
        self.session.set_target(target);
    }

    pub fn cycle_match_target(&mut self) -> MatchTarget {
        let next = self.session.target().next();
        self.set_match_target(next);
        next
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn emit(&mut self, event: DuelEvent) {
        self.publish_transitions();
        self.events.push(event);
    }

    fn publish_transitions(&mut self) {
        for side in [Side::Player, Side::Enemy] {
            for (from, to, at) in self.controller_mut(side).take_transitions() {
                self.events
                    .push(DuelEvent::CombatantPhaseChanged { side, from, to, at });
            }
        }
    }

    /// Take every notification published since the last drain
    pub fn drain_events(&mut self) -> Vec<DuelEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    fn controller(&self, side: Side) -> &CombatantController {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn controller_mut(&mut self, side: Side) -> &mut CombatantController {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn settings(&self) -> &DuelSettings {
        &self.settings
    }

    pub fn round_id(&self) -> Uuid {
        self.round.id
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.round.phase()
    }

    /// Round clock in seconds
    pub fn time(&self) -> f32 {
        self.round.time()
    }

    pub fn go_at(&self) -> Option<f32> {
        self.round.go_at()
    }

    pub fn go_banner_visible(&self) -> bool {
        self.round.banner_visible()
    }

    pub fn tension(&self) -> Option<f32> {
        if self.settings.practice {
            return None;
        }
        self.round.tension()
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        self.controller(side).combatant()
    }

    pub fn phase(&self, side: Side) -> CombatPhase {
        self.controller(side).phase()
    }

    pub fn draw_progress(&self, side: Side) -> u32 {
        self.controller(side).draw_progress()
    }

    pub fn release_queued(&self) -> bool {
        self.player.release_queued()
    }

    pub fn input(&self) -> InputState {
        self.input
    }

    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    /// (player, enemy)
    pub fn scores(&self) -> (u32, u32) {
        (self.session.player_score(), self.session.enemy_score())
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.round.outcome()
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn enemy_flinching(&self) -> bool {
        self.scheduler.is_flinching(self.round.time())
    }

    pub fn projectiles(&self) -> &[Projectile] {
        self.resolver.projectiles()
    }

    pub fn hit_radius(&self) -> f32 {
        self.resolver.hit_radius
    }

    /// Human's current spread radius
    pub fn spread(&self) -> f32 {
        self.aim
            .spread(self.round.time(), self.player.combatant().aim_start)
    }

    pub fn hit_chance(&self) -> f32 {
        AimModel::approx_hit_chance(self.resolver.hit_radius, self.spread())
    }

    /// Crosshair read-out, only while a shot is available
    pub fn aim_preview(&self) -> Option<AimPreview> {
        let c = self.player.combatant();
        if c.phase != CombatPhase::Aiming || c.has_shot {
            return None;
        }
        let spread = self.spread();
        Some(AimPreview {
            spread,
            hit_chance: AimModel::approx_hit_chance(self.resolver.hit_radius, spread),
            crosshair: self.crosshair(self.round.time(), spread),
        })
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::capture(self)
    }
}
