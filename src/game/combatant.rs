//! Combatant state and the draw/aim/shoot controller

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::math::Point;

/// Logical combat phase (presentation frames are derived by collaborators)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    /// Gun in holster, idle
    Holstered,
    Drawing,
    Aiming,
    /// Post-shot recovery
    Shooting,
    /// Putting the gun away
    Holstering,
    Dead,
}

/// Per-round timing marks (round clock seconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Draw started
    pub reacted_at: Option<f32>,
    /// Draw completed
    pub drawn_at: Option<f32>,
    pub shot_at: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub position: Point,
    pub phase: CombatPhase,
    pub health: f32,
    /// Fired during the current armed cycle
    pub has_shot: bool,
    /// Set only while aiming
    pub aim_start: Option<f32>,
    pub metrics: Metrics,
    /// +1 faces right, -1 faces left
    pub facing: f32,
    pub dead_at: Option<f32>,
    /// Crosshair jitter seeds, rerolled each time the draw completes
    pub aim_seeds: (f32, f32),
    /// Cosmetic hit flash, seconds remaining
    pub hit_flash: f32,
}

pub const FULL_HEALTH: f32 = 100.0;

impl Combatant {
    pub fn new(position: Point, facing: f32) -> Self {
        Self {
            position,
            phase: CombatPhase::Holstered,
            health: FULL_HEALTH,
            has_shot: false,
            aim_start: None,
            metrics: Metrics::default(),
            facing,
            dead_at: None,
            aim_seeds: (0.0, 0.0),
            hit_flash: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Draw cadence and recovery time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawProfile {
    /// Steps from holster to aim
    pub steps: u32,
    /// Seconds per step
    pub step_time: f32,
    /// Seconds spent recovering after a shot
    pub recovery: f32,
    /// Seconds the death animation plays (delays the outcome banner)
    pub death_duration: f32,
}

impl DrawProfile {
    pub fn player() -> Self {
        Self {
            steps: 10,
            step_time: 0.030,
            recovery: 0.25,
            death_duration: 1.4,
        }
    }

    pub fn enemy(draw_speed: f32) -> Self {
        Self {
            steps: 9,
            step_time: draw_speed,
            recovery: 0.65,
            death_duration: 0.9,
        }
    }
}

/// Human hold state, passed explicitly into the controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    /// Draw button currently down
    pub held: bool,
    /// Swallow the next release (a holster consumed this hold)
    pub suppress_next_release: bool,
}

/// What happened during one controller step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerSignal {
    None,
    /// Draw finished; `fire_now` when a release was queued mid-draw
    Drawn { fire_now: bool },
    /// Post-shot recovery finished
    Recovered,
    Holstered,
}

/// Recorded phase change (from, to, round time)
pub type Transition = (CombatPhase, CombatPhase, f32);

#[derive(Debug, Clone)]
pub struct CombatantController {
    combatant: Combatant,
    profile: DrawProfile,
    draw_progress: u32,
    step_timer: f32,
    recovery_timer: f32,
    release_queued: bool,
    transitions: Vec<Transition>,
}

impl CombatantController {
    pub fn new(combatant: Combatant, profile: DrawProfile) -> Self {
        Self {
            combatant,
            profile,
            draw_progress: 0,
            step_timer: 0.0,
            recovery_timer: 0.0,
            release_queued: false,
            transitions: Vec::new(),
        }
    }

    pub fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    pub fn phase(&self) -> CombatPhase {
        self.combatant.phase
    }

    pub fn profile(&self) -> &DrawProfile {
        &self.profile
    }

    /// Steps drawn so far (0 = holstered, `steps` = fully drawn)
    pub fn draw_progress(&self) -> u32 {
        self.draw_progress
    }

    pub fn release_queued(&self) -> bool {
        self.release_queued
    }

    pub fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    fn set_phase(&mut self, to: CombatPhase, at: f32) {
        let from = self.combatant.phase;
        if from != to {
            self.combatant.phase = to;
            self.transitions.push((from, to, at));
        }
    }

    /// Drain recorded phase changes
    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    /// Holstered -> drawing. Starts a fresh armed cycle.
    pub fn begin_draw(&mut self, now: f32) -> bool {
        if self.combatant.phase != CombatPhase::Holstered {
            return false;
        }
        self.draw_progress = 0;
        self.step_timer = 0.0;
        self.release_queued = false;
        self.combatant.has_shot = false;
        self.combatant.aim_start = None;
        self.combatant.metrics = Metrics {
            reacted_at: Some(now),
            drawn_at: None,
            shot_at: None,
        };
        self.set_phase(CombatPhase::Drawing, now);
        true
    }

    /// A release arrived before the draw finished; fire on completion
    pub fn queue_release(&mut self) -> bool {
        if self.combatant.phase == CombatPhase::Drawing && !self.combatant.has_shot {
            self.release_queued = true;
            return true;
        }
        false
    }

    /// Keep the aim clock running while the hold is active
    pub fn hold_aim(&mut self, now: f32) {
        if self.combatant.phase == CombatPhase::Aiming
            && !self.combatant.has_shot
            && self.combatant.aim_start.is_none()
        {
            self.combatant.aim_start = Some(now);
        }
    }

    /// Aiming -> shooting, at most once per armed cycle.
    /// The caller samples the aim before committing and spawns the projectile after.
    pub fn commit_shot(&mut self, now: f32) -> bool {
        if self.combatant.has_shot || self.combatant.phase != CombatPhase::Aiming {
            return false;
        }
        self.combatant.has_shot = true;
        self.combatant.metrics.shot_at = Some(now);
        self.combatant.aim_start = None;
        self.release_queued = false;
        self.recovery_timer = 0.0;
        self.set_phase(CombatPhase::Shooting, now);
        true
    }

    /// Put the gun away without firing
    pub fn request_holster(&mut self, now: f32) -> bool {
        match self.combatant.phase {
            CombatPhase::Dead | CombatPhase::Holstered | CombatPhase::Holstering => return false,
            CombatPhase::Aiming | CombatPhase::Shooting => {
                self.draw_progress = self.profile.steps.saturating_sub(1);
            }
            CombatPhase::Drawing => {}
        }
        self.step_timer = 0.0;
        self.release_queued = false;
        self.combatant.aim_start = None;
        self.set_phase(CombatPhase::Holstering, now);
        true
    }

    /// Ready to fire again after recovery (practice range)
    pub fn rearm(&mut self) {
        if self.combatant.phase == CombatPhase::Aiming {
            self.combatant.has_shot = false;
            self.combatant.aim_start = None;
        }
    }

    /// Lethal hit at `at`. Freezes the controller.
    pub fn kill(&mut self, at: f32) -> bool {
        if self.combatant.phase == CombatPhase::Dead {
            return false;
        }
        self.combatant.health = 0.0;
        self.combatant.dead_at = Some(at);
        self.combatant.aim_start = None;
        self.release_queued = false;
        self.set_phase(CombatPhase::Dead, at);
        true
    }

    pub fn flash(&mut self, secs: f32) {
        self.combatant.hit_flash = secs;
    }

    pub fn decay_flash(&mut self, dt: f32) {
        self.combatant.hit_flash = (self.combatant.hit_flash - dt).max(0.0);
    }

    /// Step timers. `drive` gates draw progress (the human must hold or have a release queued).
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        now: f32,
        drive: bool,
        rng: &mut R,
    ) -> ControllerSignal {
        match self.combatant.phase {
            CombatPhase::Dead | CombatPhase::Holstered | CombatPhase::Aiming => ControllerSignal::None,

            CombatPhase::Holstering => {
                self.step_timer += dt;
                if self.step_timer <= self.profile.step_time {
                    return ControllerSignal::None;
                }
                self.step_timer = 0.0;
                if self.draw_progress <= 1 {
                    self.draw_progress = 0;
                    self.combatant.aim_start = None;
                    self.release_queued = false;
                    self.set_phase(CombatPhase::Holstered, now);
                    return ControllerSignal::Holstered;
                }
                self.draw_progress -= 1;
                ControllerSignal::None
            }

            CombatPhase::Shooting => {
                self.recovery_timer += dt;
                if self.recovery_timer < self.profile.recovery {
                    return ControllerSignal::None;
                }
                self.recovery_timer = 0.0;
                self.draw_progress = self.profile.steps;
                self.set_phase(CombatPhase::Aiming, now);
                ControllerSignal::Recovered
            }

            CombatPhase::Drawing => {
                if !drive && !self.release_queued {
                    return ControllerSignal::None;
                }
                self.step_timer += dt;
                if self.step_timer <= self.profile.step_time {
                    return ControllerSignal::None;
                }
                self.step_timer = 0.0;
                self.draw_progress += 1;
                if self.draw_progress < self.profile.steps {
                    return ControllerSignal::None;
                }

                self.draw_progress = self.profile.steps;
                self.combatant.metrics.drawn_at = Some(now);
                self.combatant.aim_seeds = (rng.gen::<f32>() * 10.0, rng.gen::<f32>() * 10.0);
                self.combatant.aim_start = Some(now);
                self.set_phase(CombatPhase::Aiming, now);
                ControllerSignal::Drawn {
                    fire_now: self.release_queued && !self.combatant.has_shot,
                }
            }
        }
    }
}
