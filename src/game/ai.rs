//! Opponent scheduler - reaction, flinch, false starts, fire timing and intent
//!
//! Holds only timestamps and flags; the controller owns the combat phase.

use rand::Rng;
use tracing::debug;

use crate::util::math::{lerp, point_line_distance, random_in_disc, uniform, Point};

use super::personality::Personality;

/// Accuracy clamp applied to every planned shot
pub const ACCURACY_FLOOR: f32 = 0.10;
pub const ACCURACY_CEIL: f32 = 0.92;
/// Extra accuracy for using the whole aim window
const PATIENCE_BONUS: f32 = 0.10;
const FLINCH_PENALTY: f32 = 0.12;
const DEAD_FACTOR: f32 = 0.25;
/// Vertical compression of planned impact offsets
const AIM_SQUASH: f32 = 0.75;
/// Miss annulus, measured outward from the hit radius
const MISS_INNER: f32 = 12.0;
const MISS_OUTER: f32 = 70.0;
const MISS_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnemyScheduler {
    /// When to start drawing
    pub draw_at: Option<f32>,
    /// When to fire once aiming
    pub fire_at: Option<f32>,
    /// Aim delay chosen when the draw finished
    pub planned_aim_delay: f32,
    /// Hesitated at the go signal (costs accuracy)
    pub flinched: bool,
    /// Cosmetic flinch indicator expiry
    pub flinch_until: f32,
}

impl EnemyScheduler {
    /// Cancel every pending timestamp
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Plan the reaction to a go signal that fired at `go_at` (observed at `now`)
    pub fn schedule_from_go<R: Rng + ?Sized>(&mut self, go_at: f32, now: f32, p: &Personality, rng: &mut R) {
        let mut reaction = uniform(rng, p.reaction_min, p.reaction_max);

        self.flinched = false;
        self.flinch_until = 0.0;

        if rng.gen::<f32>() < p.flinch_chance {
            self.flinched = true;
            reaction += uniform(rng, 0.10, 0.26);
            self.flinch_until = now + uniform(rng, 0.20, 0.45);
        }

        self.draw_at = Some(go_at + reaction);
        self.fire_at = None;
        self.planned_aim_delay = 0.0;

        debug!(
            personality = %p.name,
            reaction,
            flinched = self.flinched,
            "Enemy reaction scheduled"
        );
    }

    /// One standoff tick's false-start roll
    pub fn rolls_false_start<R: Rng + ?Sized>(p: &Personality, dt: f32, rng: &mut R) -> bool {
        p.false_start_chance > 0.0 && rng.gen::<f32>() < p.false_start_chance * dt
    }

    /// Draw time has arrived; consumes the schedule entry
    pub fn take_draw_due(&mut self, now: f32) -> bool {
        match self.draw_at {
            Some(at) if now >= at => {
                self.draw_at = None;
                true
            }
            _ => false,
        }
    }

    /// Draw finished: pick the aim delay and fire time
    pub fn plan_fire<R: Rng + ?Sized>(&mut self, now: f32, p: &Personality, rng: &mut R) {
        self.planned_aim_delay = uniform(rng, p.aim_min, p.aim_max);
        self.fire_at = Some(now + self.planned_aim_delay);
    }

    /// Aiming without a plan (e.g. after the AI was re-enabled): schedule one
    pub fn ensure_fire_planned<R: Rng + ?Sized>(&mut self, now: f32, p: &Personality, rng: &mut R) {
        if self.fire_at.is_none() {
            self.fire_at = Some(now + uniform(rng, p.aim_min, p.aim_max));
        }
    }

    /// Practice range: shoot again after a short pause
    pub fn plan_refire<R: Rng + ?Sized>(&mut self, now: f32, rng: &mut R) {
        self.fire_at = Some(now + uniform(rng, 0.45, 1.10));
    }

    pub fn fire_due(&self, now: f32) -> bool {
        matches!(self.fire_at, Some(at) if now >= at)
    }

    pub fn is_flinching(&self, now: f32) -> bool {
        self.flinch_until > now
    }

    /// Probability that the next shot is meant to hit
    pub fn fire_accuracy<R: Rng + ?Sized>(&self, p: &Personality, dead: bool, rng: &mut R) -> f32 {
        let aim_delay = if self.planned_aim_delay > 0.0 {
            self.planned_aim_delay
        } else {
            uniform(rng, p.aim_min, p.aim_max)
        };
        let span = (p.aim_max - p.aim_min).max(0.001);
        let patience = ((aim_delay - p.aim_min) / span).clamp(0.0, 1.0);

        let mut acc = (p.accuracy + PATIENCE_BONUS * patience).clamp(ACCURACY_FLOOR, ACCURACY_CEIL);
        if dead {
            acc *= DEAD_FACTOR;
        }
        if self.flinched {
            acc = (acc - FLINCH_PENALTY).clamp(ACCURACY_FLOOR, ACCURACY_CEIL);
        }
        acc
    }

    /// Decide the impact point for a shot from `muzzle` at `target`.
    /// Returns (aim point, intended to hit).
    pub fn plan_impact<R: Rng + ?Sized>(
        &self,
        accuracy: f32,
        muzzle: Point,
        target: Point,
        hit_radius: f32,
        rng: &mut R,
    ) -> (Point, bool) {
        let will_hit = rng.gen::<f32>() < accuracy;

        if will_hit {
            let radius = lerp(hit_radius * 1.10, hit_radius * 0.45, accuracy);
            let off = random_in_disc(rng, radius);
            return (Point::new(target.x + off.x, target.y + off.y * AIM_SQUASH), true);
        }

        (miss_point(muzzle, target, hit_radius, rng), false)
    }
}

/// A point in the miss annulus whose line of fire clears the hit circle
fn miss_point<R: Rng + ?Sized>(muzzle: Point, target: Point, hit_radius: f32, rng: &mut R) -> Point {
    let min_r = hit_radius + MISS_INNER;
    let max_r = hit_radius + MISS_OUTER;

    for _ in 0..MISS_ATTEMPTS {
        let angle = rng.gen::<f32>() * std::f32::consts::TAU;
        let r = uniform(rng, min_r, max_r);
        let aim = Point::new(target.x + angle.cos() * r, target.y + angle.sin() * r * AIM_SQUASH);
        if point_line_distance(target, muzzle, aim) > hit_radius {
            return aim;
        }
    }

    // perpendicular to the line of fire, above or below
    let dir = (target - muzzle).normalize_or(Point::new(1.0, 0.0));
    let normal = Point::new(-dir.y, dir.x);
    let side = if rng.gen::<bool>() { 1.0 } else { -1.0 };
    target + normal.scale(side * min_r)
}
