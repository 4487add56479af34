//! Ballistics - shot commit, projectile flight, swept hit detection

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::math::{point_segment_distance, random_in_disc, Point};

use super::Side;

/// Axis-aligned play field; projectiles beyond `margin` outside it are discarded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            margin: 60.0,
        }
    }
}

impl WorldBounds {
    pub fn contains(&self, p: Point) -> bool {
        p.x >= -self.margin
            && p.x <= self.width + self.margin
            && p.y >= -self.margin
            && p.y <= self.height + self.margin
    }
}

/// Active projectile in the duel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Sequential id within the round
    pub id: u32,
    pub shooter: Side,
    pub target: Side,
    pub origin: Point,
    pub prev: Point,
    pub pos: Point,
    pub vel: Point,
}

/// What the resolver needs to know about a potential target this tick
#[derive(Debug, Clone, Copy)]
pub struct TargetState {
    pub hit_point: Point,
    pub alive: bool,
}

/// A registered hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub projectile_id: u32,
    pub shooter: Side,
    pub target: Side,
    pub point: Point,
    /// Interpolated time of closest approach within the tick
    pub at: f32,
    /// Direction of travel in radians (0 = rightward, PI = leftward)
    pub direction: f32,
}

/// Shot resolver: owns the in-flight projectile list for a round
#[derive(Debug, Clone)]
pub struct BallisticResolver {
    /// Projectile speed (units per second)
    pub projectile_speed: f32,
    /// Lethal radius around a target's hit point
    pub hit_radius: f32,
    /// Horizontal muzzle distance from the shooter along its facing
    pub muzzle_offset: f32,
    /// Height of the muzzle and the torso hit point above the feet
    pub torso_height: f32,
    /// Vertical compression applied to the spread disc on commit
    pub spread_squash: f32,
    pub bounds: WorldBounds,
    /// Hits kill (false on the practice range)
    pub lethal: bool,
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl BallisticResolver {
    /// Default tuning; `lethal` decides whether hits kill
    pub fn new(lethal: bool) -> Self {
        Self {
            lethal,
            ..Default::default()
        }
    }
}

impl Default for BallisticResolver {
    fn default() -> Self {
        Self {
            projectile_speed: 900.0,
            hit_radius: 16.0,
            muzzle_offset: 25.0,
            torso_height: 10.0,
            spread_squash: 0.7,
            bounds: WorldBounds::default(),
            lethal: true,
            projectiles: Vec::new(),
            next_id: 0,
        }
    }
}

impl BallisticResolver {
    /// Torso point that bullets are tested against
    pub fn hit_point(&self, position: Point) -> Point {
        Point::new(position.x, position.y - self.torso_height)
    }

    /// Muzzle position for a shooter facing `facing` (+1 right, -1 left)
    pub fn muzzle(&self, position: Point, facing: f32) -> Point {
        Point::new(position.x + facing * self.muzzle_offset, position.y - self.torso_height)
    }

    /// Where a shot actually goes: the crosshair plus a random offset inside the spread
    pub fn impact_point<R: Rng + ?Sized>(&self, crosshair: Point, spread: f32, rng: &mut R) -> Point {
        let off = random_in_disc(rng, spread.max(0.0));
        Point::new(crosshair.x + off.x, crosshair.y + off.y * self.spread_squash)
    }

    /// Spawn a projectile from the shooter's muzzle toward `aim`
    pub fn fire(&mut self, shooter: Side, position: Point, facing: f32, aim: Point) -> &Projectile {
        let muzzle = self.muzzle(position, facing);
        let dir = (aim - muzzle).normalize_or(Point::new(facing, 0.0));
        let id = self.next_id;
        self.next_id += 1;

        debug!(id, ?shooter, x = aim.x, y = aim.y, "Projectile spawned");

        self.projectiles.push(Projectile {
            id,
            shooter,
            target: shooter.opponent(),
            origin: muzzle,
            prev: muzzle,
            pos: muzzle,
            vel: dir.scale(self.projectile_speed),
        });
        &self.projectiles[self.projectiles.len() - 1]
    }

    /// Advance all projectiles by `dt`, ending at round time `now`.
    /// `targets` is indexed by [`Side::index`].
    pub fn advance(&mut self, dt: f32, now: f32, targets: [TargetState; 2]) -> Vec<Impact> {
        let mut alive = [targets[0].alive, targets[1].alive];
        let mut impacts = Vec::new();
        let hit_radius = self.hit_radius;
        let lethal = self.lethal;
        let bounds = self.bounds;

        self.projectiles.retain_mut(|p| {
            p.prev = p.pos;
            p.pos = p.pos + p.vel.scale(dt);

            let idx = p.target.index();
            if alive[idx] || !lethal {
                let (dist, t) = point_segment_distance(targets[idx].hit_point, p.prev, p.pos);
                if dist <= hit_radius {
                    impacts.push(Impact {
                        projectile_id: p.id,
                        shooter: p.shooter,
                        target: p.target,
                        point: targets[idx].hit_point,
                        at: now - dt * (1.0 - t),
                        direction: if p.vel.x > 0.0 { 0.0 } else { std::f32::consts::PI },
                    });
                    if lethal {
                        alive[idx] = false;
                    }
                    return false;
                }
            }

            bounds.contains(p.pos)
        });

        impacts
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn in_flight(&self) -> usize {
        self.projectiles.len()
    }

    /// Drop every in-flight projectile and restart ids
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(player: Point, enemy: Point) -> [TargetState; 2] {
        [
            TargetState { hit_point: player, alive: true },
            TargetState { hit_point: enemy, alive: true },
        ]
    }

    #[test]
    fn test_fire_aims_from_muzzle() {
        let mut r = BallisticResolver::default();
        let p = r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, Point::new(470.0, 310.0)).clone();
        assert_eq!(p.origin, Point::new(195.0, 310.0));
        assert!((p.vel.x - 900.0).abs() < 1e-3);
        assert!(p.vel.y.abs() < 1e-3);
        assert_eq!(p.target, Side::Enemy);
    }

    #[test]
    fn test_zero_length_aim_uses_facing() {
        let mut r = BallisticResolver::default();
        let muzzle = r.muzzle(Point::new(470.0, 320.0), -1.0);
        let p = r.fire(Side::Enemy, Point::new(470.0, 320.0), -1.0, muzzle).clone();
        assert!((p.vel.x + 900.0).abs() < 1e-3);
    }

    #[test]
    fn test_fast_projectile_does_not_tunnel() {
        let mut r = BallisticResolver::default();
        let enemy = Point::new(470.0, 310.0);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);

        // 900 * 0.05 = 45 units per step, well over the 32-unit hit circle
        let mut hits = 0;
        let mut now = 0.0;
        for _ in 0..40 {
            now += 0.05;
            hits += r.advance(0.05, now, targets(Point::new(170.0, 310.0), enemy)).len();
        }
        assert_eq!(hits, 1);
        assert_eq!(r.in_flight(), 0);
    }

    #[test]
    fn test_single_hit_per_target_per_tick() {
        let mut r = BallisticResolver::default();
        let enemy = Point::new(470.0, 310.0);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);

        let impacts = r.advance(0.3, 0.3, targets(Point::new(170.0, 310.0), enemy));
        assert_eq!(impacts.len(), 1);
        // second bullet flies on past the dead target
        assert_eq!(r.in_flight(), 1);
    }

    #[test]
    fn test_impact_time_is_interpolated() {
        let mut r = BallisticResolver::default();
        let enemy = Point::new(470.0, 310.0);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);
        // muzzle at 195, closest approach at x=470 -> 275 units -> 0.30556s
        let impacts = r.advance(0.5, 0.5, targets(Point::new(170.0, 310.0), enemy));
        assert_eq!(impacts.len(), 1);
        assert!((impacts[0].at - 275.0 / 900.0).abs() < 1e-3);
        assert_eq!(impacts[0].direction, 0.0);
    }

    #[test]
    fn test_miss_leaves_world_silently() {
        let mut r = BallisticResolver::default();
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, Point::new(470.0, 250.0));
        let mut now = 0.0;
        for _ in 0..40 {
            now += 0.05;
            assert!(r
                .advance(0.05, now, targets(Point::new(170.0, 310.0), Point::new(470.0, 310.0)))
                .is_empty());
        }
        assert_eq!(r.in_flight(), 0);
    }

    #[test]
    fn test_non_lethal_hits_dead_or_alive() {
        let mut r = BallisticResolver::new(false);
        assert_eq!(r.hit_radius, 16.0);
        let enemy = Point::new(470.0, 310.0);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);
        r.fire(Side::Player, Point::new(170.0, 320.0), 1.0, enemy);
        let mut t = targets(Point::new(170.0, 310.0), enemy);
        t[1].alive = false;
        assert_eq!(r.advance(0.4, 0.4, t).len(), 2);
    }
}
