//! Aim model - spread over time, advisory hit chance, crosshair jitter
//!
//! Everything here is a pure function of its inputs so replays and tests
//! see exactly the same crosshair for the same clock and seeds.

use crate::util::math::{lerp, Point};

/// Aim curve parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimModel {
    /// Spread right after drawing (and whenever not aiming)
    pub spread_start: f32,
    /// Best achievable spread
    pub spread_min: f32,
    /// Seconds to settle from `spread_start` to `spread_min`
    pub stabilize: f32,
    /// Seconds of aiming before fatigue sets in
    pub fatigue_start: f32,
    /// Seconds for fatigue to reach `fatigue_max`
    pub fatigue_ramp: f32,
    pub fatigue_max: f32,
    /// Crosshair wander as a fraction of spread
    pub drift_factor: f32,
}

impl Default for AimModel {
    fn default() -> Self {
        Self {
            spread_start: 34.0,
            spread_min: 6.0,
            stabilize: 0.34,
            fatigue_start: 0.95,
            fatigue_ramp: 0.85,
            fatigue_max: 24.0,
            drift_factor: 0.30,
        }
    }
}

impl AimModel {
    /// Current spread radius; `aim_start` of `None` means not aiming
    pub fn spread(&self, now: f32, aim_start: Option<f32>) -> f32 {
        let Some(start) = aim_start else {
            return self.spread_start;
        };
        let aim_time = (now - start).max(0.0);
        if aim_time >= self.fatigue_start + self.fatigue_ramp {
            return self.fatigue_max;
        }

        let settle = (aim_time / self.stabilize).clamp(0.0, 1.0);
        let mut spread = lerp(self.spread_start, self.spread_min, settle);

        if aim_time > self.fatigue_start {
            let tired = ((aim_time - self.fatigue_start) / self.fatigue_ramp).clamp(0.0, 1.0);
            spread = lerp(self.spread_min, self.fatigue_max, tired);
        }
        spread
    }

    /// Rough chance the shot lands inside `hit_radius`. HUD only.
    pub fn approx_hit_chance(hit_radius: f32, spread: f32) -> f32 {
        if spread <= 0.0 || spread <= hit_radius {
            return 1.0;
        }
        ((hit_radius * hit_radius) / (spread * spread)).clamp(0.0, 1.0)
    }

    /// Jittered crosshair position around `base`
    pub fn crosshair_center(&self, now: f32, base: Point, spread: f32, seed1: f32, seed2: f32) -> Point {
        let drift = spread * self.drift_factor;
        let t = now;

        let sx = (t * 7.2 + seed1).sin() + (t * 12.8 + seed2).sin() * 0.6;
        let sy = (t * 6.4 + seed2).cos() + (t * 10.6 + seed1).sin() * 0.5;

        Point::new(base.x + sx * drift * 0.35, base.y + sy * drift * 0.22)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_aiming_uses_baseline() {
        let aim = AimModel::default();
        assert_eq!(aim.spread(5.0, None), aim.spread_start);
    }

    #[test]
    fn test_spread_non_increasing_while_stabilizing() {
        let aim = AimModel::default();
        let mut last = f32::INFINITY;
        for i in 0..=100 {
            let elapsed = aim.stabilize * i as f32 / 100.0;
            let s = aim.spread(10.0 + elapsed, Some(10.0));
            assert!(s <= last + 1e-5, "spread rose at {elapsed}");
            last = s;
        }
        assert!((last - aim.spread_min).abs() < 1e-4);
    }

    #[test]
    fn test_spread_saturates_at_fatigue_max() {
        let aim = AimModel::default();
        let full = aim.fatigue_start + aim.fatigue_ramp;
        for extra in [0.0, 0.1, 1.0, 30.0] {
            assert_eq!(aim.spread(full + extra, Some(0.0)), aim.fatigue_max);
        }
    }

    #[test]
    fn test_spread_clock_before_start_is_baseline() {
        let aim = AimModel::default();
        assert_eq!(aim.spread(1.0, Some(2.0)), aim.spread_start);
    }

    #[test]
    fn test_hit_chance_one_inside_radius() {
        assert_eq!(AimModel::approx_hit_chance(16.0, 0.0), 1.0);
        assert_eq!(AimModel::approx_hit_chance(16.0, 10.0), 1.0);
        assert_eq!(AimModel::approx_hit_chance(16.0, 16.0), 1.0);
    }

    #[test]
    fn test_hit_chance_strictly_decreasing_outside_radius() {
        let mut last = AimModel::approx_hit_chance(16.0, 16.5);
        assert!(last < 1.0);
        for i in 1..60 {
            let c = AimModel::approx_hit_chance(16.0, 16.5 + i as f32);
            assert!(c < last);
            last = c;
        }
    }

    #[test]
    fn test_crosshair_is_pure() {
        let aim = AimModel::default();
        let base = Point::new(470.0, 310.0);
        let a = aim.crosshair_center(1.234, base, 20.0, 3.3, 7.7);
        let b = aim.crosshair_center(1.234, base, 20.0, 3.3, 7.7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_crosshair_stays_on_base_with_zero_spread() {
        let aim = AimModel::default();
        let base = Point::new(100.0, 50.0);
        assert_eq!(aim.crosshair_center(0.7, base, 0.0, 1.0, 2.0), base);
    }
}
