//! Geometry and sampling helpers shared by the aim model and ballistics

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point (or vector) in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `fallback` for a degenerate vector
    pub fn normalize_or(self, fallback: Point) -> Point {
        let len = self.length();
        if len < f32::EPSILON || !len.is_finite() {
            return fallback;
        }
        Point::new(self.x / len, self.y / len)
    }

    pub fn scale(self, k: f32) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Direction sign toward a target coordinate (zero counts as positive)
pub fn sign(v: f32) -> f32 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Closest approach of `p` to the segment `a`→`b`.
/// Returns (distance, segment parameter in [0, 1]).
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> (f32, f32) {
    let d = b - a;
    let len_sq = d.x * d.x + d.y * d.y;
    if len_sq == 0.0 {
        return (p.distance(a), 0.0);
    }
    let t = (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / len_sq).clamp(0.0, 1.0);
    let closest = a + d.scale(t);
    (p.distance(closest), t)
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`
pub fn point_line_distance(p: Point, a: Point, b: Point) -> f32 {
    let d = b - a;
    let len = d.length();
    if len < f32::EPSILON {
        return p.distance(a);
    }
    ((p.x - a.x) * d.y - (p.y - a.y) * d.x).abs() / len
}

/// Uniform sample in `[min, max)`; a collapsed range returns `min`
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}

/// Uniformly distributed offset inside a disc of `radius`
pub fn random_in_disc<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Point {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let r = rng.gen::<f32>().sqrt() * radius;
    Point::new(angle.cos() * r, angle.sin() * r)
}
