//! Arena coordinates and circle collision.
//!
//! Origin is the top-left corner, y grows downward.

use serde::Serialize;

pub const ARENA_WIDTH: f64 = 800.0;
pub const ARENA_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Strict overlap: circles that merely touch do not collide.
    pub fn collides(&self, other: &Circle) -> bool {
        self.center.distance(other.center) < self.radius + other.radius
    }

    /// Strictly inside; a point on the rim is outside.
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance(point) < self.radius
    }
}

/// Clamp a centre x so a circle of `radius` stays inside the arena.
pub fn clamp_x(x: f64, radius: f64) -> f64 {
    x.clamp(radius, ARENA_WIDTH - radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_circles_do_not_collide() {
        let a = Circle::new(Vec2::new(0.0, 0.0), 10.0);
        let b = Circle::new(Vec2::new(20.0, 0.0), 10.0);
        assert!(!a.collides(&b));

        let c = Circle::new(Vec2::new(19.9, 0.0), 10.0);
        assert!(a.collides(&c));
        assert!(c.collides(&a));
    }

    #[test]
    fn test_contains_is_strict() {
        let c = Circle::new(Vec2::new(100.0, 100.0), 30.0);
        assert!(c.contains(Vec2::new(110.0, 110.0)));
        assert!(!c.contains(Vec2::new(130.0, 100.0)));
    }

    #[test]
    fn test_clamp_x() {
        assert_eq!(clamp_x(-50.0, 20.0), 20.0);
        assert_eq!(clamp_x(900.0, 20.0), 780.0);
        assert_eq!(clamp_x(400.0, 20.0), 400.0);
    }
}
