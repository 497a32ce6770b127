use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_angle(radians: f32, length: f32) -> Self {
        Self {
            x: radians.cos() * length,
            y: radians.sin() * length,
        }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in whatever space the caller is drawing in.
/// `origin` is the top-left corner; y grows downward like a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2 { x, y },
            width,
            height,
        }
    }

    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width * 0.5,
            center.y - height * 0.5,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.height
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPSILON: f32 = 1e-3;
        other.origin.x >= self.origin.x - EPSILON
            && other.origin.y >= self.origin.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }
}

/// Size of the rectangular world every entity lives in. The world spans
/// `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSize {
    pub width: f32,
    pub height: f32,
}

impl WorldSize {
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_angle_has_requested_length() {
        let v = Vec2::from_angle(1.1, 2.0);
        assert!((v.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn rect_containment_is_inclusive() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(outer.contains_rect(&Rect::centered(Vec2::new(5.0, 5.0), 2.0, 2.0)));
        assert!(!outer.contains_rect(&Rect::new(9.0, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn world_contains_edges() {
        let world = WorldSize {
            width: 3000.0,
            height: 1500.0,
        };
        assert!(world.contains(Vec2::new(3000.0, 0.0)));
        assert!(!world.contains(Vec2::new(3000.1, 10.0)));
        assert_eq!(world.center(), Vec2::new(1500.0, 750.0));
    }
}
