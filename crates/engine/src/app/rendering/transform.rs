use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center_px(&self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Uniform scale followed by a translation, mapping drawing units to
/// screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    /// Translate to the viewport center, scale by zoom, then translate by
    /// the negated camera position.
    pub fn from_camera(camera: &Camera2D, viewport: Viewport) -> Self {
        let center = viewport.center_px();
        Self {
            scale: camera.zoom,
            offset: center - camera.position * camera.zoom,
        }
    }

    pub fn apply(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }

    pub fn invert(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) * self.scale.recip()
    }
}

pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    ViewTransform::from_camera(camera, viewport).apply(world)
}

pub fn screen_to_world(screen: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    ViewTransform::from_camera(camera, viewport).invert(screen)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera2D {
            position: Vec2::new(1500.0, 750.0),
            zoom: 2.0,
        };
        let screen = world_to_screen(camera.position, &camera, VIEWPORT);
        assert_eq!(screen, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn zoom_scales_distance_from_center() {
        let camera = Camera2D {
            position: Vec2::new(100.0, 100.0),
            zoom: 2.0,
        };
        let screen = world_to_screen(Vec2::new(110.0, 95.0), &camera, VIEWPORT);
        assert_eq!(screen, Vec2::new(420.0, 290.0));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let camera = Camera2D {
            position: Vec2::new(640.0, 320.0),
            zoom: 0.5,
        };
        let world = Vec2::new(12.0, 900.0);
        let back = screen_to_world(world_to_screen(world, &camera, VIEWPORT), &camera, VIEWPORT);
        assert!((back.x - world.x).abs() < 1e-3);
        assert!((back.y - world.y).abs() < 1e-3);
    }
}
