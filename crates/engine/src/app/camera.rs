use tracing::debug;

use super::rendering::Viewport;
use super::{CameraConfig, Rect, Vec2, WorldSize};

/// Center of the view in world units plus the world-to-pixel scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer_px: Vec2,
    camera_position: Vec2,
}

/// Owns the camera and keeps it inside the world for every input path:
/// `zoom` stays within `[min_zoom, max_zoom]` and the visible rectangle
/// never extends past the world rectangle.
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Camera2D,
    viewport: Viewport,
    world: WorldSize,
    config: CameraConfig,
    min_zoom: f32,
    drag: Option<DragAnchor>,
}

impl CameraController {
    pub fn new(world: WorldSize, viewport: Viewport, config: CameraConfig) -> Self {
        let min_zoom = minimum_zoom(world, viewport, config.min_zoom);
        let mut controller = Self {
            camera: Camera2D {
                position: world.center(),
                zoom: min_zoom,
            },
            viewport,
            world,
            config,
            min_zoom,
            drag: None,
        };
        controller.camera.position =
            controller.clamp_position(controller.camera.position, controller.camera.zoom);
        controller
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    /// A viewport wider than `max_zoom` allows still has to be covered, so
    /// the computed minimum wins over the configured maximum.
    pub fn max_zoom(&self) -> f32 {
        self.config.max_zoom.max(self.min_zoom)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// World-space rectangle currently covered by the viewport.
    pub fn visible_rect(&self) -> Rect {
        let zoom = self.camera.zoom;
        Rect::centered(
            self.camera.position,
            self.viewport.width as f32 / zoom,
            self.viewport.height as f32 / zoom,
        )
    }

    /// Zooms about the current center. Positive `delta_y` (scrolling down)
    /// zooms out; the step is proportional to the current zoom.
    pub fn wheel(&mut self, delta_y: f32) {
        if !delta_y.is_finite() {
            return;
        }
        let factor = 1.0 - delta_y * self.config.zoom_sensitivity * self.camera.zoom;
        let target = self.camera.zoom * factor;
        let zoom = if target.is_finite() {
            target.clamp(self.min_zoom, self.max_zoom())
        } else {
            self.camera.zoom
        };
        self.camera.zoom = zoom;
        self.camera.position = self.clamp_position(self.camera.position, zoom);
    }

    pub fn drag_start(&mut self, pointer_px: Vec2) {
        self.drag = Some(DragAnchor {
            pointer_px,
            camera_position: self.camera.position,
        });
    }

    pub fn drag_move(&mut self, pointer_px: Vec2) {
        let Some(anchor) = self.drag else {
            return;
        };
        let scale = self.config.drag_damping / self.camera.zoom;
        let delta = (anchor.pointer_px - pointer_px) * scale;
        self.camera.position = self.clamp_position(anchor.camera_position + delta, self.camera.zoom);
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.camera.position = self.clamp_position(position, self.camera.zoom);
    }

    /// Recomputes the zoom floor for the new viewport and pulls the current
    /// state back inside the limits. The current zoom is kept when it is
    /// still legal.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }
        self.viewport = viewport;
        self.min_zoom = minimum_zoom(self.world, viewport, self.config.min_zoom);
        self.camera.zoom = self.camera.zoom.clamp(self.min_zoom, self.max_zoom());
        self.camera.position = self.clamp_position(self.camera.position, self.camera.zoom);
        debug!(
            width = viewport.width,
            height = viewport.height,
            min_zoom = self.min_zoom,
            zoom = self.camera.zoom,
            "camera_resized"
        );
    }

    fn clamp_position(&self, position: Vec2, zoom: f32) -> Vec2 {
        let half_w = self.viewport.width as f32 / zoom * 0.5;
        let half_h = self.viewport.height as f32 / zoom * 0.5;
        Vec2 {
            x: clamp_axis(position.x, half_w, self.world.width - half_w),
            y: clamp_axis(position.y, half_h, self.world.height - half_h),
        }
    }
}

/// Smallest zoom at which the world still covers the whole viewport, never
/// below the configured floor.
pub fn minimum_zoom(world: WorldSize, viewport: Viewport, floor: f32) -> f32 {
    let fit_x = viewport.width as f32 / world.width;
    let fit_y = viewport.height as f32 / world.height;
    floor.max(fit_x).max(fit_y)
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        return (min + max) * 0.5;
    }
    value.clamp(min, max)
}
