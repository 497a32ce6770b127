use thiserror::Error;

use crate::app::{Rect, SpriteImage, Vec2};

use super::{ViewTransform, Viewport};

pub type Rgba = [u8; 4];

/// Integer source rectangle inside an image, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= width && b <= height)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("sprite sheet {width}x{height} is too small for a {columns}x{rows} grid")]
    SheetTooSmall {
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },
    #[error("source rect {rect:?} lies outside a {width}x{height} image")]
    SourceOutOfBounds {
        rect: PixelRect,
        width: u32,
        height: u32,
    },
}

/// Immediate-mode 2D drawing target. Coordinates passed to drawing calls go
/// through the current transform; `clear` always covers the whole viewport.
pub trait DrawSurface {
    fn viewport(&self) -> Viewport;
    fn transform(&self) -> ViewTransform;
    fn set_transform(&mut self, transform: ViewTransform);

    fn reset_transform(&mut self) {
        self.set_transform(ViewTransform::IDENTITY);
    }

    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba);
    fn fill_ellipse(&mut self, center: Vec2, radius_x: f32, radius_y: f32, color: Rgba);
    fn fill_triangle(&mut self, points: [Vec2; 3], color: Rgba);
    fn draw_image(&mut self, image: &SpriteImage, source: PixelRect, dest: Rect)
        -> Result<(), DrawError>;
    /// Draws `text` centered on `center`, glyphs `size` units tall.
    fn fill_text(&mut self, text: &str, center: Vec2, size: f32, color: Rgba);

    /// Outline drawn inside `rect`, `width` units thick.
    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Rgba) {
        let thickness = width.min(rect.width * 0.5).min(rect.height * 0.5).max(0.0);
        let x = rect.origin.x;
        let y = rect.origin.y;
        self.fill_rect(Rect::new(x, y, rect.width, thickness), color);
        self.fill_rect(
            Rect::new(x, rect.bottom() - thickness, rect.width, thickness),
            color,
        );
        self.fill_rect(
            Rect::new(x, y + thickness, thickness, rect.height - thickness * 2.0),
            color,
        );
        self.fill_rect(
            Rect::new(
                rect.right() - thickness,
                y + thickness,
                thickness,
                rect.height - thickness * 2.0,
            ),
            color,
        );
    }

    /// Rectangle with circular corners of `radius`.
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgba) {
        let radius = radius.min(rect.width * 0.5).min(rect.height * 0.5).max(0.0);
        let x = rect.origin.x;
        let y = rect.origin.y;
        self.fill_rect(
            Rect::new(x + radius, y, rect.width - radius * 2.0, rect.height),
            color,
        );
        self.fill_rect(Rect::new(x, y + radius, radius, rect.height - radius * 2.0), color);
        self.fill_rect(
            Rect::new(
                rect.right() - radius,
                y + radius,
                radius,
                rect.height - radius * 2.0,
            ),
            color,
        );
        if radius > 0.0 {
            for corner in [
                Vec2::new(x + radius, y + radius),
                Vec2::new(rect.right() - radius, y + radius),
                Vec2::new(x + radius, rect.bottom() - radius),
                Vec2::new(rect.right() - radius, rect.bottom() - radius),
            ] {
                self.fill_ellipse(corner, radius, radius, color);
            }
        }
    }
}
