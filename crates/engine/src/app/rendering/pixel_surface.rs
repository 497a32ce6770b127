use crate::app::{Rect, SpriteImage, Vec2};

use super::surface::{DrawError, DrawSurface, PixelRect, Rgba};
use super::text::{cell_size, glyph_bits, glyph_pixel, text_width, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::{ViewTransform, Viewport};

/// Software rasterizer over a row-major RGBA8 frame. Every write is clipped
/// to the frame, so out-of-range geometry is silently dropped.
pub struct PixelSurface<'a> {
    frame: &'a mut [u8],
    viewport: Viewport,
    transform: ViewTransform,
}

/// Half-open pixel span `[left, right) x [top, bottom)`, already clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelSpan {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl PixelSpan {
    fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }
}

impl<'a> PixelSurface<'a> {
    pub fn new(frame: &'a mut [u8], viewport: Viewport) -> Self {
        Self {
            frame,
            viewport,
            transform: ViewTransform::IDENTITY,
        }
    }

    /// Screen-space span covered by `rect`, rounded to pixel edges and
    /// clipped to the viewport.
    fn screen_span(&self, rect: Rect) -> PixelSpan {
        let top_left = self.transform.apply(rect.origin);
        let bottom_right = self
            .transform
            .apply(Vec2::new(rect.right(), rect.bottom()));
        self.clip_span(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }

    fn clip_span(&self, left: f32, top: f32, right: f32, bottom: f32) -> PixelSpan {
        let width = self.viewport.width.min(i32::MAX as u32) as f32;
        let height = self.viewport.height.min(i32::MAX as u32) as f32;
        let clip = |value: f32, max: f32| {
            if value.is_nan() {
                0
            } else {
                value.round().clamp(0.0, max) as i32
            }
        };
        PixelSpan {
            left: clip(left.min(right), width),
            top: clip(top.min(bottom), height),
            right: clip(left.max(right), width),
            bottom: clip(top.max(bottom), height),
        }
    }

    fn blend_span(&mut self, span: PixelSpan, color: Rgba) {
        if span.is_empty() || color[3] == 0 {
            return;
        }
        for y in span.top..span.bottom {
            for x in span.left..span.right {
                blend_pixel(self.frame, self.viewport.width as usize, x, y, color);
            }
        }
    }
}

impl DrawSurface for PixelSurface<'_> {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn transform(&self) -> ViewTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }

    fn clear(&mut self, color: Rgba) {
        let len = self.viewport.width as usize * self.viewport.height as usize * 4;
        let end = len.min(self.frame.len());
        for chunk in self.frame[..end].chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let span = self.screen_span(rect);
        self.blend_span(span, color);
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        let a = self.transform.apply(from);
        let b = self.transform.apply(to);
        if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
            return;
        }
        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;
        if (a.x < 0.0 && b.x < 0.0)
            || (a.y < 0.0 && b.y < 0.0)
            || (a.x >= width && b.x >= width)
            || (a.y >= height && b.y >= height)
        {
            return;
        }

        // Axis-aligned lines are the common case (grid), draw them as spans.
        if a.x.floor() == b.x.floor() || a.y.floor() == b.y.floor() {
            let span = self.clip_span(
                a.x.min(b.x).floor(),
                a.y.min(b.y).floor(),
                a.x.max(b.x).floor() + 1.0,
                a.y.max(b.y).floor() + 1.0,
            );
            self.blend_span(span, color);
            return;
        }

        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil();
        let limit = (width + height) * 4.0;
        let steps = steps.min(limit).max(1.0) as u32;
        let frame_width = self.viewport.width as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (a.x + (b.x - a.x) * t).floor() as i32;
            let y = (a.y + (b.y - a.y) * t).floor() as i32;
            if x >= 0 && y >= 0 && (x as f32) < width && (y as f32) < height {
                blend_pixel(self.frame, frame_width, x, y, color);
            }
        }
    }

    fn fill_ellipse(&mut self, center: Vec2, radius_x: f32, radius_y: f32, color: Rgba) {
        let center = self.transform.apply(center);
        let rx = radius_x * self.transform.scale;
        let ry = radius_y * self.transform.scale;
        if !(rx > 0.0 && ry > 0.0) {
            return;
        }
        let bounds = self.clip_span(center.x - rx, center.y - ry, center.x + rx, center.y + ry);
        let frame_width = self.viewport.width as usize;
        for y in bounds.top..bounds.bottom {
            let dy = (y as f32 + 0.5 - center.y) / ry;
            let inside = 1.0 - dy * dy;
            if inside < 0.0 {
                continue;
            }
            let half = rx * inside.sqrt();
            let row = self.clip_span(center.x - half, y as f32, center.x + half, y as f32 + 1.0);
            for x in row.left..row.right {
                blend_pixel(self.frame, frame_width, x, y, color);
            }
        }
    }

    fn fill_triangle(&mut self, points: [Vec2; 3], color: Rgba) {
        let [a, b, c] = points.map(|point| self.transform.apply(point));
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        let bounds = self.clip_span(
            a.x.min(b.x).min(c.x),
            a.y.min(b.y).min(c.y),
            a.x.max(b.x).max(c.x),
            a.y.max(b.y).max(c.y),
        );
        let frame_width = self.viewport.width as usize;
        for y in bounds.top..bounds.bottom {
            for x in bounds.left..bounds.right {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p) * area.signum();
                let w1 = edge(c, a, p) * area.signum();
                let w2 = edge(a, b, p) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    blend_pixel(self.frame, frame_width, x, y, color);
                }
            }
        }
    }

    fn draw_image(
        &mut self,
        image: &SpriteImage,
        source: PixelRect,
        dest: Rect,
    ) -> Result<(), DrawError> {
        if !source.fits_within(image.width(), image.height()) {
            return Err(DrawError::SourceOutOfBounds {
                rect: source,
                width: image.width(),
                height: image.height(),
            });
        }
        if source.width == 0 || source.height == 0 {
            return Ok(());
        }
        let top_left = self.transform.apply(dest.origin);
        let dest_w = dest.width * self.transform.scale;
        let dest_h = dest.height * self.transform.scale;
        if !(dest_w > 0.0 && dest_h > 0.0) {
            return Ok(());
        }
        let bounds = self.clip_span(top_left.x, top_left.y, top_left.x + dest_w, top_left.y + dest_h);
        let frame_width = self.viewport.width as usize;
        for y in bounds.top..bounds.bottom {
            let v = (y as f32 + 0.5 - top_left.y) / dest_h * source.height as f32;
            let src_y = source.y + (v.max(0.0) as u32).min(source.height - 1);
            for x in bounds.left..bounds.right {
                let u = (x as f32 + 0.5 - top_left.x) / dest_w * source.width as f32;
                let src_x = source.x + (u.max(0.0) as u32).min(source.width - 1);
                if let Some(texel) = image.pixel(src_x, src_y) {
                    blend_pixel(self.frame, frame_width, x, y, texel);
                }
            }
        }
        Ok(())
    }

    fn fill_text(&mut self, text: &str, center: Vec2, size: f32, color: Rgba) {
        if !(size > 0.0) {
            return;
        }
        let cell = cell_size(size);
        let left = center.x - text_width(text, size) * 0.5;
        let top = center.y - size * 0.5;
        for (index, ch) in text.chars().enumerate() {
            let bits = glyph_bits(ch);
            if bits == 0 {
                continue;
            }
            let glyph_left = left + (index as u32 * GLYPH_ADVANCE) as f32 * cell;
            for row in 0..GLYPH_HEIGHT {
                for column in 0..GLYPH_WIDTH {
                    if glyph_pixel(bits, column, row) {
                        self.fill_rect(
                            Rect::new(
                                glyph_left + column as f32 * cell,
                                top + row as f32 * cell,
                                cell,
                                cell,
                            ),
                            color,
                        );
                    }
                }
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Source-over blend of `color` onto the frame pixel at `(x, y)`. The frame
/// stays opaque.
fn blend_pixel(frame: &mut [u8], width: usize, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    match alpha {
        0 => {}
        255 => dst.copy_from_slice(&color),
        _ => {
            for channel in 0..3 {
                let src = color[channel] as u32;
                let old = dst[channel] as u32;
                dst[channel] = ((src * alpha + old * (255 - alpha) + 127) / 255) as u8;
            }
            dst[3] = 255;
        }
    }
}
