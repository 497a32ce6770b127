use crate::app::{Rect, Vec2};

use super::surface::{DrawSurface, Rgba};
use super::text::text_width;

pub const BUBBLE_FONT_SIZE: f32 = 12.0;
const BUBBLE_PADDING: f32 = 10.0;
const BUBBLE_CORNER_RADIUS: f32 = 8.0;
const BUBBLE_POINTER_SIZE: f32 = 10.0;
const BUBBLE_BORDER_WIDTH: f32 = 2.0;
/// Gap between the anchor and the pointer tip.
const BUBBLE_LIFT: f32 = 10.0;
const BUBBLE_FILL: Rgba = [255, 255, 255, 255];
const BUBBLE_BORDER: Rgba = [0, 0, 0, 255];
const BUBBLE_TEXT: Rgba = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleLayout {
    pub body: Rect,
    pub pointer: [Vec2; 3],
}

/// Places a bubble sized to `text` above `anchor`, with its pointer tip
/// `BUBBLE_LIFT` units above the anchor.
pub fn layout_speech_bubble(anchor: Vec2, text_width: f32, font_size: f32) -> BubbleLayout {
    let width = text_width + BUBBLE_PADDING * 2.0;
    let height = font_size + BUBBLE_PADDING * 2.0;
    let tip = Vec2::new(anchor.x, anchor.y - BUBBLE_LIFT);
    let body_bottom = tip.y - BUBBLE_POINTER_SIZE;
    BubbleLayout {
        body: Rect::new(anchor.x - width * 0.5, body_bottom - height, width, height),
        pointer: [
            tip,
            Vec2::new(anchor.x - BUBBLE_POINTER_SIZE, body_bottom),
            Vec2::new(anchor.x + BUBBLE_POINTER_SIZE, body_bottom),
        ],
    }
}

pub fn draw_speech_bubble(surface: &mut dyn DrawSurface, anchor: Vec2, text: &str) {
    let layout = layout_speech_bubble(
        anchor,
        text_width(text, BUBBLE_FONT_SIZE),
        BUBBLE_FONT_SIZE,
    );

    // Border first, then the fill inset by the border width.
    let border = BUBBLE_BORDER_WIDTH * 0.5;
    let outer = Rect::new(
        layout.body.origin.x - border,
        layout.body.origin.y - border,
        layout.body.width + border * 2.0,
        layout.body.height + border * 2.0,
    );
    surface.fill_rounded_rect(outer, BUBBLE_CORNER_RADIUS + border, BUBBLE_BORDER);
    let [tip, left, right] = layout.pointer;
    surface.fill_triangle(
        [
            Vec2::new(tip.x, tip.y + border * 2.0),
            Vec2::new(left.x - border * 2.0, left.y),
            Vec2::new(right.x + border * 2.0, right.y),
        ],
        BUBBLE_BORDER,
    );
    let inner = Rect::new(
        layout.body.origin.x + border,
        layout.body.origin.y + border,
        layout.body.width - border * 2.0,
        layout.body.height - border * 2.0,
    );
    surface.fill_rounded_rect(inner, BUBBLE_CORNER_RADIUS - border, BUBBLE_FILL);
    surface.fill_triangle(
        [
            Vec2::new(tip.x, tip.y - border),
            Vec2::new(left.x + border, left.y - border),
            Vec2::new(right.x - border, right.y - border),
        ],
        BUBBLE_FILL,
    );

    let center = Vec2::new(
        layout.body.origin.x + layout.body.width * 0.5,
        layout.body.origin.y + layout.body.height * 0.5,
    );
    surface.fill_text(text, center, BUBBLE_FONT_SIZE, BUBBLE_TEXT);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubble_sits_above_anchor_with_pointer_tip_below_body() {
        let layout = layout_speech_bubble(Vec2::new(100.0, 200.0), 50.0, 12.0);
        assert_eq!(layout.body.width, 70.0);
        assert_eq!(layout.body.height, 32.0);
        assert_eq!(layout.pointer[0], Vec2::new(100.0, 190.0));
        assert_eq!(layout.body.bottom(), 180.0);
        assert_eq!(layout.body.origin.x + layout.body.width * 0.5, 100.0);
    }
}
