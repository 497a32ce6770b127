use crate::app::metrics::LoopStats;
use crate::app::rendering::{text_width, DrawSurface};
use crate::app::{Rect, Vec2};

use super::prompt::draw_line_left;
use super::{
    PANEL_BG_COLOR, PANEL_BORDER_COLOR, TEXT_COLOR, TEXT_DIM_COLOR, TOOL_FONT_SIZE,
};

const HUD_MARGIN: f32 = 8.0;
const HUD_INSET: f32 = 4.0;
const LINE_ADVANCE: f32 = TOOL_FONT_SIZE + 6.0;
const HINT_LINE: &str = "drag to pan, wheel to zoom, F3 hides";

const LOAD_ERROR_TITLE: &str = "Failed to load character data";
const LOAD_ERROR_HINT: &str = "press R to retry, Esc to quit";
const ERROR_TITLE_COLOR: [u8; 4] = [255, 120, 120, 255];
const ERROR_TITLE_SIZE: f32 = TOOL_FONT_SIZE * 2.0;
const ERROR_DETAIL_MAX_CHARS: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudData {
    pub stats: LoopStats,
    pub villagers: usize,
    pub talking: usize,
    pub zoom: f32,
}

pub fn hud_lines(data: &HudData) -> Vec<String> {
    vec![
        format!(
            "FPS: {:.0}  TPS: {:.0}  {:.1} ms",
            data.stats.fps, data.stats.tps, data.stats.frame_time_ms
        ),
        format!("Villagers: {}", data.villagers),
        format!("Talking: {}", data.talking),
        format!("Zoom: {:.2}x", data.zoom),
        HINT_LINE.to_string(),
    ]
}

/// Stats panel in the top-left corner, in screen pixels.
pub fn draw_hud(surface: &mut dyn DrawSurface, data: &HudData) {
    if surface.viewport().is_empty() {
        return;
    }
    let lines = hud_lines(data);
    let widest = lines
        .iter()
        .map(|line| text_width(line, TOOL_FONT_SIZE))
        .fold(0.0, f32::max);

    let panel = Rect::new(
        HUD_MARGIN - HUD_INSET,
        HUD_MARGIN - HUD_INSET,
        widest + (HUD_MARGIN + HUD_INSET) * 2.0,
        lines.len() as f32 * LINE_ADVANCE + HUD_INSET * 2.0,
    );
    surface.fill_rect(panel, PANEL_BG_COLOR);
    surface.stroke_rect(panel, 1.0, PANEL_BORDER_COLOR);

    let last = lines.len() - 1;
    for (index, line) in lines.iter().enumerate() {
        let center_y = HUD_MARGIN + LINE_ADVANCE * (index as f32 + 0.5);
        let color = if index == last {
            TEXT_DIM_COLOR
        } else {
            TEXT_COLOR
        };
        draw_line_left(surface, line, center_y, color);
    }
}

/// Full-screen notice shown instead of the world when the roster could not
/// be loaded.
pub fn draw_load_error(surface: &mut dyn DrawSurface, detail: &str) {
    let viewport = surface.viewport();
    if viewport.is_empty() {
        return;
    }
    let center = viewport.center_px();
    let detail = shorten(detail, ERROR_DETAIL_MAX_CHARS);

    let width = text_width(LOAD_ERROR_TITLE, ERROR_TITLE_SIZE)
        .max(text_width(&detail, TOOL_FONT_SIZE))
        + HUD_MARGIN * 6.0;
    let height = ERROR_TITLE_SIZE + LINE_ADVANCE * 2.0 + HUD_MARGIN * 6.0;
    let panel = Rect::centered(center, width, height);
    surface.fill_rect(panel, PANEL_BG_COLOR);
    surface.stroke_rect(panel, 2.0, PANEL_BORDER_COLOR);

    let title_y = panel.origin.y + HUD_MARGIN * 3.0 + ERROR_TITLE_SIZE * 0.5;
    surface.fill_text(
        LOAD_ERROR_TITLE,
        Vec2::new(center.x, title_y),
        ERROR_TITLE_SIZE,
        ERROR_TITLE_COLOR,
    );
    let detail_y = title_y + ERROR_TITLE_SIZE * 0.5 + LINE_ADVANCE;
    surface.fill_text(&detail, Vec2::new(center.x, detail_y), TOOL_FONT_SIZE, TEXT_DIM_COLOR);
    surface.fill_text(
        LOAD_ERROR_HINT,
        Vec2::new(center.x, detail_y + LINE_ADVANCE),
        TOOL_FONT_SIZE,
        TEXT_COLOR,
    );
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
