mod hud;
mod prompt;

pub use hud::{draw_hud, draw_load_error, hud_lines, HudData};
pub use prompt::{draw_prompt, PromptState, MAX_PROMPT_CHARS, MAX_TRANSCRIPT_LINES};

use super::rendering::Rgba;

pub const TOOL_FONT_SIZE: f32 = 10.0;
const TEXT_COLOR: Rgba = [244, 248, 252, 255];
const TEXT_DIM_COLOR: Rgba = [176, 198, 220, 255];
const PANEL_BG_COLOR: Rgba = [10, 12, 16, 210];
const PANEL_BORDER_COLOR: Rgba = [92, 106, 126, 255];
