use std::collections::VecDeque;

use crate::app::rendering::{text_width, DrawSurface};
use crate::app::{Rect, Vec2};

use super::{PANEL_BG_COLOR, PANEL_BORDER_COLOR, TEXT_COLOR, TEXT_DIM_COLOR, TOOL_FONT_SIZE};

const PROMPT_PREFIX: &str = "> ";
const PROMPT_PLACEHOLDER: &str = "ask the villagers something, then press enter";
const LINE_ADVANCE: f32 = TOOL_FONT_SIZE + 6.0;
const PANEL_PADDING: f32 = 12.0;

pub const MAX_HISTORY_LINES: usize = 64;
pub const MAX_TRANSCRIPT_LINES: usize = 5;
pub const MAX_PROMPT_CHARS: usize = 120;

/// The always-visible question line: typed text, recall of earlier
/// questions, and a short transcript of what was asked.
#[derive(Debug, Default)]
pub struct PromptState {
    current_line: String,
    history: VecDeque<String>,
    history_cursor: Option<usize>,
    history_draft: Option<String>,
    transcript: VecDeque<String>,
}

impl PromptState {
    pub fn current_line(&self) -> &str {
        &self.current_line
    }

    pub fn transcript(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().map(String::as_str)
    }

    pub fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            if self.current_line.chars().count() >= MAX_PROMPT_CHARS {
                break;
            }
            self.current_line.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.current_line.pop();
    }

    /// Takes the typed question. Blank lines are dropped without touching
    /// history.
    pub fn submit(&mut self) -> Option<String> {
        let question = self.current_line.trim().to_string();
        self.clear_line();
        if question.is_empty() {
            return None;
        }
        push_bounded(&mut self.history, question.clone(), MAX_HISTORY_LINES);
        push_bounded(
            &mut self.transcript,
            format!("{PROMPT_PREFIX}{question}"),
            MAX_TRANSCRIPT_LINES,
        );
        Some(question)
    }

    pub fn history_previous(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_cursor.is_none() {
            self.history_draft = Some(self.current_line.clone());
        }
        let index = match self.history_cursor {
            Some(index) => index.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_cursor = Some(index);
        self.current_line = self.history[index].clone();
    }

    pub fn history_next(&mut self) {
        let Some(index) = self.history_cursor else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_cursor = Some(index + 1);
            self.current_line = self.history[index + 1].clone();
            return;
        }
        self.history_cursor = None;
        self.current_line = self.history_draft.take().unwrap_or_default();
    }

    fn clear_line(&mut self) {
        self.current_line.clear();
        self.history_cursor = None;
        self.history_draft = None;
    }
}

fn push_bounded(queue: &mut VecDeque<String>, value: String, max_len: usize) {
    if queue.len() == max_len {
        queue.pop_front();
    }
    queue.push_back(value);
}

/// Bottom-anchored panel with the transcript above the input line. Drawn in
/// screen pixels.
pub fn draw_prompt(surface: &mut dyn DrawSurface, state: &PromptState) {
    let viewport = surface.viewport();
    if viewport.is_empty() {
        return;
    }
    let width = viewport.width as f32;
    let height = viewport.height as f32;

    let line_count = state.transcript.len() + 1;
    let panel_height = line_count as f32 * LINE_ADVANCE + PANEL_PADDING * 2.0;
    let panel = Rect::new(0.0, (height - panel_height).max(0.0), width, panel_height);
    surface.fill_rect(panel, PANEL_BG_COLOR);
    surface.fill_rect(Rect::new(0.0, panel.origin.y, width, 1.0), PANEL_BORDER_COLOR);

    let mut baseline = height - PANEL_PADDING - LINE_ADVANCE * 0.5;
    if state.current_line.is_empty() {
        let placeholder = format!("{PROMPT_PREFIX}{PROMPT_PLACEHOLDER}");
        draw_line_left(surface, &placeholder, baseline, TEXT_DIM_COLOR);
    } else {
        let line = format!("{PROMPT_PREFIX}{}_", state.current_line);
        draw_line_left(surface, &line, baseline, TEXT_COLOR);
    }

    for line in state.transcript.iter().rev() {
        baseline -= LINE_ADVANCE;
        draw_line_left(surface, line, baseline, TEXT_DIM_COLOR);
    }
}

pub(super) fn draw_line_left(
    surface: &mut dyn DrawSurface,
    text: &str,
    center_y: f32,
    color: [u8; 4],
) {
    let half = text_width(text, TOOL_FONT_SIZE) * 0.5;
    surface.fill_text(
        text,
        Vec2::new(PANEL_PADDING + half, center_y),
        TOOL_FONT_SIZE,
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::recording::{DrawCall, RecordingSurface};

    fn submit(prompt: &mut PromptState, text: &str) -> Option<String> {
        prompt.push_text(text);
        prompt.submit()
    }

    #[test]
    fn control_characters_are_not_typed() {
        let mut prompt = PromptState::default();
        prompt.push_text("hi\r\n\tthere");
        assert_eq!(prompt.current_line(), "hithere");
    }

    #[test]
    fn backspace_on_empty_line_is_harmless() {
        let mut prompt = PromptState::default();
        prompt.push_text("a");
        prompt.backspace();
        prompt.backspace();
        assert_eq!(prompt.current_line(), "");
    }

    #[test]
    fn submit_trims_and_records() {
        let mut prompt = PromptState::default();
        assert_eq!(
            submit(&mut prompt, "  where do you live?  "),
            Some("where do you live?".to_string())
        );
        assert_eq!(prompt.current_line(), "");
        assert_eq!(
            prompt.transcript().collect::<Vec<_>>(),
            vec!["> where do you live?"]
        );
    }

    #[test]
    fn blank_submit_is_ignored() {
        let mut prompt = PromptState::default();
        assert_eq!(submit(&mut prompt, "   "), None);
        assert_eq!(prompt.transcript().count(), 0);
        prompt.history_previous();
        assert_eq!(prompt.current_line(), "");
    }

    #[test]
    fn history_walks_back_and_restores_draft() {
        let mut prompt = PromptState::default();
        submit(&mut prompt, "alpha");
        submit(&mut prompt, "beta");
        prompt.push_text("draft");

        prompt.history_previous();
        assert_eq!(prompt.current_line(), "beta");
        prompt.history_previous();
        assert_eq!(prompt.current_line(), "alpha");
        prompt.history_previous();
        assert_eq!(prompt.current_line(), "alpha");
        prompt.history_next();
        assert_eq!(prompt.current_line(), "beta");
        prompt.history_next();
        assert_eq!(prompt.current_line(), "draft");
    }

    #[test]
    fn transcript_keeps_latest_lines() {
        let mut prompt = PromptState::default();
        for index in 0..(MAX_TRANSCRIPT_LINES + 3) {
            submit(&mut prompt, &format!("q{index}"));
        }
        let lines: Vec<&str> = prompt.transcript().collect();
        assert_eq!(lines.len(), MAX_TRANSCRIPT_LINES);
        assert_eq!(lines[0], "> q3");
    }

    #[test]
    fn line_length_is_capped() {
        let mut prompt = PromptState::default();
        prompt.push_text(&"x".repeat(MAX_PROMPT_CHARS + 10));
        assert_eq!(prompt.current_line().chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn panel_shows_placeholder_until_typing() {
        let mut prompt = PromptState::default();
        let mut surface = RecordingSurface::new(640, 480);
        draw_prompt(&mut surface, &prompt);
        assert!(surface
            .calls
            .iter()
            .any(|call| matches!(call, DrawCall::Text(text) if text.contains(PROMPT_PLACEHOLDER))));

        prompt.push_text("hey");
        let mut surface = RecordingSurface::new(640, 480);
        draw_prompt(&mut surface, &prompt);
        assert!(surface
            .calls
            .contains(&DrawCall::Text("> hey_".to_string())));
    }
}
