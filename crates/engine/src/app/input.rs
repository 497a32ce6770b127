use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::Vec2;

/// Pixels one wheel "line" is worth, matching what browsers report for
/// line-mode wheel events.
pub const WHEEL_LINE_PX: f32 = 16.0;

/// What a key press means in the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    Backspace,
    HistoryPrevious,
    HistoryNext,
    ToggleHud,
    RetryLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Viewing,
    LoadFailed,
}

/// Keys with a fixed meaning. Anything else is left to text entry.
pub fn key_action(key: PhysicalKey, mode: InputMode) -> Option<KeyAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match (mode, code) {
        (_, KeyCode::Escape) => Some(KeyAction::Quit),
        (InputMode::LoadFailed, KeyCode::KeyR) => Some(KeyAction::RetryLoad),
        (InputMode::LoadFailed, _) => None,
        (InputMode::Viewing, KeyCode::Enter | KeyCode::NumpadEnter) => Some(KeyAction::Submit),
        (InputMode::Viewing, KeyCode::Backspace) => Some(KeyAction::Backspace),
        (InputMode::Viewing, KeyCode::ArrowUp) => Some(KeyAction::HistoryPrevious),
        (InputMode::Viewing, KeyCode::ArrowDown) => Some(KeyAction::HistoryNext),
        (InputMode::Viewing, KeyCode::F3) => Some(KeyAction::ToggleHud),
        (InputMode::Viewing, _) => None,
    }
}

/// Converts a winit wheel delta to a DOM-style `deltaY`: positive when
/// scrolling down, in pixels.
pub fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PX,
        MouseScrollDelta::PixelDelta(position) => -(position.y as f32),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    DragStart(Vec2),
    DragMove(Vec2),
    DragEnd,
}

/// Tracks the cursor and the left button and turns them into drag events
/// for the camera.
#[derive(Debug, Default)]
pub struct PointerTracker {
    cursor_px: Option<Vec2>,
    dragging: bool,
}

impl PointerTracker {
    pub fn cursor_px(&self) -> Option<Vec2> {
        self.cursor_px
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<PointerEvent> {
        let position = Vec2::new(x, y);
        self.cursor_px = Some(position);
        self.dragging.then_some(PointerEvent::DragMove(position))
    }

    /// Leaving the window ends a drag, like a pointer-up outside a canvas.
    pub fn cursor_left(&mut self) -> Option<PointerEvent> {
        self.cursor_px = None;
        self.release()
    }

    pub fn button(&mut self, button: MouseButton, state: ElementState) -> Option<PointerEvent> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                let position = self.cursor_px?;
                self.dragging = true;
                Some(PointerEvent::DragStart(position))
            }
            ElementState::Released => self.release(),
        }
    }

    fn release(&mut self) -> Option<PointerEvent> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        Some(PointerEvent::DragEnd)
    }
}
