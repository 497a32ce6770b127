use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{error, info};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::PhysicalKey;

use super::input::{key_action, wheel_delta_y, InputMode, KeyAction, PointerEvent, PointerTracker};
use super::metrics::LoopStats;
use super::rendering::{render_world, DrawSurface, Viewport, BACKDROP_COLOR};
use super::tools::{draw_hud, draw_load_error, draw_prompt, HudData, PromptState};
use super::{CameraConfig, CameraController, SimConfig, Simulation, SpriteLoadError, SpriteLoader};
use crate::content::{load_roster, roster_path, RosterLoadError};

/// Everything the viewer needs to (re)build the village.
#[derive(Debug, Clone)]
pub struct ViewerSetup {
    pub public_root: PathBuf,
    pub sim: SimConfig,
    pub camera: CameraConfig,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

enum Screen {
    Village(Simulation),
    LoadFailed(String),
}

/// Window-independent viewer state: the loaded village (or the load error),
/// the camera, the prompt line and the HUD toggle. The event loop feeds it
/// input and asks it to step and paint.
pub struct ViewerApp {
    setup: ViewerSetup,
    sprites: SpriteLoader,
    screen: Screen,
    camera: CameraController,
    prompt: PromptState,
    pointer: PointerTracker,
    hud_visible: bool,
}

impl ViewerApp {
    pub fn new(setup: ViewerSetup, viewport: Viewport) -> Result<Self, SpriteLoadError> {
        let sprites = SpriteLoader::spawn(setup.public_root.clone())?;
        let camera = CameraController::new(setup.sim.world, viewport, setup.camera);
        let mut app = Self {
            setup,
            sprites,
            screen: Screen::LoadFailed(String::new()),
            camera,
            prompt: PromptState::default(),
            pointer: PointerTracker::default(),
            hud_visible: true,
        };
        app.reload();
        Ok(app)
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        match &self.screen {
            Screen::Village(simulation) => Some(simulation),
            Screen::LoadFailed(_) => None,
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.screen {
            Screen::Village(_) => None,
            Screen::LoadFailed(message) => Some(message),
        }
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn prompt(&self) -> &PromptState {
        &self.prompt
    }

    pub fn hud_visible(&self) -> bool {
        self.hud_visible
    }

    pub fn input_mode(&self) -> InputMode {
        match self.screen {
            Screen::Village(_) => InputMode::Viewing,
            Screen::LoadFailed(_) => InputMode::LoadFailed,
        }
    }

    /// Reads the consolidated roster again and replaces the current village.
    pub fn reload(&mut self) {
        if let Screen::Village(simulation) = &mut self.screen {
            simulation.clear();
        }
        self.screen = match self.load_village() {
            Ok(simulation) => Screen::Village(simulation),
            Err(load_error) => {
                error!(
                    public_root = %self.setup.public_root.display(),
                    error = %load_error,
                    "roster_load_failed"
                );
                Screen::LoadFailed(load_error.to_string())
            }
        };
    }

    fn load_village(&mut self) -> Result<Simulation, RosterLoadError> {
        let roster = load_roster(&roster_path(&self.setup.public_root))?;
        let rng = SmallRng::seed_from_u64(self.setup.seed);
        let mut simulation = Simulation::new(self.setup.sim.clone(), rng);
        let sprites = &mut self.sprites;
        simulation.populate(&roster, |character| {
            sprites.request(&character.sprites.walk.url)
        });
        Ok(simulation)
    }

    /// Applies one key press. `text` is what the key typed, if anything.
    pub fn key_pressed(&mut self, key: PhysicalKey, text: Option<&str>) -> KeyOutcome {
        let mode = self.input_mode();
        match key_action(key, mode) {
            Some(KeyAction::Quit) => return KeyOutcome::Quit,
            Some(KeyAction::RetryLoad) => {
                info!("roster_retry");
                self.reload();
            }
            Some(KeyAction::Submit) => self.submit_prompt(),
            Some(KeyAction::Backspace) => self.prompt.backspace(),
            Some(KeyAction::HistoryPrevious) => self.prompt.history_previous(),
            Some(KeyAction::HistoryNext) => self.prompt.history_next(),
            Some(KeyAction::ToggleHud) => {
                self.hud_visible = !self.hud_visible;
                info!(hud_visible = self.hud_visible, "hud_toggled");
            }
            None => {
                if let (InputMode::Viewing, Some(text)) = (mode, text) {
                    self.prompt.push_text(text);
                }
            }
        }
        KeyOutcome::Continue
    }

    fn submit_prompt(&mut self) {
        let Some(question) = self.prompt.submit() else {
            return;
        };
        if let Screen::Village(simulation) = &mut self.screen {
            simulation.ask_all(&question);
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let event = self.pointer.cursor_moved(x, y);
        self.apply_pointer(event);
    }

    pub fn cursor_left(&mut self) {
        let event = self.pointer.cursor_left();
        self.apply_pointer(event);
    }

    pub fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let event = self.pointer.button(button, state);
        self.apply_pointer(event);
    }

    fn apply_pointer(&mut self, event: Option<PointerEvent>) {
        match event {
            Some(PointerEvent::DragStart(position)) => self.camera.drag_start(position),
            Some(PointerEvent::DragMove(position)) => self.camera.drag_move(position),
            Some(PointerEvent::DragEnd) => self.camera.drag_end(),
            None => {}
        }
    }

    pub fn wheel(&mut self, delta: MouseScrollDelta) {
        self.camera.wheel(wheel_delta_y(delta));
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.camera.resize(viewport);
    }

    pub fn step(&mut self, dt: Duration) {
        if let Screen::Village(simulation) = &mut self.screen {
            simulation.step(dt);
        }
    }

    pub fn paint(&self, surface: &mut dyn DrawSurface, draw_order: &mut Vec<usize>, stats: LoopStats) {
        match &self.screen {
            Screen::Village(simulation) => {
                render_world(
                    surface,
                    &self.camera.camera(),
                    simulation.config().world,
                    simulation.entities(),
                    draw_order,
                );
                if self.hud_visible {
                    draw_hud(
                        surface,
                        &HudData {
                            stats,
                            villagers: simulation.entity_count(),
                            talking: simulation.talking_count(),
                            zoom: self.camera.camera().zoom,
                        },
                    );
                }
                draw_prompt(surface, &self.prompt);
            }
            Screen::LoadFailed(message) => {
                surface.reset_transform();
                surface.clear(BACKDROP_COLOR);
                draw_load_error(surface, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::app::entity::test_support::still_config;
    use crate::app::rendering::recording::{DrawCall, RecordingSurface};
    use crate::content::types::fixtures::sample_record;
    use crate::content::{write_roster, ConsolidatedRoster};

    fn viewport() -> Viewport {
        Viewport {
            width: 800,
            height: 600,
        }
    }

    fn setup(public_root: &Path) -> ViewerSetup {
        ViewerSetup {
            public_root: public_root.to_path_buf(),
            sim: SimConfig {
                character_count: 5,
                ..still_config()
            },
            camera: CameraConfig::default(),
            seed: 9,
        }
    }

    fn write_sample_roster(public_root: &Path, count: u32) {
        let document = ConsolidatedRoster::new(
            "2024-01-01T00:00:00.000Z".to_string(),
            (1..=count).map(sample_record),
        );
        write_roster(&roster_path(public_root), &document).expect("write roster");
    }

    fn key(code: KeyCode) -> PhysicalKey {
        PhysicalKey::Code(code)
    }

    fn type_text(app: &mut ViewerApp, text: &str) {
        for ch in text.chars() {
            let typed = ch.to_string();
            app.key_pressed(key(KeyCode::KeyA), Some(&typed));
        }
    }

    #[test]
    fn missing_roster_shows_load_error() {
        let dir = TempDir::new().expect("tempdir");
        let app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        assert!(app.simulation().is_none());
        assert!(app.load_error().is_some());
        assert_eq!(app.input_mode(), InputMode::LoadFailed);

        let mut surface = RecordingSurface::new(800, 600);
        app.paint(&mut surface, &mut Vec::new(), LoopStats::default());
        assert!(surface.image_dests().is_empty());
        assert!(surface
            .calls
            .contains(&DrawCall::Text("Failed to load character data".to_string())));
    }

    #[test]
    fn r_retries_and_recovers_once_roster_exists() {
        let dir = TempDir::new().expect("tempdir");
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        assert!(app.simulation().is_none());

        write_sample_roster(dir.path(), 8);
        assert_eq!(
            app.key_pressed(key(KeyCode::KeyR), Some("r")),
            KeyOutcome::Continue
        );
        let simulation = app.simulation().expect("loaded after retry");
        assert_eq!(simulation.entity_count(), 5);
        assert_eq!(app.input_mode(), InputMode::Viewing);
    }

    #[test]
    fn typed_question_reaches_every_villager() {
        let dir = TempDir::new().expect("tempdir");
        write_sample_roster(dir.path(), 5);
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");

        type_text(&mut app, "hello");
        assert_eq!(app.prompt().current_line(), "hello");
        app.key_pressed(key(KeyCode::Enter), Some("\r"));

        assert_eq!(app.prompt().current_line(), "");
        assert_eq!(app.simulation().map(Simulation::talking_count), Some(5));
    }

    #[test]
    fn r_types_into_prompt_while_viewing() {
        let dir = TempDir::new().expect("tempdir");
        write_sample_roster(dir.path(), 3);
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        app.key_pressed(key(KeyCode::KeyR), Some("r"));
        assert_eq!(app.prompt().current_line(), "r");
    }

    #[test]
    fn escape_quits_and_f3_toggles_hud() {
        let dir = TempDir::new().expect("tempdir");
        write_sample_roster(dir.path(), 3);
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        app.key_pressed(key(KeyCode::F3), None);
        assert!(!app.hud_visible());
        assert_eq!(
            app.key_pressed(key(KeyCode::Escape), None),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn wheel_and_drag_move_the_camera_within_limits() {
        let dir = TempDir::new().expect("tempdir");
        write_sample_roster(dir.path(), 3);
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        let start = app.camera().camera();

        app.wheel(MouseScrollDelta::LineDelta(0.0, 3.0));
        let zoomed = app.camera().camera();
        assert!(zoomed.zoom > start.zoom);

        app.cursor_moved(400.0, 300.0);
        app.mouse_button(MouseButton::Left, ElementState::Pressed);
        app.cursor_moved(300.0, 300.0);
        app.mouse_button(MouseButton::Left, ElementState::Released);
        assert!(app.camera().camera().position.x > zoomed.position.x);
        assert!(!app.camera().is_dragging());
    }

    #[test]
    fn village_paints_world_hud_and_prompt() {
        let dir = TempDir::new().expect("tempdir");
        write_sample_roster(dir.path(), 3);
        let mut app = ViewerApp::new(setup(dir.path()), viewport()).expect("viewer");
        app.step(Duration::from_millis(16));

        let mut surface = RecordingSurface::new(800, 600);
        app.paint(&mut surface, &mut Vec::new(), LoopStats::default());
        assert!(surface
            .calls
            .contains(&DrawCall::Text("Villagers: 3".to_string())));
        assert!(surface
            .calls
            .iter()
            .any(|call| matches!(call, DrawCall::Text(text) if text.starts_with("> "))));
    }
}
