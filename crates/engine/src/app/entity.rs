use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::rendering::{draw_speech_bubble, DrawError, DrawSurface, PixelRect};
use super::speech::{pick_response, SpeechTimer};
use super::{Rect, SimConfig, SpeechConfig, SpriteHandle, Vec2, WorldSize, CHARACTER_DRAW_SIZE};
use crate::content::CharacterRecord;

pub const SHEET_COLUMNS: u32 = 9;
pub const SHEET_ROWS: u32 = 4;
const SHADOW_COLOR: [u8; 4] = [0, 0, 0, 77];
const SHADOW_OFFSET_Y: f32 = 5.0;
const SHADOW_RADIUS_X: f32 = 0.4;
const SHADOW_RADIUS_Y: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Walking direction. The discriminant is the sprite-sheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up = 0,
    Left = 1,
    #[default]
    Down = 2,
    Right = 3,
}

impl Facing {
    /// Dominant axis wins; ties (including standing still) go vertical.
    pub fn from_velocity(velocity: Vec2) -> Self {
        if velocity.x.abs() > velocity.y.abs() {
            if velocity.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if velocity.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }

    pub fn sheet_row(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityState {
    #[default]
    Wandering,
    Talking,
}

/// Source cell of `frame` in the walk sheet for `facing`.
pub fn sheet_cell(
    sheet_width: u32,
    sheet_height: u32,
    frame: u32,
    facing: Facing,
) -> Result<PixelRect, DrawError> {
    let width = sheet_width / SHEET_COLUMNS;
    let height = sheet_height / SHEET_ROWS;
    if width == 0 || height == 0 {
        return Err(DrawError::SheetTooSmall {
            width: sheet_width,
            height: sheet_height,
            columns: SHEET_COLUMNS,
            rows: SHEET_ROWS,
        });
    }
    Ok(PixelRect {
        x: frame.min(SHEET_COLUMNS - 1) * width,
        y: facing.sheet_row() * height,
        width,
        height,
    })
}

/// One wandering villager. Holds the shared character record, its own
/// kinematics and speech state, and the sprite handle it draws from.
#[derive(Debug)]
pub struct SimEntity {
    id: EntityId,
    character: Arc<CharacterRecord>,
    sprite: SpriteHandle,
    position: Vec2,
    velocity: Vec2,
    facing: Facing,
    frame_index: u32,
    frame_progress: f32,
    state: EntityState,
    speech_text: &'static str,
    speech_remaining: Duration,
    pending_speech: SpeechTimer,
}

impl SimEntity {
    pub fn new(
        id: EntityId,
        character: Arc<CharacterRecord>,
        sprite: SpriteHandle,
        position: Vec2,
        velocity: Vec2,
    ) -> Self {
        Self {
            id,
            character,
            sprite,
            position,
            velocity,
            facing: Facing::default(),
            frame_index: 0,
            frame_progress: 0.0,
            state: EntityState::Wandering,
            speech_text: "",
            speech_remaining: Duration::ZERO,
            pending_speech: SpeechTimer::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn character(&self) -> &CharacterRecord {
        &self.character
    }

    pub fn sprite(&self) -> &SpriteHandle {
        &self.sprite
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn is_talking(&self) -> bool {
        self.state == EntityState::Talking
    }

    pub fn speech_text(&self) -> &str {
        self.speech_text
    }

    pub fn speech_remaining(&self) -> Duration {
        self.speech_remaining
    }

    pub fn has_pending_speech(&self) -> bool {
        self.pending_speech.is_pending()
    }

    pub(crate) fn push(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Advances this entity alone: speech, movement, wandering, animation.
    pub fn update(&mut self, dt: Duration, config: &SimConfig, rng: &mut impl Rng) {
        self.begin_step(dt, config, rng);
        self.finish_step(config.animation_speed);
    }

    /// Everything that happens before collisions: the speech countdown,
    /// integration, boundary reflection and the random heading change.
    pub(crate) fn begin_step(&mut self, dt: Duration, config: &SimConfig, rng: &mut impl Rng) {
        self.tick_speech(dt, &config.speech);

        self.position += self.velocity;
        reflect_at_bounds(&mut self.position, &mut self.velocity, config.world);

        if rng.random::<f32>() < config.direction_change_chance {
            let heading = rng.random_range(0.0..TAU);
            self.velocity = Vec2::from_angle(heading, config.speed);
        }
    }

    /// Facing from the post-collision velocity, then frame advance.
    pub(crate) fn finish_step(&mut self, animation_speed: f32) {
        self.facing = Facing::from_velocity(self.velocity);
        self.frame_progress += animation_speed;
        if self.frame_progress >= 1.0 {
            self.frame_progress = 0.0;
            self.frame_index = (self.frame_index + 1) % SHEET_COLUMNS;
        }
    }

    fn tick_speech(&mut self, dt: Duration, config: &SpeechConfig) {
        if self.state == EntityState::Talking {
            self.speech_remaining = self.speech_remaining.saturating_sub(dt);
            if self.speech_remaining.is_zero() {
                self.state = EntityState::Wandering;
                self.speech_text = "";
            }
        }
        if let Some(text) = self.pending_speech.advance(dt) {
            self.start_talking(text, config.duration);
        }
    }

    fn start_talking(&mut self, text: &'static str, duration: Duration) {
        self.speech_text = text;
        self.speech_remaining = duration;
        self.state = EntityState::Talking;
    }

    /// Answers right away with a scripted line. The question only shows up
    /// in logs; any reply still waiting on the stagger timer is dropped.
    pub fn ask(&mut self, question: &str, config: &SpeechConfig, rng: &mut impl Rng) {
        self.pending_speech.cancel();
        let reply = pick_response(rng);
        debug!(
            entity = self.id.0,
            question_chars = question.chars().count(),
            reply,
            "entity_asked"
        );
        self.start_talking(reply, config.duration);
    }

    /// Like `ask`, but the reply appears after a random delay up to
    /// `config.max_stagger`.
    pub fn ask_staggered(&mut self, question: &str, config: &SpeechConfig, rng: &mut impl Rng) {
        self.pending_speech.cancel();
        let max_ms = config.max_stagger.as_millis() as u64;
        let delay = Duration::from_millis(rng.random_range(0..=max_ms));
        let reply = pick_response(rng);
        debug!(
            entity = self.id.0,
            question_chars = question.chars().count(),
            delay_ms = delay.as_millis() as u64,
            "entity_asked_staggered"
        );
        self.pending_speech.schedule(delay, reply);
    }

    /// Releases the pending reply, if any. Returns whether one was pending.
    pub fn cleanup(&mut self) -> bool {
        self.pending_speech.cancel()
    }

    /// Draws shadow, sprite frame and speech bubble. Nothing is drawn until
    /// the sprite sheet has loaded. A sprite error still lets the shadow and
    /// bubble through and is returned afterwards.
    pub fn draw(&self, surface: &mut dyn DrawSurface) -> Result<(), DrawError> {
        let Some(sheet) = self.sprite.image() else {
            return Ok(());
        };

        let size = CHARACTER_DRAW_SIZE;
        surface.fill_ellipse(
            Vec2::new(self.position.x, self.position.y + SHADOW_OFFSET_Y),
            size * SHADOW_RADIUS_X,
            size * SHADOW_RADIUS_Y,
            SHADOW_COLOR,
        );
        let sprite = sheet_cell(sheet.width(), sheet.height(), self.frame_index, self.facing)
            .and_then(|cell| {
                surface.draw_image(sheet, cell, Rect::centered(self.position, size, size))
            });

        if self.state == EntityState::Talking && !self.speech_text.is_empty() {
            let anchor = Vec2::new(self.position.x, self.position.y - size * 0.5);
            draw_speech_bubble(surface, anchor, self.speech_text);
        }
        sprite
    }
}

/// Clamps each axis into the world and flips its velocity when it left.
fn reflect_at_bounds(position: &mut Vec2, velocity: &mut Vec2, world: WorldSize) {
    reflect_axis(&mut position.x, &mut velocity.x, world.width);
    reflect_axis(&mut position.y, &mut velocity.y, world.height);
}

fn reflect_axis(position: &mut f32, velocity: &mut f32, extent: f32) {
    if *position < 0.0 || *position > extent {
        *velocity = -*velocity;
        *position = position.clamp(0.0, extent);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{entity_at, still_config};
    use super::*;
    use crate::app::speech::RESPONSES;
    use crate::app::SpriteImage;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const STEP: Duration = Duration::from_millis(100);

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(11)
    }

    #[test]
    fn crossing_the_right_edge_clamps_and_reflects() {
        let config = still_config();
        let mut entity = entity_at(0, Vec2::new(2999.0, 750.0), Vec2::new(5.0, 0.0));
        entity.update(STEP, &config, &mut rng());
        assert_eq!(entity.position().x, 3000.0);
        assert_eq!(entity.velocity().x, -5.0);
        assert_eq!(entity.position().y, 750.0);
    }

    #[test]
    fn crossing_the_top_edge_flips_only_vertical_velocity() {
        let config = still_config();
        let mut entity = entity_at(0, Vec2::new(100.0, 1.0), Vec2::new(1.0, -3.0));
        entity.update(STEP, &config, &mut rng());
        assert_eq!(entity.position(), Vec2::new(101.0, 0.0));
        assert_eq!(entity.velocity(), Vec2::new(1.0, 3.0));
    }

    #[test]
    fn positions_stay_inside_world_under_random_wandering() {
        let config = SimConfig {
            direction_change_chance: 0.5,
            speed: 40.0,
            ..SimConfig::default()
        };
        let mut rng = rng();
        let mut entity = entity_at(0, Vec2::new(10.0, 10.0), Vec2::new(-40.0, -40.0));
        for _ in 0..2_000 {
            entity.update(STEP, &config, &mut rng);
            assert!(config.world.contains(entity.position()));
        }
    }

    #[test]
    fn wander_keeps_configured_speed() {
        let config = SimConfig {
            direction_change_chance: 1.0,
            ..SimConfig::default()
        };
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.update(STEP, &config, &mut rng());
        assert!((entity.velocity().length() - config.speed).abs() < 1e-4);
    }

    #[test]
    fn facing_follows_dominant_axis() {
        assert_eq!(Facing::from_velocity(Vec2::new(2.0, 1.0)), Facing::Right);
        assert_eq!(Facing::from_velocity(Vec2::new(-2.0, 1.0)), Facing::Left);
        assert_eq!(Facing::from_velocity(Vec2::new(1.0, 2.0)), Facing::Down);
        assert_eq!(Facing::from_velocity(Vec2::new(1.0, -2.0)), Facing::Up);
        assert_eq!(Facing::from_velocity(Vec2::new(1.0, 1.0)), Facing::Down);
        assert_eq!(Facing::Right.sheet_row(), 3);
    }

    #[test]
    fn animation_advances_every_fifth_step_and_wraps() {
        let config = still_config();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::new(1.0, 0.0));
        let mut rng = rng();
        for _ in 0..5 {
            entity.update(STEP, &config, &mut rng);
        }
        assert_eq!(entity.frame_index(), 1);
        for _ in 0..40 {
            entity.update(STEP, &config, &mut rng);
        }
        assert_eq!(entity.frame_index(), 0);
    }

    #[test]
    fn ask_starts_talking_with_full_duration() {
        let config = still_config();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.ask("how are you?", &config.speech, &mut rng());
        assert_eq!(entity.state(), EntityState::Talking);
        assert!(RESPONSES.contains(&entity.speech_text()));
        assert_eq!(entity.speech_remaining(), config.speech.duration);
    }

    #[test]
    fn ask_resets_duration_and_cancels_pending_reply() {
        let config = still_config();
        let mut rng = rng();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.ask("first", &config.speech, &mut rng);
        for _ in 0..10 {
            entity.update(STEP, &config, &mut rng);
        }
        entity.ask_staggered("second", &config.speech, &mut rng);
        assert!(entity.has_pending_speech());

        entity.ask("third", &config.speech, &mut rng);
        assert!(!entity.has_pending_speech());
        assert_eq!(entity.speech_remaining(), config.speech.duration);
    }

    #[test]
    fn speech_expires_back_to_wandering() {
        let config = still_config();
        let mut rng = rng();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.ask("hello", &config.speech, &mut rng);
        for _ in 0..49 {
            entity.update(STEP, &config, &mut rng);
        }
        assert!(entity.is_talking());
        entity.update(STEP, &config, &mut rng);
        assert_eq!(entity.state(), EntityState::Wandering);
        assert_eq!(entity.speech_text(), "");
    }

    #[test]
    fn staggered_reply_arrives_within_max_delay() {
        let config = still_config();
        let mut rng = rng();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.ask_staggered("anyone?", &config.speech, &mut rng);
        assert_eq!(entity.state(), EntityState::Wandering);

        let steps = config.speech.max_stagger.as_millis() / STEP.as_millis() + 1;
        for _ in 0..steps {
            entity.update(STEP, &config, &mut rng);
        }
        assert!(entity.is_talking());
        assert!(!entity.has_pending_speech());
    }

    #[test]
    fn cleanup_releases_pending_reply() {
        let config = still_config();
        let mut entity = entity_at(0, Vec2::new(500.0, 500.0), Vec2::ZERO);
        entity.ask_staggered("later", &config.speech, &mut rng());
        assert!(entity.cleanup());
        assert!(!entity.has_pending_speech());
        assert!(!entity.cleanup());
    }

    #[test]
    fn sheet_cell_picks_column_and_row() {
        let cell = sheet_cell(576, 256, 4, Facing::Left).expect("valid sheet");
        assert_eq!(
            cell,
            PixelRect {
                x: 256,
                y: 64,
                width: 64,
                height: 64
            }
        );
        assert!(matches!(
            sheet_cell(8, 256, 0, Facing::Up),
            Err(DrawError::SheetTooSmall { .. })
        ));
    }

    #[test]
    fn unloaded_sprite_draws_nothing() {
        use crate::app::rendering::{PixelSurface, Viewport};
        let entity = entity_at(0, Vec2::new(2.0, 2.0), Vec2::ZERO);
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut surface = PixelSurface::new(
            &mut frame,
            Viewport {
                width: 4,
                height: 4,
            },
        );
        entity.draw(&mut surface).expect("no-op draw");
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn malformed_sheet_reports_draw_error() {
        use crate::app::rendering::{PixelSurface, Viewport};
        let image = SpriteImage::from_rgba(2, 2, vec![255; 16]).expect("image");
        let entity = SimEntity::new(
            EntityId(1),
            Arc::new(crate::content::types::fixtures::sample_record(1)),
            SpriteHandle::ready(image),
            Vec2::new(2.0, 2.0),
            Vec2::ZERO,
        );
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut surface = PixelSurface::new(
            &mut frame,
            Viewport {
                width: 4,
                height: 4,
            },
        );
        assert!(matches!(
            entity.draw(&mut surface),
            Err(DrawError::SheetTooSmall { .. })
        ));
    }

    #[test]
    fn malformed_sheet_still_draws_shadow_and_bubble() {
        use crate::app::rendering::recording::{DrawCall, RecordingSurface};
        let image = SpriteImage::from_rgba(2, 2, vec![255; 16]).expect("image");
        let mut entity = SimEntity::new(
            EntityId(1),
            Arc::new(crate::content::types::fixtures::sample_record(1)),
            SpriteHandle::ready(image),
            Vec2::new(50.0, 50.0),
            Vec2::ZERO,
        );
        entity.ask("hello?", &still_config().speech, &mut rng());

        let mut surface = RecordingSurface::new(200, 200);
        let result = entity.draw(&mut surface);

        assert!(matches!(result, Err(DrawError::SheetTooSmall { .. })));
        assert!(matches!(surface.calls.first(), Some(DrawCall::Ellipse(_))));
        assert!(surface.image_dests().is_empty());
        assert!(surface
            .calls
            .iter()
            .any(|call| matches!(call, DrawCall::Text(text) if text == entity.speech_text())));
    }
}
