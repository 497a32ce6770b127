mod camera;
mod collision;
mod config;
pub(crate) mod entity;
mod geometry;
mod input;
mod loop_runner;
mod metrics;
pub mod rendering;
mod simulation;
pub(crate) mod speech;
mod sprites;
pub mod tools;
mod viewer;

pub use camera::{minimum_zoom, Camera2D, CameraController};
pub use collision::{resolve_overlaps_for, resolve_pair, separation_impulse};
pub use config::{
    CameraConfig, SimConfig, SimConfigError, SpeechConfig, ANIMATION_SPEED, CAMERA_DRAG_DAMPING,
    CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN, CAMERA_ZOOM_SENSITIVITY, CHARACTER_DRAW_SIZE,
    CHARACTER_SPEED, COLLISION_RESPONSE, DEFAULT_CHARACTER_COUNT, DIRECTION_CHANGE_CHANCE,
    HITBOX_RADIUS, SPEECH_DURATION, SPEECH_MAX_STAGGER, WORLD_HEIGHT, WORLD_WIDTH,
};
pub use entity::{sheet_cell, EntityId, EntityState, Facing, SimEntity, SHEET_COLUMNS, SHEET_ROWS};
pub use geometry::{Rect, Vec2, WorldSize};
pub use input::{key_action, wheel_delta_y, InputMode, KeyAction, PointerEvent, PointerTracker};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::{LoopStats, StatsAccumulator};
pub use rendering::{
    render_world, screen_to_world, world_to_screen, DrawError, DrawSurface, PixelSurface, Renderer,
    ViewTransform, Viewport,
};
pub use simulation::Simulation;
pub use speech::{pick_response, SpeechTimer, RESPONSES};
pub use sprites::{load_sprite_rgba, SpriteHandle, SpriteImage, SpriteLoadError, SpriteLoader};
pub use viewer::{KeyOutcome, ViewerApp, ViewerSetup};
