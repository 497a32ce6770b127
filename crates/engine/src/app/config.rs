use std::time::Duration;

use thiserror::Error;

use super::WorldSize;

pub const WORLD_WIDTH: f32 = 3000.0;
pub const WORLD_HEIGHT: f32 = 1500.0;
pub const DEFAULT_CHARACTER_COUNT: usize = 100;

pub const CHARACTER_DRAW_SIZE: f32 = 64.0;
pub const HITBOX_RADIUS: f32 = 10.0;
/// World units per simulation step.
pub const CHARACTER_SPEED: f32 = 2.0;
pub const ANIMATION_SPEED: f32 = 0.2;
pub const DIRECTION_CHANGE_CHANCE: f32 = 0.01;
pub const COLLISION_RESPONSE: f32 = 0.05;

pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 5.0;
pub const CAMERA_ZOOM_SENSITIVITY: f32 = 0.003;
pub const CAMERA_DRAG_DAMPING: f32 = 0.3;

pub const SPEECH_DURATION: Duration = Duration::from_millis(5_000);
pub const SPEECH_MAX_STAGGER: Duration = Duration::from_millis(4_000);

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub world: WorldSize,
    pub character_count: usize,
    pub speed: f32,
    pub hitbox_radius: f32,
    pub animation_speed: f32,
    pub direction_change_chance: f32,
    pub collision_response: f32,
    pub resolve_collisions: bool,
    pub speech: SpeechConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldSize {
                width: WORLD_WIDTH,
                height: WORLD_HEIGHT,
            },
            character_count: DEFAULT_CHARACTER_COUNT,
            speed: CHARACTER_SPEED,
            hitbox_radius: HITBOX_RADIUS,
            animation_speed: ANIMATION_SPEED,
            direction_change_chance: DIRECTION_CHANGE_CHANCE,
            collision_response: COLLISION_RESPONSE,
            resolve_collisions: true,
            speech: SpeechConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    pub duration: Duration,
    pub max_stagger: Duration,
    pub stagger_replies: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            duration: SPEECH_DURATION,
            max_stagger: SPEECH_MAX_STAGGER,
            stagger_replies: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_sensitivity: f32,
    pub drag_damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: CAMERA_ZOOM_MIN,
            max_zoom: CAMERA_ZOOM_MAX,
            zoom_sensitivity: CAMERA_ZOOM_SENSITIVITY,
            drag_damping: CAMERA_DRAG_DAMPING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimConfigError {
    #[error("world size must be positive and finite, got {width}x{height}")]
    WorldSize { width: f32, height: f32 },
    #[error("{field} must be a finite non-negative number, got {value}")]
    NegativeValue { field: &'static str, value: f32 },
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f32 },
    #[error("camera zoom range is invalid: min {min}, max {max}")]
    ZoomRange { min: f32, max: f32 },
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        let WorldSize { width, height } = self.world;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SimConfigError::WorldSize { width, height });
        }
        for (field, value) in [
            ("speed", self.speed),
            ("hitbox_radius", self.hitbox_radius),
            ("animation_speed", self.animation_speed),
            ("collision_response", self.collision_response),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimConfigError::NegativeValue { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.direction_change_chance) {
            return Err(SimConfigError::Probability {
                field: "direction_change_chance",
                value: self.direction_change_chance,
            });
        }
        Ok(())
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite())
            || self.min_zoom <= 0.0
            || self.min_zoom > self.max_zoom
        {
            return Err(SimConfigError::ZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
        assert_eq!(CameraConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let config = SimConfig {
            direction_change_chance: 1.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimConfigError::Probability { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_world() {
        let config = SimConfig {
            world: WorldSize {
                width: 0.0,
                height: 10.0,
            },
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimConfigError::WorldSize { .. })
        ));
    }

    #[test]
    fn rejects_inverted_zoom_range() {
        let config = CameraConfig {
            min_zoom: 3.0,
            max_zoom: 2.0,
            ..CameraConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
