use std::env;

use engine::app::DEFAULT_CHARACTER_COUNT;
use engine::{
    resolve_app_paths, CameraConfig, LoopConfig, SimConfig, SimConfigError, StartupError,
    ViewerSetup,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub(crate) const CHARACTER_COUNT_ENV_VAR: &str = "VILLAGE_CHARACTER_COUNT";
pub(crate) const SEED_ENV_VAR: &str = "VILLAGE_SEED";
pub(crate) const STAGGER_SPEECH_ENV_VAR: &str = "VILLAGE_STAGGER_SPEECH";
/// The pairwise collision pass is sized for the default crowd.
pub(crate) const MAX_CHARACTER_COUNT: usize = DEFAULT_CHARACTER_COUNT;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid simulation config: {0}")]
    Config(#[from] SimConfigError),
}

/// Values the environment may override. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EnvOverrides {
    pub(crate) character_count: Option<usize>,
    pub(crate) seed: Option<u64>,
    pub(crate) stagger_speech: bool,
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) setup: ViewerSetup,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Village Startup ===");

    let paths = resolve_app_paths()?;
    let overrides = parse_overrides(|var| env::var(var).ok())?;
    let sim = sim_config(&overrides);
    sim.validate()?;
    let camera = CameraConfig::default();
    camera.validate()?;
    let seed = overrides.seed.unwrap_or_else(rand::random);
    info!(
        root = %paths.root.display(),
        roster = %paths.roster_path.display(),
        character_count = sim.character_count,
        seed,
        stagger_replies = sim.speech.stagger_replies,
        "startup"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        setup: ViewerSetup {
            public_root: paths.public_root,
            sim,
            camera,
            seed,
        },
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn sim_config(overrides: &EnvOverrides) -> SimConfig {
    let mut sim = SimConfig::default();
    if let Some(count) = overrides.character_count {
        sim.character_count = count;
    }
    sim.speech.stagger_replies = overrides.stagger_speech;
    sim
}

pub(crate) fn parse_overrides(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EnvOverrides, BootstrapError> {
    let character_count = lookup(CHARACTER_COUNT_ENV_VAR)
        .map(|raw| parse_character_count(&raw))
        .transpose()?;
    let seed = lookup(SEED_ENV_VAR)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| BootstrapError::InvalidEnv {
                var: SEED_ENV_VAR,
                value: raw.clone(),
                expected: "an unsigned 64-bit integer",
            })
        })
        .transpose()?;
    let stagger_speech = lookup(STAGGER_SPEECH_ENV_VAR)
        .map(|raw| parse_flag(&raw))
        .transpose()?
        .unwrap_or(false);

    Ok(EnvOverrides {
        character_count,
        seed,
        stagger_speech,
    })
}

fn parse_character_count(raw: &str) -> Result<usize, BootstrapError> {
    let invalid = || BootstrapError::InvalidEnv {
        var: CHARACTER_COUNT_ENV_VAR,
        value: raw.to_string(),
        expected: "a number from 1 to 100",
    };
    let count = raw.trim().parse::<usize>().map_err(|_| invalid())?;
    if (1..=MAX_CHARACTER_COUNT).contains(&count) {
        Ok(count)
    } else {
        Err(invalid())
    }
}

fn parse_flag(raw: &str) -> Result<bool, BootstrapError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BootstrapError::InvalidEnv {
            var: STAGGER_SPEECH_ENV_VAR,
            value: raw.to_string(),
            expected: "1/true or 0/false",
        }),
    }
}
