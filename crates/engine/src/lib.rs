use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod content;
mod sprite_keys;

pub use app::{
    run_app, AppError, Camera2D, CameraConfig, CameraController, EntityId, EntityState, Facing,
    LoopConfig, Rect, SimConfig, SimConfigError, SimEntity, Simulation, SpeechConfig,
    SpriteHandle, SpriteLoader, Vec2, ViewerApp, ViewerSetup, Viewport, WorldSize,
};
pub use content::{
    load_roster, roster_path, write_roster, CharacterRecord, ConsolidatedRoster, Roster,
    RosterLoadError, RosterWriteError,
};
pub use sprite_keys::{resolve_sprite_path, validate_sprite_url, SpriteUrlError};

pub const ROOT_ENV_VAR: &str = "VILLAGE_ROOT";
pub const PUBLIC_DIR_NAME: &str = "public";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub public_root: PathBuf,
    pub roster_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{ROOT_ENV_VAR} is set but does not point to a valid project root: {path}\n\
A valid root contains Cargo.toml and a public/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "could not find the project root walking up from {start_dir}\n\
Expected a directory containing Cargo.toml and public/.\n\
Set {env_var} explicitly, for example: export {env_var}=\"/path/to/village\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Locates the project root: `VILLAGE_ROOT` when set, otherwise the first
/// ancestor of the executable holding `Cargo.toml` and `public/`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for(root))
}

pub fn app_paths_for(root: PathBuf) -> AppPaths {
    let public_root = root.join(PUBLIC_DIR_NAME);
    let roster_path = content::roster_path(&public_root);
    AppPaths {
        root,
        public_root,
        roster_path,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_from(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join(PUBLIC_DIR_NAME).is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
