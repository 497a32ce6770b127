use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteUrlError {
    #[error("sprite url must not be empty")]
    Empty,
    #[error("sprite url must be a site path starting with '/'")]
    NotSiteRooted,
    #[error("sprite url must not contain '\\\\'")]
    Backslash,
    #[error("sprite url must not contain '..'")]
    ParentTraversal,
    #[error("sprite url contains invalid character '{character}'")]
    InvalidCharacter { character: char },
    #[error("sprite url must point at a .png file")]
    NotPng,
}

/// Checks a sprite url such as `/characters/character_0001/walk.png` and
/// returns the part below the site root.
pub fn validate_sprite_url(url: &str) -> Result<&str, SpriteUrlError> {
    if url.is_empty() {
        return Err(SpriteUrlError::Empty);
    }
    let Some(relative) = url.strip_prefix('/') else {
        return Err(SpriteUrlError::NotSiteRooted);
    };
    if url.contains('\\') {
        return Err(SpriteUrlError::Backslash);
    }
    if url.contains("..") {
        return Err(SpriteUrlError::ParentTraversal);
    }
    for ch in relative.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(SpriteUrlError::InvalidCharacter { character: ch });
    }
    if !relative.ends_with(".png") {
        return Err(SpriteUrlError::NotPng);
    }
    Ok(relative)
}

pub fn resolve_sprite_path(public_root: &Path, url: &str) -> Result<PathBuf, SpriteUrlError> {
    let relative = validate_sprite_url(url)?;
    Ok(relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(public_root.to_path_buf(), |path, segment| path.join(segment)))
}
