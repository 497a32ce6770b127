use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::content::{
    sprite_url, CharacterAttributes, CharacterRecord, CharacterSprites, CharacterText, Gender,
    LegType, SpriteRef,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CHARACTER_DATA_FILE: &str = "character_data.json";
pub const IDLE_INFO_FILE: &str = "idle_info.json";
pub const WALK_INFO_FILE: &str = "walk_info.json";
pub const SIT_INFO_FILE: &str = "sit_info.json";
pub const DESCRIPTION_FILE: &str = "description.txt";
pub const ANSWER_FILE: &str = "answer.txt";
pub const SHORT_ANSWER_FILE: &str = "short-answer.txt";

pub const JSON_FILES: [&str; 4] = [
    CHARACTER_DATA_FILE,
    IDLE_INFO_FILE,
    WALK_INFO_FILE,
    SIT_INFO_FILE,
];
pub const TEXT_FILES: [&str; 3] = [DESCRIPTION_FILE, ANSWER_FILE, SHORT_ANSWER_FILE];
pub const IMAGE_FILES: [&str; 3] = ["idle.png", "walk.png", "sit.png"];
/// Text files dropped by a stripping consolidate.
pub const STRIPPED_TEXT_FILES: [&str; 2] = [ANSWER_FILE, SHORT_ANSWER_FILE];

/// `character_data.json` as published upstream: attributes are flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCharacterData {
    pub id: u32,
    pub gender: Gender,
    pub skin_color: String,
    pub hair_color: String,
    pub hair_style: String,
    pub shirt_color: String,
    pub leg_color: String,
    pub shoe_color: String,
    pub leg_type: LegType,
    pub description: String,
}

/// `{idle,walk,sit}_info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpriteInfo {
    pub sprite_name: String,
    pub generated: String,
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub note: String,
}

/// Everything needed to build one consolidated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSources {
    pub data: RawCharacterData,
    pub idle: RawSpriteInfo,
    pub walk: RawSpriteInfo,
    pub sit: RawSpriteInfo,
    pub text: Option<CharacterText>,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at `{json_path}`: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{folder} holds data for character {id}")]
    IdMismatch { folder: String, id: u32 },
}

pub fn assemble_record(folder: &str, sources: CharacterSources) -> CharacterRecord {
    let CharacterSources {
        data,
        idle,
        walk,
        sit,
        text,
    } = sources;
    let sprite = |name: &str, info: RawSpriteInfo| SpriteRef {
        url: sprite_url(folder, name),
        generated: info.generated,
        layers: info.layers,
    };
    CharacterRecord {
        id: data.id,
        gender: data.gender,
        description: data.description,
        attributes: CharacterAttributes {
            skin_color: data.skin_color,
            hair_color: data.hair_color,
            hair_style: data.hair_style,
            shirt_color: data.shirt_color,
            leg_color: data.leg_color,
            leg_type: data.leg_type,
            shoe_color: data.shoe_color,
        },
        text,
        sprites: CharacterSprites {
            idle: sprite("idle", idle),
            walk: sprite("walk", walk),
            sit: sprite("sit", sit),
        },
    }
}

pub fn parse_json<T: DeserializeOwned>(path: &Path, json: &str) -> Result<T, LayoutError> {
    let deserializer = &mut serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(deserializer).map_err(|error| LayoutError::Parse {
        path: path.to_path_buf(),
        json_path: error.path().to_string(),
        source: error.into_inner(),
    })
}

fn read_text(path: &Path) -> Result<String, LayoutError> {
    fs::read_to_string(path).map_err(|source| LayoutError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LayoutError> {
    parse_json(path, &read_text(path)?)
}

/// Text files that are absent read as empty, matching a stripped folder.
fn read_optional_text(path: &Path) -> Result<String, LayoutError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(LayoutError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads a downloaded character folder from disk. With `include_text` the
/// record carries the text block.
pub fn read_character_folder(
    dir: &Path,
    folder: &str,
    include_text: bool,
) -> Result<CharacterRecord, LayoutError> {
    let data: RawCharacterData = read_json(&dir.join(CHARACTER_DATA_FILE))?;
    let sources = CharacterSources {
        idle: read_json(&dir.join(IDLE_INFO_FILE))?,
        walk: read_json(&dir.join(WALK_INFO_FILE))?,
        sit: read_json(&dir.join(SIT_INFO_FILE))?,
        text: if include_text {
            Some(CharacterText {
                answer: read_optional_text(&dir.join(ANSWER_FILE))?,
                short_answer: read_optional_text(&dir.join(SHORT_ANSWER_FILE))?,
                description: read_optional_text(&dir.join(DESCRIPTION_FILE))?,
            })
        } else {
            None
        },
        data,
    };
    check_folder_id(folder, sources.data.id)?;
    Ok(assemble_record(folder, sources))
}

pub fn check_folder_id(folder: &str, id: u32) -> Result<(), LayoutError> {
    if engine::content::character_folder_name(id) == folder {
        Ok(())
    } else {
        Err(LayoutError::IdMismatch {
            folder: folder.to_string(),
            id,
        })
    }
}
